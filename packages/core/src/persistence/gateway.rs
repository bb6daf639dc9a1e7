//! Persistence Gateway
//!
//! The async boundary of the system. Mutations commit to memory first; the
//! full snapshot is then handed to a gateway implementation best-effort. A
//! failed save is logged, surfaced as an event, and never rolls anything
//! back — deliberately eventually-consistent, not transactional.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use crate::events::GraphEvent;
use crate::persistence::snapshot::{SnapshotFile, SnapshotRecord};
use crate::services::error::GraphError;

/// Durable storage for graph snapshots. Full-snapshot writes only; no
/// partial/incremental protocol.
#[async_trait]
pub trait SnapshotGateway: Send + Sync {
    /// Durably store the given snapshot, replacing the previous one.
    async fn save(&self, records: &[SnapshotRecord]) -> Result<(), GraphError>;

    /// Load the last stored snapshot; empty when nothing was stored yet.
    async fn load(&self) -> Result<Vec<SnapshotRecord>, GraphError>;
}

/// File-backed gateway storing the snapshot as pretty-printed JSON
/// (`{ "cards": [...] }`).
pub struct FileSnapshotGateway {
    path: PathBuf,
}

impl FileSnapshotGateway {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

#[async_trait]
impl SnapshotGateway for FileSnapshotGateway {
    async fn save(&self, records: &[SnapshotRecord]) -> Result<(), GraphError> {
        let file = SnapshotFile {
            cards: records.to_vec(),
        };
        let json = serde_json::to_vec_pretty(&file)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(|err| {
                    GraphError::persistence(format!(
                        "creating {}: {}",
                        parent.display(),
                        err
                    ))
                })?;
            }
        }

        // Write-then-rename so a concurrent reader never sees a torn file.
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &json).await.map_err(|err| {
            GraphError::persistence(format!("writing {}: {}", tmp.display(), err))
        })?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(|err| {
            GraphError::persistence(format!("renaming to {}: {}", self.path.display(), err))
        })?;
        Ok(())
    }

    async fn load(&self) -> Result<Vec<SnapshotRecord>, GraphError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => {
                let file: SnapshotFile = serde_json::from_slice(&bytes)?;
                Ok(file.cards)
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(err) => Err(GraphError::persistence(format!(
                "reading {}: {}",
                self.path.display(),
                err
            ))),
        }
    }
}

/// Background saver: receives save requests, collapses the queue to the
/// newest snapshot (a pending save is superseded by a later one — only the
/// latest write's result matters at the gateway boundary), and reports
/// failures as non-fatal [`GraphEvent::SaveFailed`] events.
pub(crate) fn spawn_saver(
    gateway: Arc<dyn SnapshotGateway>,
    mut save_rx: mpsc::UnboundedReceiver<Vec<SnapshotRecord>>,
    event_tx: broadcast::Sender<GraphEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(mut records) = save_rx.recv().await {
            while let Ok(newer) = save_rx.try_recv() {
                records = newer;
            }
            if let Err(err) = gateway.save(&records).await {
                tracing::warn!("snapshot save failed: {}", err);
                let _ = event_tx.send(GraphEvent::SaveFailed {
                    message: err.to_string(),
                });
            }
        }
    })
}
