//! Standalone Snapshot Server
//!
//! Minimal HTTP server exposing the snapshot write contract over
//! `/api/snapshot`, backed by a [`FileSnapshotGateway`]. Useful for running
//! the persistence boundary outside the embedding application during
//! development.
//!
//! # Configuration
//!
//! - `CARDFLOW_SNAPSHOT_PATH`: snapshot file location (default `./data/cards.json`)
//! - `CARDFLOW_PORT`: listen port (default `3020`)

use std::sync::Arc;

use cardflow_core::persistence::{http, FileSnapshotGateway, SnapshotGateway};
use tower_http::trace::TraceLayer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "snapshot_server=debug,cardflow_core=debug".into()),
        )
        .init();

    let path = std::env::var("CARDFLOW_SNAPSHOT_PATH")
        .unwrap_or_else(|_| "./data/cards.json".to_string());
    let port: u16 = std::env::var("CARDFLOW_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3020);

    let gateway: Arc<dyn SnapshotGateway> = Arc::new(FileSnapshotGateway::new(&path));
    let app = http::router(gateway).layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;
    tracing::info!(%path, port, "snapshot server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
