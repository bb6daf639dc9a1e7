//! HTTP Snapshot Endpoint
//!
//! Method-gated write contract for the persistence gateway:
//!
//! - `POST /api/snapshot` with `{ "cards": [...] }` — store the snapshot
//! - `GET /api/snapshot` — return the last stored snapshot
//! - any other method — 405 Method Not Allowed
//! - missing/invalid payload — 400 with a message
//! - write failure — 500 with a message and error detail
//! - success — 200 `{ "success": true, ... }`

use std::sync::Arc;

use axum::{
    extract::rejection::JsonRejection,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::post,
    Router,
};
use serde::{Deserialize, Serialize};

use crate::persistence::gateway::SnapshotGateway;
use crate::persistence::snapshot::{SnapshotFile, SnapshotRecord};

/// Save request body. `cards` is required; a payload without it is rejected.
#[derive(Debug, Deserialize)]
struct SavePayload {
    cards: Option<Vec<SnapshotRecord>>,
}

#[derive(Debug, Serialize)]
struct SaveOk {
    success: bool,
    message: String,
}

#[derive(Debug, Serialize)]
struct SaveFailure {
    success: bool,
    message: String,
    error: String,
}

#[derive(Debug, Serialize)]
struct BadRequest {
    message: String,
}

#[derive(Debug, Serialize)]
struct LoadOk {
    success: bool,
    data: SnapshotFile,
}

/// Build the snapshot router over any gateway implementation.
pub fn router(gateway: Arc<dyn SnapshotGateway>) -> Router {
    Router::new()
        .route("/api/snapshot", post(save_snapshot).get(load_snapshot))
        .with_state(gateway)
}

async fn save_snapshot(
    State(gateway): State<Arc<dyn SnapshotGateway>>,
    payload: Result<Json<SavePayload>, JsonRejection>,
) -> Response {
    let cards = match payload {
        Ok(Json(SavePayload { cards: Some(cards) })) => cards,
        Ok(Json(SavePayload { cards: None })) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(BadRequest {
                    message: "No cards in request body".to_string(),
                }),
            )
                .into_response();
        }
        Err(rejection) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(BadRequest {
                    message: rejection.body_text(),
                }),
            )
                .into_response();
        }
    };

    match gateway.save(&cards).await {
        Ok(()) => (
            StatusCode::OK,
            Json(SaveOk {
                success: true,
                message: "Snapshot updated successfully".to_string(),
            }),
        )
            .into_response(),
        Err(err) => {
            tracing::error!("snapshot write failed: {}", err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(SaveFailure {
                    success: false,
                    message: "Error writing snapshot".to_string(),
                    error: err.to_string(),
                }),
            )
                .into_response()
        }
    }
}

async fn load_snapshot(State(gateway): State<Arc<dyn SnapshotGateway>>) -> Response {
    match gateway.load().await {
        Ok(cards) => (
            StatusCode::OK,
            Json(LoadOk {
                success: true,
                data: SnapshotFile { cards },
            }),
        )
            .into_response(),
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(SaveFailure {
                success: false,
                message: "Error reading snapshot".to_string(),
                error: err.to_string(),
            }),
        )
            .into_response(),
    }
}
