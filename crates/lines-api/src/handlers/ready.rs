//! Readiness handler

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::state::AppState;

/// Body of `/ready`
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReadyStatus {
    pub status: String,
}

/// GET /ready
/// 200 once every sport was synchronized, 503 before
pub async fn ready(State(state): State<AppState>) -> (StatusCode, Json<ReadyStatus>) {
    if state.ready().is_ready() {
        (
            StatusCode::OK,
            Json(ReadyStatus {
                status: "ok".to_string(),
            }),
        )
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ReadyStatus {
                status: "not ok".to_string(),
            }),
        )
    }
}
