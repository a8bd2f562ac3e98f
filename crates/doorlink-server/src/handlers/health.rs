use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::Json;
use axum::extract::State;
use serde::Serialize;
use tracing::warn;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Health {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_requests: Option<usize>,
}

/// `GET /health`: liveness only, no dependency checks.
pub async fn live() -> Json<Health> {
    Json(Health {
        status: "ok",
        pending_requests: None,
    })
}

/// `GET /health/ready`: 503 when the database is unreachable.
pub async fn ready(State(state): State<AppState>) -> ApiResult<Json<Health>> {
    if let Err(e) = state.db.health_check().await {
        warn!(error = %e, "readiness check failed");
        return Err(ApiError::unavailable("Database unavailable"));
    }

    Ok(Json(Health {
        status: "ready",
        pending_requests: Some(state.engine.pending_count()),
    }))
}
