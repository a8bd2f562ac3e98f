//! Access requests and the audit trail.

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use doorlink_engine::{AccessOutcome, Decision};
use doorlink_storage::AccessLog;
use serde::Deserialize;
use tracing::debug;

const DEFAULT_LOG_LIMIT: i64 = 50;
const DEFAULT_UNAUTHORIZED_LIMIT: i64 = 20;
const MAX_LIMIT: i64 = 1000;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessRequest {
    pub code: Option<String>,
    pub door_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualOpenRequest {
    pub admin_name: Option<String>,
    pub door_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<i64>,
}

impl LimitQuery {
    fn resolve(&self, default: i64) -> i64 {
        self.limit.unwrap_or(default).clamp(1, MAX_LIMIT)
    }
}

/// Timeouts answer 504 with the regular body; every other outcome is 200.
fn respond(outcome: AccessOutcome) -> (StatusCode, Json<AccessOutcome>) {
    let status = if outcome.is_timeout() {
        StatusCode::GATEWAY_TIMEOUT
    } else {
        StatusCode::OK
    };
    (status, Json(outcome))
}

/// `POST /api/access/request`
pub async fn request_access(
    State(state): State<AppState>,
    body: Result<Json<AccessRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<AccessOutcome>)> {
    let Json(request) = body?;
    let code = match request.code.as_deref() {
        Some(code) if !code.is_empty() => code,
        _ => return Err(ApiError::bad_request("code is required")),
    };

    let decision = state
        .engine
        .submit_code(code, request.door_id.as_deref())
        .await?;
    if let Decision::Pending(pending) = &decision {
        debug!(request_id = %pending.request_id, "waiting for door controller");
    }

    Ok(respond(decision.outcome().await?))
}

/// `POST /api/doors/open/manual`
pub async fn open_manual(
    State(state): State<AppState>,
    body: Option<Json<ManualOpenRequest>>,
) -> ApiResult<(StatusCode, Json<AccessOutcome>)> {
    let request = body.map(|Json(request)| request);
    let (admin_name, door_id) = match &request {
        Some(r) => (r.admin_name.as_deref(), r.door_id.as_deref()),
        None => (None, None),
    };

    let decision = state.engine.open_manual(admin_name, door_id).await?;
    Ok(respond(decision.outcome().await?))
}

/// `GET /api/access/logs?limit=`
pub async fn recent_logs(
    State(state): State<AppState>,
    query: Result<Query<LimitQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<AccessLog>>> {
    let Query(query) = query?;
    let entries = state
        .engine
        .audit()
        .recent(query.resolve(DEFAULT_LOG_LIMIT))
        .await?;
    Ok(Json(entries))
}

/// `GET /api/access/unauthorized?limit=`
pub async fn recent_unauthorized(
    State(state): State<AppState>,
    query: Result<Query<LimitQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<AccessLog>>> {
    let Query(query) = query?;
    let entries = state
        .engine
        .audit()
        .recent_unauthorized(query.resolve(DEFAULT_UNAUTHORIZED_LIMIT))
        .await?;
    Ok(Json(entries))
}
