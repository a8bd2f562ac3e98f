use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::Json;
use axum::extract::{Path, State};
use chrono::{DateTime, Utc};
use doorlink_core::DoorState;
use doorlink_storage::DoorRecord;
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DoorStatus {
    pub door_id: String,
    pub state: DoorState,
    pub last_event_ts: DateTime<Utc>,
    pub last_event: String,
}

/// Door status with convenience flags for the dashboard.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RealtimeDoorStatus {
    #[serde(flatten)]
    pub status: DoorStatus,
    pub is_open: bool,
    pub is_closed: bool,
}

impl From<DoorRecord> for DoorStatus {
    fn from(record: DoorRecord) -> Self {
        Self {
            door_id: record.door_id,
            state: record.state,
            last_event_ts: record.last_event_ts,
            last_event: record.last_event,
        }
    }
}

impl From<DoorRecord> for RealtimeDoorStatus {
    fn from(record: DoorRecord) -> Self {
        Self {
            is_open: record.state.is_open(),
            is_closed: record.state.is_closed(),
            status: record.into(),
        }
    }
}

/// `GET /api/doors/status/realtime`
pub async fn realtime_status(
    State(state): State<AppState>,
) -> ApiResult<Json<RealtimeDoorStatus>> {
    state
        .engine
        .tracker()
        .current()
        .await?
        .map(|record| Json(record.into()))
        .ok_or_else(|| ApiError::not_found("No door record"))
}

/// `GET /api/doors/{doorId}/status`
pub async fn door_status(
    State(state): State<AppState>,
    Path(door_id): Path<String>,
) -> ApiResult<Json<DoorStatus>> {
    state
        .engine
        .tracker()
        .find(&door_id)
        .await?
        .map(|record| Json(record.into()))
        .ok_or_else(|| ApiError::not_found(format!("Door {door_id} not found")))
}
