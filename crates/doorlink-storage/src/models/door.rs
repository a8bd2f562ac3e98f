use chrono::{DateTime, Utc};
use doorlink_core::DoorState;
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};

/// Last confirmed physical state of a door.
///
/// `last_event_ts` is always the server clock; `device_ts` keeps whatever
/// timestamp the controller reported and is never used for ordering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DoorRecord {
    pub door_id: String,
    pub state: DoorState,
    pub last_event_ts: DateTime<Utc>,
    pub last_event: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_ts: Option<String>,
}

impl DoorRecord {
    pub fn new(door_id: impl Into<String>, state: DoorState, last_event: impl Into<String>) -> Self {
        Self {
            door_id: door_id.into(),
            state,
            last_event_ts: Utc::now(),
            last_event: last_event.into(),
            device_ts: None,
        }
    }

    pub fn with_device_ts(mut self, device_ts: Option<String>) -> Self {
        self.device_ts = device_ts;
        self
    }
}

impl<'r> FromRow<'r, SqliteRow> for DoorRecord {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let state: String = row.try_get("state")?;
        let state = state
            .parse::<DoorState>()
            .map_err(|e| sqlx::Error::ColumnDecode {
                index: "state".to_string(),
                source: Box::new(e),
            })?;

        Ok(Self {
            door_id: row.try_get("door_id")?,
            state,
            last_event_ts: row.try_get("last_event_ts")?,
            last_event: row.try_get("last_event")?,
            device_ts: row.try_get("device_ts")?,
        })
    }
}
