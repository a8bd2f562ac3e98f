use chrono::{DateTime, Utc};
use doorlink_core::AccessStatus;
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};

/// Audit entry for an access attempt or an unsolicited door event.
///
/// Entries are append-only; the schema rejects updates and deletes.
/// Subject fields are `None` for unsolicited events, and `access_code` is
/// `None` when no code was presented.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessLog {
    pub id: i64,
    pub user_id: Option<String>,
    pub user_name: Option<String>,
    pub access_code: Option<String>,
    pub door_id: String,
    pub granted: bool,
    pub reason: Option<String>,
    pub status: AccessStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl AccessLog {
    /// Create an entry with no subject attached, stamped now.
    pub fn new(door_id: impl Into<String>, status: AccessStatus, reason: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            user_id: None,
            user_name: None,
            access_code: None,
            door_id: door_id.into(),
            granted: status.is_granted(),
            reason,
            status,
            event: None,
            timestamp: now,
            created_at: now,
        }
    }

    pub fn with_subject(mut self, user_id: Option<String>, user_name: Option<String>) -> Self {
        self.user_id = user_id;
        self.user_name = user_name;
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.access_code = Some(code.into());
        self
    }

    pub fn with_event(mut self, event: impl Into<String>) -> Self {
        self.event = Some(event.into());
        self
    }
}

impl<'r> FromRow<'r, SqliteRow> for AccessLog {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let status: String = row.try_get("status")?;
        let status = status
            .parse::<AccessStatus>()
            .map_err(|e| sqlx::Error::ColumnDecode {
                index: "status".to_string(),
                source: Box::new(e),
            })?;

        Ok(Self {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            user_name: row.try_get("user_name")?,
            access_code: row.try_get("access_code")?,
            door_id: row.try_get("door_id")?,
            granted: row.try_get("granted")?,
            reason: row.try_get("reason")?,
            status,
            event: row.try_get("event")?,
            timestamp: row.try_get("timestamp")?,
            created_at: row.try_get("created_at")?,
        })
    }
}
