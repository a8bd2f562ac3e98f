#![allow(async_fn_in_trait)]

use crate::error::StorageResult;
use crate::models::DoorRecord;
use sqlx::SqlitePool;

/// Repository trait for door state records
pub trait DoorRepository: Send + Sync {
    /// Find the record of a door
    async fn find(&self, door_id: &str) -> StorageResult<Option<DoorRecord>>;

    /// Insert or replace the record of a door
    async fn upsert(&self, door: &DoorRecord) -> StorageResult<()>;

    /// Insert the record only if the door has none; returns `true` if inserted
    async fn insert_if_absent(&self, door: &DoorRecord) -> StorageResult<bool>;

    /// Delete every door record except `door_id`; returns the number removed
    async fn delete_except(&self, door_id: &str) -> StorageResult<u64>;
}

/// SQLite implementation of DoorRepository
#[derive(Debug, Clone)]
pub struct SqliteDoorRepository {
    pool: SqlitePool,
}

impl SqliteDoorRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl DoorRepository for SqliteDoorRepository {
    async fn find(&self, door_id: &str) -> StorageResult<Option<DoorRecord>> {
        let door = sqlx::query_as::<_, DoorRecord>(
            r#"
            SELECT door_id, state, last_event_ts, last_event, device_ts
            FROM doors
            WHERE door_id = ?
            "#,
        )
        .bind(door_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(door)
    }

    async fn upsert(&self, door: &DoorRecord) -> StorageResult<()> {
        sqlx::query(
            r#"
            INSERT INTO doors (door_id, state, last_event_ts, last_event, device_ts)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(door_id) DO UPDATE SET
                state         = excluded.state,
                last_event_ts = excluded.last_event_ts,
                last_event    = excluded.last_event,
                device_ts     = excluded.device_ts
            "#,
        )
        .bind(&door.door_id)
        .bind(door.state.as_str())
        .bind(door.last_event_ts)
        .bind(&door.last_event)
        .bind(&door.device_ts)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn insert_if_absent(&self, door: &DoorRecord) -> StorageResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO doors (door_id, state, last_event_ts, last_event, device_ts)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&door.door_id)
        .bind(door.state.as_str())
        .bind(door.last_event_ts)
        .bind(&door.last_event)
        .bind(&door.device_ts)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn delete_except(&self, door_id: &str) -> StorageResult<u64> {
        let result = sqlx::query("DELETE FROM doors WHERE door_id <> ?")
            .bind(door_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
