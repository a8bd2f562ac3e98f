#![allow(async_fn_in_trait)]

use crate::error::StorageResult;
use crate::models::AccessLog;
use doorlink_core::AccessStatus;
use sqlx::SqlitePool;

/// Repository trait for the append-only audit log
pub trait AccessLogRepository: Send + Sync {
    /// Append an entry; returns its id
    async fn create(&self, log: &AccessLog) -> StorageResult<i64>;

    /// Most recent entries, newest first
    async fn find_recent(&self, limit: i64) -> StorageResult<Vec<AccessLog>>;

    /// Most recent entries with the given status, newest first
    async fn find_recent_by_status(
        &self,
        status: AccessStatus,
        limit: i64,
    ) -> StorageResult<Vec<AccessLog>>;

    /// Number of entries with the given status
    async fn count_by_status(&self, status: AccessStatus) -> StorageResult<i64>;
}

/// SQLite implementation of AccessLogRepository
#[derive(Debug, Clone)]
pub struct SqliteAccessLogRepository {
    pool: SqlitePool,
}

impl SqliteAccessLogRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl AccessLogRepository for SqliteAccessLogRepository {
    async fn create(&self, log: &AccessLog) -> StorageResult<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO access_logs (
                user_id, user_name, access_code, door_id,
                granted, reason, status, event, timestamp
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&log.user_id)
        .bind(&log.user_name)
        .bind(&log.access_code)
        .bind(&log.door_id)
        .bind(log.granted)
        .bind(&log.reason)
        .bind(log.status.as_str())
        .bind(&log.event)
        .bind(log.timestamp)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    async fn find_recent(&self, limit: i64) -> StorageResult<Vec<AccessLog>> {
        let logs = sqlx::query_as::<_, AccessLog>(
            r#"
            SELECT id, user_id, user_name, access_code, door_id,
                   granted, reason, status, event, timestamp, created_at
            FROM access_logs
            ORDER BY timestamp DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(logs)
    }

    async fn find_recent_by_status(
        &self,
        status: AccessStatus,
        limit: i64,
    ) -> StorageResult<Vec<AccessLog>> {
        let logs = sqlx::query_as::<_, AccessLog>(
            r#"
            SELECT id, user_id, user_name, access_code, door_id,
                   granted, reason, status, event, timestamp, created_at
            FROM access_logs
            WHERE status = ?
            ORDER BY timestamp DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(status.as_str())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(logs)
    }

    async fn count_by_status(&self, status: AccessStatus) -> StorageResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM access_logs WHERE status = ?")
            .bind(status.as_str())
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
