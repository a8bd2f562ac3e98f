use crate::dedup::{Deduplicator, Fingerprint};
use crate::error::EngineResult;
use doorlink_core::{AccessStatus, RequestId};
use doorlink_storage::{AccessLog, AccessLogRepository, Database, SqliteAccessLogRepository};
use std::time::Duration;
use tracing::{debug, trace};

/// Append-only audit trail guarded by the deduplicator.
pub struct AuditLog {
    repo: SqliteAccessLogRepository,
    dedup: Deduplicator,
}

impl AuditLog {
    pub fn new(db: &Database, window: Duration, bucket: Duration) -> Self {
        Self {
            repo: SqliteAccessLogRepository::new(db.pool().clone()),
            dedup: Deduplicator::new(window, bucket),
        }
    }

    /// Append an unsolicited `entry` unless an identical one was written
    /// within the window.
    ///
    /// Returns `Ok(false)` when suppressed.
    pub async fn record(&self, entry: &AccessLog) -> EngineResult<bool> {
        self.write(entry, Fingerprint::from(entry)).await
    }

    /// Append the entry for access attempt `request_id`. Only a repeated
    /// write for the same attempt is suppressed.
    pub async fn record_request(
        &self,
        entry: &AccessLog,
        request_id: &RequestId,
    ) -> EngineResult<bool> {
        self.write(entry, Fingerprint::for_request(entry, request_id))
            .await
    }

    /// A failed write releases the fingerprint so a retry is not mistaken
    /// for a duplicate.
    async fn write(&self, entry: &AccessLog, fingerprint: Fingerprint) -> EngineResult<bool> {
        if !self.dedup.accept(fingerprint.clone()) {
            debug!(
                status = %entry.status,
                door_id = %entry.door_id,
                "duplicate audit entry suppressed"
            );
            return Ok(false);
        }

        match self.repo.create(entry).await {
            Ok(id) => {
                trace!(id, status = %entry.status, "audit entry written");
                Ok(true)
            }
            Err(e) => {
                self.dedup.forget(&fingerprint);
                Err(e.into())
            }
        }
    }

    /// Most recent entries, newest first.
    pub async fn recent(&self, limit: i64) -> EngineResult<Vec<AccessLog>> {
        Ok(self.repo.find_recent(limit).await?)
    }

    /// Most recent unauthorized-access entries, newest first.
    pub async fn recent_unauthorized(&self, limit: i64) -> EngineResult<Vec<AccessLog>> {
        Ok(self
            .repo
            .find_recent_by_status(AccessStatus::UnauthorizedAccess, limit)
            .await?)
    }

    pub async fn count(&self, status: AccessStatus) -> EngineResult<i64> {
        Ok(self.repo.count_by_status(status).await?)
    }
}
