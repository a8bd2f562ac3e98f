use crate::error::{EngineError, EngineResult};
use chrono::{DateTime, Utc};
use doorlink_core::{AccessStatus, RequestId};
use doorlink_storage::AccessLog;
use serde::Serialize;
use tokio::sync::oneshot;

/// Terminal result of an access attempt, as returned to the HTTP caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessOutcome {
    pub granted: bool,
    pub status: AccessStatus,
    pub user_id: Option<String>,
    pub user_name: Option<String>,
    pub reason: Option<String>,
    pub manual: bool,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<RequestId>,
}

impl AccessOutcome {
    /// Outcome mirroring the audit entry written for it.
    pub fn from_entry(entry: &AccessLog, manual: bool, request_id: Option<RequestId>) -> Self {
        Self {
            granted: entry.granted,
            status: entry.status,
            user_id: entry.user_id.clone(),
            user_name: entry.user_name.clone(),
            reason: entry.reason.clone(),
            manual,
            timestamp: entry.timestamp,
            request_id,
        }
    }

    #[inline]
    pub fn is_timeout(&self) -> bool {
        self.status == AccessStatus::Timeout
    }
}

/// Result of submitting an access attempt.
#[derive(Debug)]
pub enum Decision {
    /// Decided without involving the controller.
    Immediate(AccessOutcome),
    /// Waiting on the controller; resolves within the request timeout.
    Pending(PendingAccess),
}

impl Decision {
    /// Wait for the terminal outcome.
    pub async fn outcome(self) -> EngineResult<AccessOutcome> {
        match self {
            Decision::Immediate(outcome) => Ok(outcome),
            Decision::Pending(pending) => pending.outcome().await,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Decision::Pending(_))
    }
}

/// Handle on an in-flight request.
#[derive(Debug)]
pub struct PendingAccess {
    pub request_id: RequestId,
    receiver: oneshot::Receiver<AccessOutcome>,
}

impl PendingAccess {
    pub(crate) fn new(request_id: RequestId, receiver: oneshot::Receiver<AccessOutcome>) -> Self {
        Self {
            request_id,
            receiver,
        }
    }

    pub async fn outcome(self) -> EngineResult<AccessOutcome> {
        self.receiver
            .await
            .map_err(|_| EngineError::Abandoned(self.request_id))
    }
}
