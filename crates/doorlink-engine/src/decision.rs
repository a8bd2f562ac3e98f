//! Access decision engine.
//!
//! A presented code either fails fast (unknown code, inactive user) or turns
//! into a pending request: registered under a fresh id, timed, and announced
//! to the controller with an open command. Pending requests are resolved by
//! whichever of acknowledgment failure, sensor report or timeout reaches the
//! registry first; see [`AccessEngine::resolve`].

use crate::audit::AuditLog;
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::outcome::{AccessOutcome, Decision, PendingAccess};
use crate::registry::{CorrelationRegistry, PendingRequest, Subject};
use crate::timeout::TimeoutHandle;
use crate::tracker::DoorTracker;
use doorlink_core::{AccessStatus, DoorId, RequestId, RequestKind};
use doorlink_network::Publisher;
use doorlink_protocol::{OpenDoorCommand, UnauthorizedKind, UnauthorizedNotice};
use doorlink_storage::{
    AccessLog, AccessReasons, Database, SqliteUserRepository, User, UserRepository,
};
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};

pub struct AccessEngine {
    pub(crate) config: EngineConfig,
    users: SqliteUserRepository,
    pub(crate) registry: CorrelationRegistry,
    pub(crate) tracker: DoorTracker,
    pub(crate) audit: AuditLog,
    publisher: Arc<dyn Publisher>,
    timer: TimeoutHandle,
}

impl AccessEngine {
    /// Build the engine and start its timeout task.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(
        config: EngineConfig,
        db: &Database,
        publisher: Arc<dyn Publisher>,
    ) -> EngineResult<Arc<Self>> {
        config.validate()?;

        Ok(Arc::new_cyclic(|engine| Self {
            users: SqliteUserRepository::new(db.pool().clone()),
            registry: CorrelationRegistry::new(config.registry_shards),
            tracker: DoorTracker::new(db, config.door_id.clone()),
            audit: AuditLog::new(db, config.dedup_window, config.dedup_bucket),
            publisher,
            timer: TimeoutHandle::spawn(engine.clone()),
            config,
        }))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn tracker(&self) -> &DoorTracker {
        &self.tracker
    }

    pub fn audit(&self) -> &AuditLog {
        &self.audit
    }

    /// Number of requests still waiting for the controller.
    pub fn pending_count(&self) -> usize {
        self.registry.len()
    }

    pub fn is_pending(&self, id: &RequestId) -> bool {
        self.registry.contains(id)
    }

    /// Decide on a code presented at the keypad or through the API.
    ///
    /// # Errors
    /// - `EngineError::Invalid` if `door_id` is not a valid door id
    /// - `EngineError::Storage` if the user lookup fails; nothing is logged
    pub async fn submit_code(&self, code: &str, door_id: Option<&str>) -> EngineResult<Decision> {
        let door_id = self.target_door(door_id)?;
        let code = code.trim();

        let user = if code.is_empty() {
            None
        } else {
            self.users.find_by_code(code).await?
        };

        match user {
            None => {
                self.deny_immediately(
                    None,
                    code,
                    door_id,
                    AccessStatus::InvalidCode,
                    UnauthorizedKind::InvalidCode,
                    AccessReasons::INVALID_CODE,
                )
                .await
            }
            Some(user) if !user.is_active => {
                self.deny_immediately(
                    Some(&user),
                    code,
                    door_id,
                    AccessStatus::InactiveUser,
                    UnauthorizedKind::InactiveUser,
                    AccessReasons::INACTIVE_USER,
                )
                .await
            }
            Some(user) => {
                let id = RequestId::generate(RequestKind::CodeAccess);
                let (pending, receiver) = PendingRequest::new(
                    id,
                    RequestKind::CodeAccess,
                    Subject::from_user(&user),
                    code,
                    door_id,
                );
                self.dispatch(pending, receiver).await
            }
        }
    }

    /// Open the door on behalf of a dashboard operator.
    pub async fn open_manual(
        &self,
        admin_name: Option<&str>,
        door_id: Option<&str>,
    ) -> EngineResult<Decision> {
        let door_id = self.target_door(door_id)?;
        let id = RequestId::generate(RequestKind::ManualOpen);
        let (pending, receiver) = PendingRequest::manual(id, admin_name, door_id);
        self.dispatch(pending, receiver).await
    }

    fn target_door(&self, door_id: Option<&str>) -> EngineResult<DoorId> {
        match door_id.map(str::trim).filter(|d| !d.is_empty()) {
            Some(door_id) => Ok(DoorId::new(door_id)?),
            None => Ok(self.config.door_id.clone()),
        }
    }

    async fn deny_immediately(
        &self,
        user: Option<&User>,
        code: &str,
        door_id: DoorId,
        status: AccessStatus,
        kind: UnauthorizedKind,
        reason: &str,
    ) -> EngineResult<Decision> {
        let attempt = RequestId::generate(RequestKind::CodeAccess);

        // Drives the keypad's red LED.
        let notice = UnauthorizedNotice::rejected_code(
            attempt.clone(),
            &door_id,
            kind,
            reason,
        );
        if let Err(e) = self.publisher.publish(&notice.into()) {
            warn!(error = %e, "failed to publish rejection notice");
        }

        let entry = AccessLog::new(door_id.as_str(), status, Some(reason.to_string()))
            .with_subject(user.map(User::subject_id), user.map(|u| u.name.clone()))
            .with_code(code);
        self.write_log(&entry, &attempt).await;

        info!(request_id = %attempt, status = %status, door_id = %door_id, "access denied");
        let outcome = AccessOutcome::from_entry(&entry, false, None);
        Ok(Decision::Immediate(outcome))
    }

    async fn dispatch(
        &self,
        pending: PendingRequest,
        receiver: oneshot::Receiver<AccessOutcome>,
    ) -> EngineResult<Decision> {
        let id = pending.id.clone();
        let command = OpenDoorCommand::new(
            id.clone(),
            pending.door_id.clone(),
            pending.subject.user_id.clone(),
            pending.subject.name.clone(),
            pending.is_manual(),
        );

        self.registry
            .insert(pending)
            .map_err(|rejected| EngineError::DuplicateRequest(rejected.id))?;
        self.timer.arm(id.clone(), self.config.request_timeout);

        match self.publisher.publish(&command.into()) {
            Ok(()) => info!(request_id = %id, "open command published"),
            Err(e) => {
                error!(request_id = %id, error = %e, "failed to publish open command");
                self.resolve(
                    &id,
                    AccessStatus::DoorError,
                    Some(AccessReasons::door_error(&e.to_string())),
                )
                .await;
            }
        }

        Ok(Decision::Pending(PendingAccess::new(id, receiver)))
    }

    /// Resolve `id` if it is still pending. Returns `false` if another path
    /// got there first.
    pub(crate) async fn resolve(
        &self,
        id: &RequestId,
        status: AccessStatus,
        reason: Option<String>,
    ) -> bool {
        match self.registry.take(id) {
            Some(pending) => {
                self.finish(pending, status, reason).await;
                true
            }
            None => false,
        }
    }

    /// Resolve `id` as opened, if still pending.
    pub(crate) async fn resolve_opened(&self, id: &RequestId) -> bool {
        let Some(pending) = self.registry.take(id) else {
            return false;
        };
        if pending.is_manual() {
            let reason = Some(AccessReasons::MANUAL_OPEN.to_string());
            self.finish(pending, AccessStatus::ManualOpen, reason).await;
        } else {
            self.finish(pending, AccessStatus::AccessGranted, None).await;
        }
        true
    }

    /// Terminal step shared by every resolution path. The caller owns
    /// `pending`, so this runs at most once per request.
    pub(crate) async fn finish(
        &self,
        pending: PendingRequest,
        status: AccessStatus,
        reason: Option<String>,
    ) {
        self.timer.cancel(pending.id.clone());

        let entry = AccessLog::new(pending.door_id.as_str(), status, reason)
            .with_subject(
                Some(pending.subject.user_id.clone()),
                Some(pending.subject.name.clone()),
            )
            .with_code(pending.presented_code.as_str());
        self.write_log(&entry, &pending.id).await;

        info!(
            request_id = %pending.id,
            status = %status,
            elapsed_ms = pending.created_at.elapsed().as_millis() as u64,
            "request resolved"
        );

        let request_id = pending.id.clone();
        let outcome =
            AccessOutcome::from_entry(&entry, pending.is_manual(), Some(request_id.clone()));
        if !pending.respond(outcome) {
            debug!(request_id = %request_id, "caller stopped waiting");
        }
    }

    /// Write an audit entry; failures are logged and do not block the
    /// response.
    async fn write_log(&self, entry: &AccessLog, request_id: &RequestId) {
        if let Err(e) = self.audit.record_request(entry, request_id).await {
            error!(status = %entry.status, error = %e, "failed to write audit entry");
        }
    }
}
