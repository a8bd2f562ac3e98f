//! Handlers for messages coming from the door controller.

use crate::config::UnmatchedClosePolicy;
use crate::decision::AccessEngine;
use doorlink_core::{AccessStatus, DoorSignal, RequestId};
use doorlink_protocol::{
    InboundMessage, OpenAcknowledgment, SensorObservation, SensorStatus, UnauthorizedNotice,
};
use doorlink_storage::{AccessLog, AccessReasons};
use tracing::{debug, error, info, warn};

impl AccessEngine {
    /// Dispatch a decoded inbound message to its handler.
    pub async fn handle(&self, message: InboundMessage) {
        match message {
            InboundMessage::Acknowledgment(ack) => self.handle_ack(ack).await,
            InboundMessage::Sensor(status) => self.handle_sensor(status).await,
            InboundMessage::Unauthorized(notice) => self.handle_unauthorized(notice).await,
        }
    }

    /// A failed acknowledgment resolves the request; a successful one only
    /// marks it, since the sensor has the final word.
    pub async fn handle_ack(&self, ack: OpenAcknowledgment) {
        if ack.success {
            if self.registry.mark_acknowledged(&ack.request_id) {
                debug!(request_id = %ack.request_id, "open acknowledged, waiting for sensor");
            } else {
                debug!(request_id = %ack.request_id, "acknowledgment for unknown request");
            }
            return;
        }

        let reason = AccessReasons::door_error(ack.error_text());
        if !self
            .resolve(&ack.request_id, AccessStatus::DoorError, Some(reason))
            .await
        {
            debug!(request_id = %ack.request_id, "failure for unknown request ignored");
        }
    }

    pub async fn handle_sensor(&self, status: SensorStatus) {
        let observation = status.observation();

        match self
            .tracker
            .observe(observation, status.event_name(), status.timestamp.clone())
            .await
        {
            Ok(Some(record)) => debug!(state = %record.state, "sensor update applied"),
            Ok(None) => debug!("sensor update without door signal"),
            Err(e) => error!(error = %e, "failed to update door state"),
        }

        match (&status.request_id, observation) {
            (Some(id), SensorObservation::Opened) => {
                if !self.resolve_opened(id).await {
                    debug!(request_id = %id, "opening for unknown request");
                }
            }
            (Some(id), SensorObservation::Closed) => {
                self.resolve_if_pending(id, AccessReasons::DOOR_DID_NOT_OPEN)
                    .await;
            }
            (Some(id), SensorObservation::Ambiguous) => {
                self.resolve_if_pending(id, AccessReasons::AMBIGUOUS_SENSOR)
                    .await;
            }
            (None, SensorObservation::Opened) if status.is_unsolicited_opening() => {
                let notice = UnauthorizedNotice::door_left_open(status.timestamp.clone());
                self.handle_unauthorized(notice).await;
            }
            (None, SensorObservation::Closed) => {
                self.close_unmatched(AccessReasons::CLOSED_WITHOUT_OPENING)
                    .await;
            }
            (None, SensorObservation::Ambiguous) => {
                self.close_unmatched(AccessReasons::AMBIGUOUS_SENSOR).await;
            }
            _ => {}
        }
    }

    async fn resolve_if_pending(&self, id: &RequestId, reason: &str) {
        if !self
            .resolve(id, AccessStatus::DoorError, Some(reason.to_string()))
            .await
        {
            debug!(request_id = %id, "closed report for unknown request");
        }
    }

    /// The door reported closed without naming a request.
    async fn close_unmatched(&self, reason: &str) {
        let door_id = &self.config.door_id;
        let policy = self.config.unmatched_close;

        match policy {
            UnmatchedClosePolicy::Ignore => {
                let pending = self.registry.pending_for_door(door_id);
                if pending > 0 {
                    warn!(
                        %policy,
                        pending,
                        "door closed without request id, leaving requests pending"
                    );
                }
            }
            UnmatchedClosePolicy::DenyPending => {
                let taken = self.registry.take_for_door(door_id);
                if taken.is_empty() {
                    debug!("door closed without request id, nothing pending");
                    return;
                }
                warn!(
                    %policy,
                    pending = taken.len(),
                    "door closed without request id, denying pending requests"
                );
                for pending in taken {
                    self.finish(pending, AccessStatus::DoorError, Some(reason.to_string()))
                        .await;
                }
            }
        }
    }

    /// Record an unauthorized-access notice. Physical openings also force
    /// the door state to open.
    pub async fn handle_unauthorized(&self, notice: UnauthorizedNotice) {
        let kind = notice.kind();
        let event = notice.event_name().to_string();

        if kind.is_physical_opening()
            && let Err(e) = self
                .tracker
                .apply(DoorSignal::ForcedOpen, Some(&event), notice.timestamp.clone())
                .await
        {
            error!(error = %e, "failed to record physical opening");
        }

        let door_id = notice
            .door_id
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .unwrap_or(self.config.door_id.as_str());
        let reason = notice.describe();
        let entry = AccessLog::new(
            door_id,
            AccessStatus::UnauthorizedAccess,
            Some(reason.clone()),
        )
        .with_event(event.as_str());

        match self.audit.record(&entry).await {
            Ok(true) => warn!(event = %event, reason = %reason, "unauthorized access"),
            Ok(false) => {}
            Err(e) => error!(error = %e, "failed to record unauthorized access"),
        }
    }

    /// Called by the timeout task when a request's deadline passes.
    pub(crate) async fn resolve_timeout(&self, id: RequestId) {
        let reason = Some(AccessReasons::TIMEOUT.to_string());
        if self.resolve(&id, AccessStatus::Timeout, reason).await {
            info!(request_id = %id, "no response from door controller");
        }
    }
}
