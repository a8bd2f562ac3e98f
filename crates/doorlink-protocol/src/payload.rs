//! JSON payloads exchanged with the door controller.
//!
//! All payloads are flat objects with camelCase keys.

use chrono::{SecondsFormat, Utc};
use doorlink_core::{DoorId, DoorSignal, RequestId};
use serde::{Deserialize, Deserializer, Serialize};

/// Action value carried by every open command.
pub const OPEN_DOOR_ACTION: &str = "open_door";

/// Action value carried by unauthorized-access notices published by the backend.
pub const UNAUTHORIZED_ACTION: &str = "unauthorized_access";

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Blank or non-string request ids are treated as absent.
fn optional_request_id<'de, D>(deserializer: D) -> Result<Option<RequestId>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|id| RequestId::parse(&id).ok()))
}

// ============================================================================
// Outbound: open command
// ============================================================================

/// Command published on `access/door/open/request`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenDoorCommand {
    pub request_id: RequestId,
    pub action: String,
    pub door_id: DoorId,
    pub user_id: String,
    pub user_name: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub manual: bool,
    pub timestamp: String,
}

impl OpenDoorCommand {
    /// Build an open command stamped with the current time.
    #[must_use]
    pub fn new(
        request_id: RequestId,
        door_id: DoorId,
        user_id: impl Into<String>,
        user_name: impl Into<String>,
        manual: bool,
    ) -> Self {
        Self {
            request_id,
            action: OPEN_DOOR_ACTION.to_string(),
            door_id,
            user_id: user_id.into(),
            user_name: user_name.into(),
            manual,
            timestamp: now_rfc3339(),
        }
    }
}

// ============================================================================
// Inbound: acknowledgment
// ============================================================================

/// Acknowledgment received on `access/door/open/response`.
///
/// `success` is mandatory; an acknowledgment without it is malformed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenAcknowledgment {
    pub request_id: RequestId,
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
}

impl OpenAcknowledgment {
    /// Error text reported by the controller, or a placeholder.
    #[must_use]
    pub fn error_text(&self) -> &str {
        self.error
            .as_deref()
            .filter(|e| !e.trim().is_empty())
            .unwrap_or("unknown error")
    }
}

// ============================================================================
// Inbound: sensor status
// ============================================================================

/// What a sensor report says about the door.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorObservation {
    /// Only `doorOpened = true`.
    Opened,
    /// Only `doorClosed = true`.
    Closed,
    /// Both flags set.
    Ambiguous,
    /// No flag set to `true`.
    Silent,
}

impl SensorObservation {
    /// Signal to apply to the door state machine, if any.
    ///
    /// An ambiguous reading settles on `closed`.
    #[must_use]
    pub fn signal(self) -> Option<DoorSignal> {
        match self {
            SensorObservation::Opened => Some(DoorSignal::Opened),
            SensorObservation::Closed | SensorObservation::Ambiguous => Some(DoorSignal::Closed),
            SensorObservation::Silent => None,
        }
    }
}

/// Report received on `access/door/sensor/status`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorStatus {
    #[serde(default, deserialize_with = "optional_request_id")]
    pub request_id: Option<RequestId>,
    #[serde(default)]
    pub door_opened: Option<bool>,
    #[serde(default)]
    pub door_closed: Option<bool>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub event: Option<String>,
}

impl SensorStatus {
    /// Derive the observation from the explicit boolean flags.
    #[must_use]
    pub fn observation(&self) -> SensorObservation {
        let opened = self.door_opened == Some(true);
        let closed = self.door_closed == Some(true);
        match (opened, closed) {
            (true, true) => SensorObservation::Ambiguous,
            (true, false) => SensorObservation::Opened,
            (false, true) => SensorObservation::Closed,
            (false, false) => SensorObservation::Silent,
        }
    }

    /// Event name, if the controller sent a non-blank one.
    #[must_use]
    pub fn event_name(&self) -> Option<&str> {
        self.event.as_deref().filter(|e| !e.trim().is_empty())
    }

    /// Returns `true` for an opening the controller reports on its own,
    /// without a request to correlate with.
    #[must_use]
    pub fn is_unsolicited_opening(&self) -> bool {
        self.request_id.is_none()
            && self.observation() == SensorObservation::Opened
            && self.event_name() == Some(UnauthorizedKind::DOOR_OPENED_EVENT)
    }
}

// ============================================================================
// Unauthorized access (both directions)
// ============================================================================

/// Classification of an unauthorized-access notice by its `event` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnauthorizedKind {
    /// Door physically left open without an authorized request.
    DoorLeftOpen,
    /// Door forced open.
    ForcedOpen,
    /// Unknown code presented at the keypad.
    InvalidCode,
    /// Code of an inactive user presented.
    InactiveUser,
    /// Any other or missing event.
    Other,
}

impl UnauthorizedKind {
    /// Event name the controller uses for a sensor-detected opening.
    pub const DOOR_OPENED_EVENT: &'static str = "door_opened";

    /// Classify an event name. Legacy firmware names are accepted.
    #[must_use]
    pub fn from_event(event: Option<&str>) -> Self {
        match event.map(str::trim) {
            Some("door_left_open") => UnauthorizedKind::DoorLeftOpen,
            Some("forced_open") => UnauthorizedKind::ForcedOpen,
            Some("invalid_code" | "codigo_invalido") => UnauthorizedKind::InvalidCode,
            Some("inactive_user" | "usuario_inactivo") => UnauthorizedKind::InactiveUser,
            _ => UnauthorizedKind::Other,
        }
    }

    /// Event name published for this kind.
    #[must_use]
    pub fn event_name(self) -> &'static str {
        match self {
            UnauthorizedKind::DoorLeftOpen => "door_left_open",
            UnauthorizedKind::ForcedOpen => "forced_open",
            UnauthorizedKind::InvalidCode => "invalid_code",
            UnauthorizedKind::InactiveUser => "inactive_user",
            UnauthorizedKind::Other => UNAUTHORIZED_ACTION,
        }
    }

    /// Returns `true` when the door was physically opened.
    #[inline]
    #[must_use]
    pub fn is_physical_opening(self) -> bool {
        matches!(
            self,
            UnauthorizedKind::DoorLeftOpen | UnauthorizedKind::ForcedOpen
        )
    }
}

/// Unauthorized-access notice on `access/door/unauthorized`.
///
/// Every field is optional: the controller sends sparse alerts, the backend
/// sends fully populated ones to drive the keypad's red LED.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnauthorizedNotice {
    #[serde(
        default,
        deserialize_with = "optional_request_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub request_id: Option<RequestId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub door_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl UnauthorizedNotice {
    /// Notice published when a presented code is rejected at decision time.
    #[must_use]
    pub fn rejected_code(
        request_id: RequestId,
        door_id: &DoorId,
        kind: UnauthorizedKind,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            request_id: Some(request_id),
            action: Some(UNAUTHORIZED_ACTION.to_string()),
            door_id: Some(door_id.to_string()),
            reason: Some(reason.into()),
            message: None,
            event: Some(kind.event_name().to_string()),
            timestamp: Some(now_rfc3339()),
        }
    }

    /// Incident raised when the sensor reports an opening nobody asked for.
    #[must_use]
    pub fn door_left_open(timestamp: Option<String>) -> Self {
        Self {
            request_id: None,
            action: None,
            door_id: None,
            reason: Some("Physical opening without authorization".to_string()),
            message: Some("Door left open physically without authorization".to_string()),
            event: Some(UnauthorizedKind::DoorLeftOpen.event_name().to_string()),
            timestamp,
        }
    }

    #[must_use]
    pub fn kind(&self) -> UnauthorizedKind {
        UnauthorizedKind::from_event(self.event.as_deref())
    }

    /// Human-readable description: reason, then message, then a default.
    #[must_use]
    pub fn describe(&self) -> String {
        [self.reason.as_deref(), self.message.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|s| !s.is_empty())
            .unwrap_or("Physical opening without authorization")
            .to_string()
    }

    /// Event name to record, defaulting to `unauthorized_access`.
    #[must_use]
    pub fn event_name(&self) -> &str {
        self.event
            .as_deref()
            .filter(|e| !e.trim().is_empty())
            .unwrap_or(UNAUTHORIZED_ACTION)
    }
}
