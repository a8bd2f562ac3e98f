use crate::{
    Result,
    constants::{
        DEFAULT_DOOR_ID, MANUAL_REQUEST_ID_PREFIX, MAX_ACCESS_CODE_LENGTH, MAX_DOOR_ID_LENGTH,
        MAX_REQUEST_ID_LENGTH, REQUEST_ID_PREFIX, REQUEST_ID_SUFFIX_LENGTH,
    },
    error::Error,
};
use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use subtle::ConstantTimeEq;

/// Kind of request tracked by the correlation registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequestKind {
    /// Access requested by presenting a code.
    CodeAccess,
    /// Opening triggered by an operator from the dashboard.
    ManualOpen,
}

impl RequestKind {
    /// Prefix used for request ids of this kind.
    #[must_use]
    pub fn id_prefix(self) -> &'static str {
        match self {
            RequestKind::CodeAccess => REQUEST_ID_PREFIX,
            RequestKind::ManualOpen => MANUAL_REQUEST_ID_PREFIX,
        }
    }

    /// Returns `true` for manual openings.
    #[inline]
    #[must_use]
    pub fn is_manual(self) -> bool {
        matches!(self, RequestKind::ManualOpen)
    }
}

/// Correlation id linking an HTTP request to its asynchronous confirmation.
///
/// Generated ids look like `req_1730000000000_k3j9x0a1b` (code access) or
/// `req_manual_1730000000000_k3j9x0a1b` (manual opening). Ids received from
/// the controller are treated as opaque and only checked for sanity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RequestId(String);

impl RequestId {
    /// Generate a fresh request id for the given kind.
    #[must_use]
    pub fn generate(kind: RequestKind) -> Self {
        let millis = Utc::now().timestamp_millis();
        let mut rng = rand::thread_rng();
        let suffix: String = (0..REQUEST_ID_SUFFIX_LENGTH)
            .map(|_| char::from_digit(rng.gen_range(0..36), 36).unwrap_or('0'))
            .collect();

        RequestId(format!("{}_{millis}_{suffix}", kind.id_prefix()))
    }

    /// Wrap an id received from the transport.
    ///
    /// # Errors
    /// Returns `Error::InvalidRequestId` if the id is blank, too long, or
    /// contains control characters.
    pub fn parse(id: &str) -> Result<Self> {
        let id = id.trim();
        if id.is_empty() {
            return Err(Error::InvalidRequestId("request id is empty".to_string()));
        }
        if id.len() > MAX_REQUEST_ID_LENGTH {
            return Err(Error::InvalidRequestId(format!(
                "request id longer than {MAX_REQUEST_ID_LENGTH} bytes"
            )));
        }
        if id.chars().any(char::is_control) {
            return Err(Error::InvalidRequestId(
                "request id contains control characters".to_string(),
            ));
        }
        Ok(RequestId(id.to_string()))
    }

    /// Get the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if the id was generated for a manual opening.
    #[must_use]
    pub fn is_manual(&self) -> bool {
        self.0.starts_with(MANUAL_REQUEST_ID_PREFIX)
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for RequestId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        RequestId::parse(&value)
    }
}

impl From<RequestId> for String {
    fn from(id: RequestId) -> String {
        id.0
    }
}

/// Identity of a door (free-form name, 1-64 characters).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DoorId(String);

impl DoorId {
    /// Create a door id, trimming surrounding whitespace.
    ///
    /// # Errors
    /// Returns `Error::InvalidDoorId` if the name is empty or longer than
    /// 64 characters.
    pub fn new(name: &str) -> Result<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::InvalidDoorId("door id is empty".to_string()));
        }
        let len = name.chars().count();
        if len > MAX_DOOR_ID_LENGTH {
            return Err(Error::InvalidDoorId(format!(
                "door id must be at most {MAX_DOOR_ID_LENGTH} chars, got {len}"
            )));
        }
        Ok(DoorId(name.to_string()))
    }

    /// Get the door id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for DoorId {
    /// The door configured by default, [`DEFAULT_DOOR_ID`].
    fn default() -> Self {
        DoorId(DEFAULT_DOOR_ID.to_string())
    }
}

impl fmt::Display for DoorId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for DoorId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        DoorId::new(s)
    }
}

impl TryFrom<String> for DoorId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        DoorId::new(&value)
    }
}

impl From<DoorId> for String {
    fn from(id: DoorId) -> String {
        id.0
    }
}

/// Access code presented at the keypad or through the API.
///
/// # Security
/// Equality is constant-time so that comparing a presented code with a stored
/// one does not leak how many leading characters matched.
#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccessCode(String);

impl AccessCode {
    /// Create an access code, trimming surrounding whitespace.
    ///
    /// # Errors
    /// Returns `Error::InvalidAccessCode` if the code is empty, longer than
    /// 64 bytes, or contains non-printable characters.
    pub fn new(code: &str) -> Result<Self> {
        let code = code.trim();
        if code.is_empty() {
            return Err(Error::InvalidAccessCode("access code is empty".to_string()));
        }
        if code.len() > MAX_ACCESS_CODE_LENGTH {
            return Err(Error::InvalidAccessCode(format!(
                "access code longer than {MAX_ACCESS_CODE_LENGTH} bytes"
            )));
        }
        if code.chars().any(char::is_control) {
            return Err(Error::InvalidAccessCode(
                "access code contains control characters".to_string(),
            ));
        }
        Ok(AccessCode(code.to_string()))
    }

    /// Get the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Compare against a stored code in constant time.
    #[must_use]
    pub fn matches(&self, stored: &str) -> bool {
        self.0.as_bytes().ct_eq(stored.as_bytes()).into()
    }
}

impl PartialEq for AccessCode {
    fn eq(&self, other: &Self) -> bool {
        self.matches(&other.0)
    }
}

impl std::hash::Hash for AccessCode {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl fmt::Display for AccessCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for AccessCode {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        AccessCode::new(&value)
    }
}

impl From<AccessCode> for String {
    fn from(code: AccessCode) -> String {
        code.0
    }
}

/// Outcome recorded on every audit log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AccessStatus {
    AccessGranted,
    ManualOpen,
    InactiveUser,
    InvalidCode,
    DoorError,
    Timeout,
    UnauthorizedAccess,
}

impl AccessStatus {
    /// Every status, in declaration order.
    pub const ALL: [AccessStatus; 7] = [
        AccessStatus::AccessGranted,
        AccessStatus::ManualOpen,
        AccessStatus::InactiveUser,
        AccessStatus::InvalidCode,
        AccessStatus::DoorError,
        AccessStatus::Timeout,
        AccessStatus::UnauthorizedAccess,
    ];

    /// Wire and storage representation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AccessStatus::AccessGranted => "access-granted",
            AccessStatus::ManualOpen => "manual-open",
            AccessStatus::InactiveUser => "inactive-user",
            AccessStatus::InvalidCode => "invalid-code",
            AccessStatus::DoorError => "door-error",
            AccessStatus::Timeout => "timeout",
            AccessStatus::UnauthorizedAccess => "unauthorized-access",
        }
    }

    /// Returns `true` for statuses that represent an opened door.
    #[inline]
    #[must_use]
    pub fn is_granted(self) -> bool {
        matches!(self, AccessStatus::AccessGranted | AccessStatus::ManualOpen)
    }
}

impl fmt::Display for AccessStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AccessStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        AccessStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| Error::UnknownStatus(s.to_string()))
    }
}

/// Physical state of the door as last confirmed by the sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DoorState {
    Closed,
    Open,
    /// No record exists yet.
    Unknown,
}

impl DoorState {
    /// Storage representation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            DoorState::Closed => "closed",
            DoorState::Open => "open",
            DoorState::Unknown => "unknown",
        }
    }

    /// State reached when `signal` is applied in this state.
    ///
    /// Every explicit signal has a target; the absence of a signal is modelled
    /// by not calling this at all.
    #[must_use]
    pub fn on_signal(self, signal: DoorSignal) -> DoorState {
        match (self, signal) {
            (_, DoorSignal::Closed) => DoorState::Closed,
            (_, DoorSignal::Opened | DoorSignal::ForcedOpen) => DoorState::Open,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_open(self) -> bool {
        matches!(self, DoorState::Open)
    }

    #[inline]
    #[must_use]
    pub fn is_closed(self) -> bool {
        matches!(self, DoorState::Closed)
    }
}

impl fmt::Display for DoorState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DoorState {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "closed" => Ok(DoorState::Closed),
            "open" => Ok(DoorState::Open),
            "unknown" => Ok(DoorState::Unknown),
            other => Err(Error::UnknownDoorState(other.to_string())),
        }
    }
}

/// Explicit signal able to move the door state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DoorSignal {
    /// Sensor reported `doorOpened = true`.
    Opened,
    /// Sensor reported `doorClosed = true`.
    Closed,
    /// Physical opening reported by an unauthorized-access event.
    ForcedOpen,
}

impl DoorSignal {
    /// Event kind recorded when the signal carries no event name of its own.
    #[must_use]
    pub fn default_event(self) -> &'static str {
        match self {
            DoorSignal::Opened | DoorSignal::Closed => crate::constants::DEFAULT_SENSOR_EVENT,
            DoorSignal::ForcedOpen => "unauthorized_access",
        }
    }
}
