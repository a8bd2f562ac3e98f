//! Constants shared by the Doorlink crates.
//!
//! The values here mirror the behavior of the deployed door controller
//! firmware: it addresses a single door by name, expects request ids with a
//! recognisable prefix, and answers (when it answers at all) well within ten
//! seconds.

// ============================================================================
// Door identity
// ============================================================================

/// Identity of the single door managed by a deployment.
pub const DEFAULT_DOOR_ID: &str = "Puerta Principal";

/// Maximum length of a door identifier.
pub const MAX_DOOR_ID_LENGTH: usize = 64;

/// Event kind recorded when the door record is created at startup.
pub const DOOR_INITIALIZED_EVENT: &str = "initialized";

/// Event kind recorded when a sensor update arrives without an event name.
pub const DEFAULT_SENSOR_EVENT: &str = "status_update";

// ============================================================================
// Credentials and subjects
// ============================================================================

/// Maximum length of a presented access code.
pub const MAX_ACCESS_CODE_LENGTH: usize = 64;

/// Code recorded in the audit log for manual openings.
pub const MANUAL_ACCESS_CODE: &str = "MANUAL";

/// Subject id used for manual openings triggered from the dashboard.
pub const ADMIN_SUBJECT_ID: &str = "admin";

/// Display name used when a manual opening does not name its operator.
pub const DEFAULT_ADMIN_NAME: &str = "Administrador";

// ============================================================================
// Request correlation
// ============================================================================

/// Prefix of request ids created for code access.
pub const REQUEST_ID_PREFIX: &str = "req";

/// Prefix of request ids created for manual openings.
pub const MANUAL_REQUEST_ID_PREFIX: &str = "req_manual";

/// Number of random base-36 characters appended to a request id.
pub const REQUEST_ID_SUFFIX_LENGTH: usize = 9;

/// Maximum accepted length for an inbound request id.
pub const MAX_REQUEST_ID_LENGTH: usize = 128;

// ============================================================================
// Timing
// ============================================================================

/// Time the backend waits for the controller before resolving a request as
/// timed out, in milliseconds.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

/// Trailing window during which identical audit entries are suppressed, in
/// milliseconds.
pub const DEFAULT_DEDUP_WINDOW_MS: u64 = 3_000;

/// Resolution of the dedup fingerprint time bucket, in milliseconds.
pub const DEFAULT_DEDUP_BUCKET_MS: u64 = 1_000;
