use doorlink_core::RequestId;
use doorlink_network::TransportError;
use doorlink_storage::StorageError;
use thiserror::Error;

/// Errors surfaced by the access engine.
///
/// Decision outcomes (unknown code, inactive user, door errors, timeouts) are
/// not errors; they are reported as [`crate::AccessOutcome`]s.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Invalid input such as a malformed door id
    #[error("Invalid input: {0}")]
    Invalid(#[from] doorlink_core::Error),

    /// Store unreachable or query failed
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Transport rejected a publish
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// The engine dropped a pending request without resolving it
    #[error("Request {0} was abandoned")]
    Abandoned(RequestId),

    /// A request id collided with one still in flight
    #[error("Request {0} is already pending")]
    DuplicateRequest(RequestId),
}

pub type EngineResult<T> = Result<T, EngineError>;
