use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // Identifier errors
    #[error("Invalid access code: {0}")]
    InvalidAccessCode(String),

    #[error("Invalid door id: {0}")]
    InvalidDoorId(String),

    #[error("Invalid request id: {0}")]
    InvalidRequestId(String),

    // Enumeration decoding errors
    #[error("Unknown access status: {0}")]
    UnknownStatus(String),

    #[error("Unknown door state: {0}")]
    UnknownDoorState(String),

    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
