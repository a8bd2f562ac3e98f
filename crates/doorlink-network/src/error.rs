use doorlink_protocol::ProtocolError;
use thiserror::Error;

/// Errors that can occur while talking to the broker
#[derive(Debug, Error)]
pub enum TransportError {
    /// Broker URL could not be understood
    #[error("Invalid broker URL: {0}")]
    InvalidUrl(String),

    /// MQTT client request queue rejected the request
    #[error("MQTT client error: {0}")]
    Client(#[from] rumqttc::ClientError),

    /// Outbound payload could not be encoded
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Inbound consumer has gone away
    #[error("Inbound channel closed")]
    ChannelClosed,
}

pub type TransportResult<T> = Result<T, TransportError>;
