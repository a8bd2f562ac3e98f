use thiserror::Error;

/// Errors raised while encoding or decoding transport payloads.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Message arrived on a topic the backend does not handle
    #[error("Unknown topic: {0}")]
    UnknownTopic(String),

    /// Topic is valid but only ever published by the backend
    #[error("Topic {0} is outbound only")]
    OutboundTopic(String),

    /// Payload is not valid JSON or has fields of the wrong type
    #[error("Malformed payload on {topic}: {source}")]
    MalformedPayload {
        topic: String,
        #[source]
        source: serde_json::Error,
    },

    /// Payload could not be serialized
    #[error("Failed to encode payload: {0}")]
    Encode(#[from] serde_json::Error),
}

pub type ProtocolResult<T> = Result<T, ProtocolError>;
