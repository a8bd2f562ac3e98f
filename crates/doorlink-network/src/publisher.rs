use crate::error::TransportResult;
use bytes::Bytes;
use doorlink_protocol::OutboundMessage;

/// Capacity of the channel carrying inbound messages to the router.
pub const INBOUND_CHANNEL_CAPACITY: usize = 256;

/// A message as received from the broker, before decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMessage {
    pub topic: String,
    pub payload: Bytes,
}

impl RawMessage {
    pub fn new(topic: impl Into<String>, payload: impl Into<Bytes>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
        }
    }
}

/// Outbound side of a transport.
///
/// `publish` only enqueues; it never waits for delivery. Implementations must
/// be cheap to call from request handlers.
pub trait Publisher: Send + Sync {
    fn publish(&self, message: &OutboundMessage) -> TransportResult<()>;
}
