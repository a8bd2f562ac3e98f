//! In-process transport.
//!
//! Behaves like a broker with a single subscriber: messages published on a
//! topic the backend subscribes to are echoed back to the inbound channel
//! (unless echo is disabled). Publishes are recorded for inspection only
//! when recording is switched on.

use crate::error::{TransportError, TransportResult};
use crate::publisher::{Publisher, RawMessage};
use bytes::Bytes;
use doorlink_protocol::{OutboundMessage, Topic};
use std::sync::Mutex;
use tokio::sync::mpsc;
use tracing::{trace, warn};

/// A message recorded by [`LoopbackTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedMessage {
    pub topic: Topic,
    pub payload: Bytes,
}

impl PublishedMessage {
    /// Payload as UTF-8 text (JSON).
    pub fn text(&self) -> &str {
        std::str::from_utf8(&self.payload).unwrap_or_default()
    }
}

/// In-memory [`Publisher`] with controller-side injection.
pub struct LoopbackTransport {
    inbound: mpsc::Sender<RawMessage>,
    published: Mutex<Vec<PublishedMessage>>,
    echo: bool,
    record: bool,
}

impl LoopbackTransport {
    /// Create a loopback bus delivering to `inbound`, echoing own publishes.
    pub fn new(inbound: mpsc::Sender<RawMessage>) -> Self {
        Self {
            inbound,
            published: Mutex::new(Vec::new()),
            echo: true,
            record: false,
        }
    }

    /// Keep every published message for [`published`](Self::published).
    pub fn recording(mut self) -> Self {
        self.record = true;
        self
    }

    /// Stop echoing own publishes back to the inbound channel.
    pub fn without_echo(mut self) -> Self {
        self.echo = false;
        self
    }

    /// Deliver a message as if the controller had published it.
    pub async fn inject(
        &self,
        topic: impl Into<String>,
        payload: impl Into<Bytes>,
    ) -> TransportResult<()> {
        self.inbound
            .send(RawMessage::new(topic, payload))
            .await
            .map_err(|_| TransportError::ChannelClosed)
    }

    /// Everything published so far, oldest first. Empty unless recording.
    pub fn published(&self) -> Vec<PublishedMessage> {
        self.published
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    /// Messages published on `topic`, oldest first.
    pub fn published_on(&self, topic: Topic) -> Vec<PublishedMessage> {
        self.published()
            .into_iter()
            .filter(|m| m.topic == topic)
            .collect()
    }
}

impl Publisher for LoopbackTransport {
    fn publish(&self, message: &OutboundMessage) -> TransportResult<()> {
        let topic = message.topic();
        let payload = Bytes::from(message.encode()?);
        trace!(topic = %topic, bytes = payload.len(), "loopback publish");

        if self.record {
            if let Ok(mut published) = self.published.lock() {
                published.push(PublishedMessage {
                    topic,
                    payload: payload.clone(),
                });
            }
        }

        if self.echo && topic.is_inbound() {
            match self.inbound.try_send(RawMessage::new(topic.as_str(), payload)) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    warn!(topic = %topic, "loopback inbound channel full, message dropped");
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    return Err(TransportError::ChannelClosed);
                }
            }
        }
        Ok(())
    }
}
