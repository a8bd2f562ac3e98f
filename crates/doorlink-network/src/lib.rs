//! Pub/sub transport for Doorlink.
//!
//! The engine publishes through the [`Publisher`] seam and consumes
//! [`RawMessage`]s from an mpsc channel fed by the transport. Two transports
//! are provided:
//!
//! - [`MqttTransport`] - `rumqttc` client talking to the broker the door
//!   controller is attached to
//! - [`LoopbackTransport`] - in-process bus that records what was published
//!   and lets tests inject controller messages
//!
//! ```text
//!  Engine ──Publisher::publish──► transport ──► broker / recorder
//!  Engine ◄──mpsc<RawMessage>──── transport ◄── broker / inject()
//! ```
//!
//! Publishing is fire-and-forget (QoS 0). The correlation timeout upstream is
//! what guarantees progress when a message is lost.

mod error;
mod loopback;
mod mqtt;
mod publisher;

pub use error::{TransportError, TransportResult};
pub use loopback::{LoopbackTransport, PublishedMessage};
pub use mqtt::{MqttConfig, MqttTransport};
pub use publisher::{INBOUND_CHANNEL_CAPACITY, Publisher, RawMessage};
