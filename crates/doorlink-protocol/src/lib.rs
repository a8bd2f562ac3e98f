//! Wire protocol between the Doorlink backend and the door controller.
//!
//! The controller speaks flat JSON objects over four pub/sub topics:
//!
//! ```text
//!  backend ──access/door/open/request──────► controller
//!  backend ◄─access/door/open/response────── controller   (acknowledgment)
//!  backend ◄─access/door/sensor/status────── controller   (door sensor)
//!  backend ◄─access/door/unauthorized──────► controller   (alerts, both ways)
//! ```
//!
//! Outbound payloads are built from typed structs ([`OpenDoorCommand`],
//! [`UnauthorizedNotice`]); inbound payloads are decoded into an
//! [`InboundMessage`]. Decoding is strict about field *types* (a sensor flag
//! must be a JSON boolean) but lenient about absent optional fields, matching
//! how the firmware omits keys it has nothing to say about.

pub mod error;
pub mod message;
pub mod payload;
pub mod topic;

pub use error::{ProtocolError, ProtocolResult};
pub use message::{InboundMessage, OutboundMessage};
pub use payload::{
    OpenAcknowledgment, OpenDoorCommand, SensorObservation, SensorStatus, UnauthorizedKind,
    UnauthorizedNotice,
};
pub use topic::Topic;
