//! Core domain types for the Doorlink access control backend.
//!
//! Everything the other crates agree on lives here: the identifiers that travel
//! across the transport ([`RequestId`], [`DoorId`]), the presented credential
//! ([`AccessCode`]), the closed audit status enumeration ([`AccessStatus`]) and
//! the door state machine vocabulary ([`DoorState`], [`DoorSignal`]).

pub mod constants;
pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::*;

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
