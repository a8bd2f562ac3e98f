//! Access engine for Doorlink.
//!
//! Bridges synchronous access requests to the asynchronous door controller:
//!
//! - [`AccessEngine`] - decides on presented codes and manual openings,
//!   tracks pending requests and resolves each exactly once
//! - [`InboundRouter`] - decodes controller messages and dispatches them
//! - [`DoorTracker`] - the door state machine
//! - [`AuditLog`] - append-only audit trail with duplicate suppression
//!
//! ```text
//!  HTTP ──submit_code──► AccessEngine ──open command──► controller
//!   ▲                      │  registry                     │
//!   └──── oneshot ◄────────┤  timeout task                 │
//!                          └◄── InboundRouter ◄──ack/sensor┘
//! ```
//!
//! A pending request is resolved by the first of: failed acknowledgment,
//! sensor report naming it, unmatched close (per policy) or timeout. The
//! others find the registry entry gone and do nothing.

pub mod audit;
pub mod config;
pub mod dedup;
pub mod decision;
pub mod error;
mod events;
pub mod outcome;
pub mod registry;
pub mod router;
mod timeout;
pub mod tracker;

pub use audit::AuditLog;
pub use config::{EngineConfig, UnmatchedClosePolicy};
pub use decision::AccessEngine;
pub use error::{EngineError, EngineResult};
pub use outcome::{AccessOutcome, Decision, PendingAccess};
pub use router::{InboundRouter, spawn_router};
pub use tracker::DoorTracker;
