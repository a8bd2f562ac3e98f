//! HTTP surface and process lifecycle for Doorlink.
//!
//! - [`config::Settings`] - flags and environment variables
//! - [`routes::build_router`] - the axum router over [`state::AppState`]
//! - [`app::run`] - startup order, serving and graceful shutdown

pub mod app;
pub mod config;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod routes;
pub mod state;

pub use config::Settings;
pub use error::{ApiError, ApiResult};
pub use routes::build_router;
pub use state::AppState;
