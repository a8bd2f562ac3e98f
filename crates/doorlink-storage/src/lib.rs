//! Storage layer for the Doorlink access-control backend.
//!
//! SQLite persistence for users, the door state record and the audit log,
//! accessed through repository traits.
//!
//! - [`Database`] - connection pool with embedded migrations
//! - [`UserRepository`], [`DoorRepository`], [`AccessLogRepository`] - data access traits
//! - [`seed`] - default users for a fresh install
//! - [`reasons`] - outcome reasons shared by the engine and the HTTP layer
//!
//! ```no_run
//! use doorlink_storage::{Database, DatabaseConfig};
//! use doorlink_storage::repositories::{SqliteUserRepository, UserRepository};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::new(DatabaseConfig::new("doorlink.db")).await?;
//! let users = SqliteUserRepository::new(db.pool().clone());
//!
//! if let Some(user) = users.find_by_code("1234").await? {
//!     println!("{} (active: {})", user.name, user.is_active);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! The audit table is append-only: triggers reject `UPDATE` and `DELETE`.

pub mod connection;
pub mod error;
pub mod models;
pub mod reasons;
pub mod repositories;
pub mod seed;

pub use connection::{Database, DatabaseConfig};
pub use error::{StorageError, StorageResult};
pub use models::{AccessLog, DoorRecord, NewUser, User, UserUpdate};
pub use reasons::AccessReasons;
pub use repositories::{
    AccessLogRepository, DoorRepository, SqliteAccessLogRepository, SqliteDoorRepository,
    SqliteUserRepository, UserRepository,
};
pub use seed::seed_default_users;
