pub mod access_log;
pub mod door;
pub mod user;

pub use access_log::{AccessLogRepository, SqliteAccessLogRepository};
pub use door::{DoorRepository, SqliteDoorRepository};
pub use user::{SqliteUserRepository, UserRepository};
