pub mod access_log;
pub mod door;
pub mod user;

pub use access_log::AccessLog;
pub use door::DoorRecord;
pub use user::{NewUser, User, UserUpdate};
