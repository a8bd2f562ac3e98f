pub mod access;
pub mod doors;
pub mod health;
pub mod users;
