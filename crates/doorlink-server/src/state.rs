use doorlink_engine::AccessEngine;
use doorlink_storage::{Database, SqliteUserRepository};
use std::sync::Arc;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<AccessEngine>,
    pub users: SqliteUserRepository,
    pub db: Database,
}

impl AppState {
    pub fn new(engine: Arc<AccessEngine>, db: Database) -> Self {
        Self {
            users: SqliteUserRepository::new(db.pool().clone()),
            engine,
            db,
        }
    }
}
