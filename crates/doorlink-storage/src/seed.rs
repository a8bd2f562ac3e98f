use crate::connection::Database;
use crate::error::StorageResult;
use crate::models::NewUser;
use crate::repositories::{SqliteUserRepository, UserRepository};
use doorlink_core::AccessCode;

/// Users created on first start: (name, code, active).
pub const DEFAULT_USERS: [(&str, &str, bool); 3] = [
    ("Admin", "1234", true),
    ("Usuario1", "5678", true),
    ("Usuario2", "9999", false),
];

/// Insert [`DEFAULT_USERS`] when the users table is empty.
///
/// Returns the number of users created.
pub async fn seed_default_users(db: &Database) -> StorageResult<usize> {
    let repo = SqliteUserRepository::new(db.pool().clone());
    if repo.count().await? > 0 {
        return Ok(0);
    }

    for (name, code, active) in DEFAULT_USERS {
        repo.create(&NewUser::new(name, AccessCode::new(code)?).active(active))
            .await?;
    }

    tracing::info!(count = DEFAULT_USERS.len(), "seeded default users");
    Ok(DEFAULT_USERS.len())
}
