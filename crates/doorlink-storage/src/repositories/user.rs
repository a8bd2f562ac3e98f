#![allow(async_fn_in_trait)]

use crate::error::{StorageError, StorageResult};
use crate::models::{NewUser, User, UserUpdate};
use sqlx::SqlitePool;

const DUPLICATE_CODE: &str = "access code already in use";
const MAX_NAME_LENGTH: usize = 100;

fn validate_name(name: &str) -> StorageResult<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(StorageError::Validation("user name is empty".to_string()));
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(StorageError::Validation(format!(
            "user name must be at most {MAX_NAME_LENGTH} chars"
        )));
    }
    Ok(name)
}

/// Repository trait for User entity operations
///
/// Native async trait methods (Edition 2024), no async-trait crate.
pub trait UserRepository: Send + Sync {
    /// Find a user by ID
    async fn find_by_id(&self, id: i64) -> StorageResult<Option<User>>;

    /// Find the user owning an access code (exact match)
    async fn find_by_code(&self, code: &str) -> StorageResult<Option<User>>;

    /// All users ordered by name
    async fn find_all(&self) -> StorageResult<Vec<User>>;

    /// Create a new user; fails with `Conflict` on a duplicate code
    async fn create(&self, user: &NewUser) -> StorageResult<User>;

    /// Apply a partial update; `NotFound` if the user does not exist
    async fn update(&self, id: i64, update: &UserUpdate) -> StorageResult<User>;

    /// Delete a user; `NotFound` if the user does not exist
    async fn delete(&self, id: i64) -> StorageResult<()>;

    /// Number of users
    async fn count(&self) -> StorageResult<i64>;
}

/// SQLite implementation of UserRepository
#[derive(Debug, Clone)]
pub struct SqliteUserRepository {
    pool: SqlitePool,
}

impl SqliteUserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl UserRepository for SqliteUserRepository {
    async fn find_by_id(&self, id: i64) -> StorageResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, access_code, is_active, created_at, updated_at
            FROM users
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_code(&self, code: &str) -> StorageResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, access_code, is_active, created_at, updated_at
            FROM users
            WHERE access_code = ?
            "#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_all(&self) -> StorageResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, access_code, is_active, created_at, updated_at
            FROM users
            ORDER BY name, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    async fn create(&self, user: &NewUser) -> StorageResult<User> {
        let name = validate_name(&user.name)?;

        let created = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, access_code, is_active)
            VALUES (?, ?, ?)
            RETURNING id, name, access_code, is_active, created_at, updated_at
            "#,
        )
        .bind(name)
        .bind(user.access_code.as_str())
        .bind(user.is_active)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| StorageError::from_write(e, DUPLICATE_CODE))?;

        Ok(created)
    }

    async fn update(&self, id: i64, update: &UserUpdate) -> StorageResult<User> {
        let name = update.name.as_deref().map(validate_name).transpose()?;

        let updated = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET name        = COALESCE(?, name),
                access_code = COALESCE(?, access_code),
                is_active   = COALESCE(?, is_active),
                updated_at  = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
            WHERE id = ?
            RETURNING id, name, access_code, is_active, created_at, updated_at
            "#,
        )
        .bind(name)
        .bind(update.access_code.as_ref().map(|c| c.as_str()))
        .bind(update.is_active)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::from_write(e, DUPLICATE_CODE))?;

        updated.ok_or_else(|| StorageError::not_found("User", "id", id))
    }

    async fn delete(&self, id: i64) -> StorageResult<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::not_found("User", "id", id));
        }
        Ok(())
    }

    async fn count(&self) -> StorageResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
