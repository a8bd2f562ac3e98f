//! Integration tests for the SQLite store
//!
//! Run with: cargo test --package doorlink-storage --test integration_database

use doorlink_core::{AccessCode, AccessStatus, DoorState};
use doorlink_storage::{
    AccessLog, AccessLogRepository, Database, DatabaseConfig, DoorRecord, DoorRepository, NewUser,
    SqliteAccessLogRepository, SqliteDoorRepository, SqliteUserRepository, UserRepository,
    seed_default_users,
};
use std::sync::Arc;
use tokio::sync::Barrier;

#[tokio::test]
async fn test_file_database_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("doorlink.db");
    let path = path.to_string_lossy().to_string();

    let db = Database::new(DatabaseConfig::new(&path)).await.unwrap();
    seed_default_users(&db).await.unwrap();
    SqliteDoorRepository::new(db.pool().clone())
        .upsert(&DoorRecord::new("Puerta Principal", DoorState::Open, "door_opened"))
        .await
        .unwrap();
    db.close().await;

    let db = Database::new(DatabaseConfig::new(&path)).await.unwrap();
    let users = SqliteUserRepository::new(db.pool().clone());
    assert_eq!(users.count().await.unwrap(), 3);

    let door = SqliteDoorRepository::new(db.pool().clone())
        .find("Puerta Principal")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(door.state, DoorState::Open);
    db.close().await;
}

#[tokio::test]
async fn test_migration_idempotency() {
    let db = Database::in_memory().await.unwrap();

    db.migrate().await.unwrap();
    db.migrate().await.unwrap();

    let result: (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name IN ('users', 'doors', 'access_logs')",
    )
    .fetch_one(db.pool())
    .await
    .unwrap();

    assert_eq!(result.0, 3);
    db.close().await;
}

#[tokio::test]
async fn test_concurrent_log_appends() {
    let db = Database::in_memory().await.unwrap();

    const NUM_CONCURRENT_TASKS: usize = 10;
    let barrier = Arc::new(Barrier::new(NUM_CONCURRENT_TASKS));

    let mut handles = vec![];
    for i in 0..NUM_CONCURRENT_TASKS {
        let repo = SqliteAccessLogRepository::new(db.pool().clone());
        let barrier = barrier.clone();

        handles.push(tokio::spawn(async move {
            barrier.wait().await;
            let log = AccessLog::new("Puerta Principal", AccessStatus::InvalidCode, None)
                .with_code(format!("{i:04}"));
            repo.create(&log).await.unwrap()
        }));
    }

    let ids: Vec<i64> = futures::future::join_all(handles)
        .await
        .into_iter()
        .map(Result::unwrap)
        .collect();
    assert_eq!(ids.len(), NUM_CONCURRENT_TASKS);

    let repo = SqliteAccessLogRepository::new(db.pool().clone());
    assert_eq!(
        repo.count_by_status(AccessStatus::InvalidCode).await.unwrap(),
        NUM_CONCURRENT_TASKS as i64
    );
    db.close().await;
}

#[tokio::test]
async fn test_user_lifecycle() {
    let db = Database::in_memory().await.unwrap();
    let users = SqliteUserRepository::new(db.pool().clone());

    let created = users
        .create(&NewUser::new("Guest", AccessCode::new("4321").unwrap()).active(false))
        .await
        .unwrap();
    assert!(!created.is_active);

    let all = users.find_all().await.unwrap();
    assert_eq!(all.len(), 1);

    users.delete(created.id).await.unwrap();
    assert!(users.find_by_code("4321").await.unwrap().is_none());
    db.close().await;
}
