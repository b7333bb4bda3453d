// Integration tests that exercise every Database trait method against the
// in-memory SQLite backend. The test logic lives in `common/mod.rs` so the
// same assertions run against Postgres.

mod common;

use std::sync::Arc;

use kanban_db::Database;

async fn make_db() -> Arc<dyn Database> {
    Arc::new(kanban_db::SqliteDatabase::open_in_memory().unwrap())
}

#[tokio::test]
async fn task_crud() {
    let db = make_db().await;
    common::test_task_crud(&*db).await;
}

#[tokio::test]
async fn list_order() {
    let db = make_db().await;
    common::test_list_order(&*db).await;
}

#[tokio::test]
async fn update_coalesces_status() {
    let db = make_db().await;
    common::test_update_coalesces_status(&*db).await;
}

#[tokio::test]
async fn set_status() {
    let db = make_db().await;
    common::test_set_status(&*db).await;
}

#[tokio::test]
async fn missing_rows() {
    let db = make_db().await;
    common::test_missing_rows(&*db).await;
}

#[tokio::test]
async fn advice_persistence() {
    let db = make_db().await;
    common::test_advice_persistence(&*db).await;
}

#[tokio::test]
async fn connection_report() {
    let db = make_db().await;
    common::test_connection_report(&*db).await;
}

#[tokio::test]
async fn open_from_config_uses_sqlite_path() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("board.db");
    let config = kanban_db::DbConfig {
        sqlite_path: Some(path.to_string_lossy().into_owned()),
        ..kanban_db::DbConfig::default()
    };
    let db = kanban_db::open(&config).await.unwrap();
    db.health_check().await.unwrap();
    assert!(path.exists());
}
