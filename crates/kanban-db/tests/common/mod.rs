// Backend-agnostic integration tests for the Database trait.
//
// Each public async function accepts `&dyn Database` so that the same logic
// can be exercised against both the SQLite and Postgres backends.

#![allow(dead_code)]

use chrono::{Duration, Utc};
use kanban_core::task::{CreateTask, Status};
use kanban_db::{connection_report, Database, DbError, TaskEdit};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn make_task(title: &str, description: Option<&str>) -> CreateTask {
    CreateTask {
        title: title.to_string(),
        description: description.map(str::to_string),
    }
}

// ---------------------------------------------------------------------------
// Task tests
// ---------------------------------------------------------------------------

/// Create, get, list, update, delete.
pub async fn test_task_crud(db: &dyn Database) {
    let t = db
        .create_task(&make_task("Write report", Some("quarterly")))
        .await
        .unwrap();
    assert!(t.id > 0);
    assert_eq!(t.title, "Write report");
    assert_eq!(t.description.as_deref(), Some("quarterly"));
    assert_eq!(t.status, Status::Todo);
    assert!(t.ai_advice.is_none());
    assert!(t.ai_advice_timestamp.is_none());

    let fetched = db.get_task(t.id).await.unwrap();
    assert_eq!(fetched.title, t.title);
    assert_eq!(fetched.created_at, t.created_at);

    let listed = db.list_tasks().await.unwrap();
    assert_eq!(listed.iter().filter(|x| x.id == t.id).count(), 1);

    let updated = db
        .update_task(
            t.id,
            &TaskEdit {
                title: "Write final report".into(),
                description: None,
                status: Some(Status::Done),
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.title, "Write final report");
    assert_eq!(updated.description, None);
    assert_eq!(updated.status, Status::Done);
    assert_eq!(updated.created_at, t.created_at);

    let deleted = db.delete_task(t.id).await.unwrap();
    assert_eq!(deleted.id, t.id);
    assert_eq!(deleted.title, "Write final report");
    assert!(matches!(db.get_task(t.id).await, Err(DbError::NotFound(_))));
}

/// Newest first, with ids breaking ties.
pub async fn test_list_order(db: &dyn Database) {
    let a = db.create_task(&make_task("a", None)).await.unwrap();
    let b = db.create_task(&make_task("b", None)).await.unwrap();
    let c = db.create_task(&make_task("c", None)).await.unwrap();

    let ids: Vec<i64> = db.list_tasks().await.unwrap().iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![c.id, b.id, a.id]);
    assert_eq!(db.count_tasks().await.unwrap(), 3);
}

/// An update with no status leaves the stored status alone.
pub async fn test_update_coalesces_status(db: &dyn Database) {
    let t = db.create_task(&make_task("t", None)).await.unwrap();
    db.set_status(t.id, Status::Doing).await.unwrap();

    let updated = db
        .update_task(
            t.id,
            &TaskEdit {
                title: "t2".into(),
                description: Some("now with notes".into()),
                status: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.status, Status::Doing);
    assert_eq!(updated.description.as_deref(), Some("now with notes"));
}

pub async fn test_set_status(db: &dyn Database) {
    let t = db.create_task(&make_task("t", None)).await.unwrap();
    for s in [Status::Doing, Status::Done, Status::Todo] {
        let updated = db.set_status(t.id, s).await.unwrap();
        assert_eq!(updated.status, s);
        assert_eq!(updated.title, "t");
    }
}

/// Missing rows surface as NotFound from every mutation.
pub async fn test_missing_rows(db: &dyn Database) {
    let edit = TaskEdit {
        title: "x".into(),
        description: None,
        status: None,
    };
    assert!(matches!(db.get_task(9999).await, Err(DbError::NotFound(_))));
    assert!(matches!(db.update_task(9999, &edit).await, Err(DbError::NotFound(_))));
    assert!(matches!(db.set_status(9999, Status::Done).await, Err(DbError::NotFound(_))));
    assert!(matches!(db.delete_task(9999).await, Err(DbError::NotFound(_))));
    assert!(matches!(
        db.set_advice(9999, "advice", Utc::now()).await,
        Err(DbError::NotFound(_))
    ));
    assert_eq!(db.count_tasks().await.unwrap(), 0);
}

/// Advice text and timestamp are written together and survive other edits.
pub async fn test_advice_persistence(db: &dyn Database) {
    let t = db.create_task(&make_task("t", Some("d"))).await.unwrap();
    let at = Utc::now();
    let with_advice = db.set_advice(t.id, "Break it down.", at).await.unwrap();
    assert_eq!(with_advice.ai_advice.as_deref(), Some("Break it down."));
    let stored_at = with_advice.ai_advice_timestamp.unwrap();
    assert!((stored_at - at).abs() < Duration::milliseconds(1));

    let moved = db.set_status(t.id, Status::Doing).await.unwrap();
    assert_eq!(moved.ai_advice.as_deref(), Some("Break it down."));

    let again = db.set_advice(t.id, "Ship it.", Utc::now()).await.unwrap();
    assert_eq!(again.ai_advice.as_deref(), Some("Ship it."));
    assert!(again.ai_advice_timestamp.unwrap() >= stored_at);
}

pub async fn test_connection_report(db: &dyn Database) {
    for i in 0..5 {
        db.create_task(&make_task(&format!("task {i}"), None))
            .await
            .unwrap();
    }
    db.health_check().await.unwrap();
    let report = connection_report(db).await.unwrap();
    assert_eq!(report.task_count, 5);
    assert_eq!(report.sample.len(), 3);
    assert_eq!(report.sample[0].title, "task 4");
}
