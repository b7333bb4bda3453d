use chrono::{DateTime, Utc};
use rusqlite::{params, Row};

use kanban_core::task::{CreateTask, Status, Task};

use super::super::{SqliteDatabase, SqliteResultExt};
use crate::{DbError, TaskEdit};

fn row_to_task(row: &Row) -> rusqlite::Result<Task> {
    let status_str: String = row.get("status")?;
    Ok(Task {
        id: row.get("id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        status: Status::parse_str(&status_str).unwrap_or(Status::Todo),
        created_at: row.get("created_at")?,
        ai_advice: row.get("ai_advice")?,
        ai_advice_timestamp: row.get("ai_advice_timestamp")?,
    })
}

/// Map "no row" to `NotFound` for the given id.
fn not_found_for(id: i64) -> impl FnOnce(rusqlite::Error) -> DbError {
    move |e| match e {
        rusqlite::Error::QueryReturnedNoRows => DbError::NotFound(format!("task {id}")),
        other => DbError::Internal(other.to_string()),
    }
}

impl SqliteDatabase {
    pub fn create_task_sync(&self, input: &CreateTask) -> Result<Task, DbError> {
        self.with_conn(|conn| {
            conn.query_row(
                "INSERT INTO tasks (title, description, status, created_at)
                 VALUES (?1, ?2, 'todo', ?3)
                 RETURNING *",
                params![input.title, input.description, Utc::now()],
                row_to_task,
            )
            .to_db()
        })
    }

    pub fn get_task_sync(&self, id: i64) -> Result<Task, DbError> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT * FROM tasks WHERE id = ?1",
                params![id],
                row_to_task,
            )
            .map_err(not_found_for(id))
        })
    }

    pub fn list_tasks_sync(&self) -> Result<Vec<Task>, DbError> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare("SELECT * FROM tasks ORDER BY created_at DESC, id DESC")
                .to_db()?;
            let rows = stmt.query_map([], row_to_task).to_db()?;
            rows.collect::<rusqlite::Result<Vec<_>>>().to_db()
        })
    }

    pub fn count_tasks_sync(&self) -> Result<i64, DbError> {
        self.with_conn(|conn| {
            conn.query_row("SELECT count(*) FROM tasks", [], |row| row.get(0))
                .to_db()
        })
    }

    pub fn update_task_sync(&self, id: i64, edit: &TaskEdit) -> Result<Task, DbError> {
        self.with_conn(|conn| {
            conn.query_row(
                "UPDATE tasks
                 SET title = ?1, description = ?2, status = COALESCE(?3, status)
                 WHERE id = ?4
                 RETURNING *",
                params![
                    edit.title,
                    edit.description,
                    edit.status.map(|s| s.as_str()),
                    id
                ],
                row_to_task,
            )
            .map_err(not_found_for(id))
        })
    }

    pub fn set_status_sync(&self, id: i64, status: Status) -> Result<Task, DbError> {
        self.with_conn(|conn| {
            conn.query_row(
                "UPDATE tasks SET status = ?1 WHERE id = ?2 RETURNING *",
                params![status.as_str(), id],
                row_to_task,
            )
            .map_err(not_found_for(id))
        })
    }

    pub fn delete_task_sync(&self, id: i64) -> Result<Task, DbError> {
        self.with_conn(|conn| {
            conn.query_row(
                "DELETE FROM tasks WHERE id = ?1 RETURNING *",
                params![id],
                row_to_task,
            )
            .map_err(not_found_for(id))
        })
    }

    pub fn set_advice_sync(
        &self,
        id: i64,
        advice: &str,
        generated_at: DateTime<Utc>,
    ) -> Result<Task, DbError> {
        self.with_conn(|conn| {
            conn.query_row(
                "UPDATE tasks SET ai_advice = ?1, ai_advice_timestamp = ?2
                 WHERE id = ?3
                 RETURNING *",
                params![advice, generated_at, id],
                row_to_task,
            )
            .map_err(not_found_for(id))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> SqliteDatabase {
        SqliteDatabase::open_in_memory().unwrap()
    }

    fn create(db: &SqliteDatabase, title: &str) -> Task {
        db.create_task_sync(&CreateTask {
            title: title.into(),
            description: None,
        })
        .unwrap()
    }

    #[test]
    fn create_assigns_id_and_todo() {
        let db = setup();
        let a = create(&db, "first");
        let b = create(&db, "second");
        assert!(b.id > a.id);
        assert_eq!(a.status, Status::Todo);
        assert!(a.ai_advice.is_none());
    }

    #[test]
    fn list_is_newest_first() {
        let db = setup();
        create(&db, "one");
        create(&db, "two");
        create(&db, "three");
        let titles: Vec<_> = db
            .list_tasks_sync()
            .unwrap()
            .into_iter()
            .map(|t| t.title)
            .collect();
        assert_eq!(titles, vec!["three", "two", "one"]);
    }

    #[test]
    fn update_without_status_keeps_status() {
        let db = setup();
        let t = create(&db, "t");
        db.set_status_sync(t.id, Status::Doing).unwrap();
        let updated = db
            .update_task_sync(
                t.id,
                &TaskEdit {
                    title: "renamed".into(),
                    description: Some("d".into()),
                    status: None,
                },
            )
            .unwrap();
        assert_eq!(updated.title, "renamed");
        assert_eq!(updated.description.as_deref(), Some("d"));
        assert_eq!(updated.status, Status::Doing);
    }

    #[test]
    fn mutations_on_missing_rows_are_not_found() {
        let db = setup();
        assert!(matches!(
            db.set_status_sync(999, Status::Done),
            Err(DbError::NotFound(_))
        ));
        assert!(matches!(db.delete_task_sync(999), Err(DbError::NotFound(_))));
        assert!(matches!(
            db.set_advice_sync(999, "x", Utc::now()),
            Err(DbError::NotFound(_))
        ));
        assert!(matches!(db.get_task_sync(999), Err(DbError::NotFound(_))));
    }

    #[test]
    fn delete_returns_snapshot() {
        let db = setup();
        let t = create(&db, "gone");
        let deleted = db.delete_task_sync(t.id).unwrap();
        assert_eq!(deleted, t);
        assert_eq!(db.count_tasks_sync().unwrap(), 0);
    }

    #[test]
    fn advice_sets_both_fields() {
        let db = setup();
        let t = create(&db, "t");
        let at = Utc::now();
        let updated = db.set_advice_sync(t.id, "watch the deadline", at).unwrap();
        assert_eq!(updated.ai_advice.as_deref(), Some("watch the deadline"));
        assert_eq!(updated.ai_advice_timestamp, Some(at));
    }
}
