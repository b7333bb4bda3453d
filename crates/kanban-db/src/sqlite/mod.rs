pub(crate) mod migrations;
pub mod queries;

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::Connection;

use kanban_core::task::{CreateTask, Status, Task};

use crate::{Database, DbConfig, DbError, TaskEdit};

/// Converts `rusqlite::Result<T>` into `Result<T, DbError>` so query code
/// can use `.to_db()?`.
pub(crate) trait SqliteResultExt<T> {
    fn to_db(self) -> Result<T, DbError>;
}

impl<T> SqliteResultExt<T> for rusqlite::Result<T> {
    fn to_db(self) -> Result<T, DbError> {
        self.map_err(map_sqlite_err)
    }
}

#[derive(Clone)]
pub struct SqliteDatabase {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteDatabase {
    pub fn open(config: &DbConfig) -> Result<Self, DbError> {
        let path = config
            .sqlite_path
            .as_deref()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("kanban.db"));
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        Self::open_path(&path)
    }

    pub fn open_path(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path).to_db()?;
        conn.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA busy_timeout=5000;",
        )
        .to_db()?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory().to_db()?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self, DbError> {
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.with_conn(migrations::run)?;
        Ok(db)
    }

    pub(crate) fn with_conn<F, T>(&self, f: F) -> Result<T, DbError>
    where
        F: FnOnce(&Connection) -> Result<T, DbError>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|_| DbError::Internal("lock poisoned".into()))?;
        f(&conn)
    }

    /// Run a synchronous query on the blocking pool.
    async fn blocking<F, T>(&self, f: F) -> Result<T, DbError>
    where
        F: FnOnce(&SqliteDatabase) -> Result<T, DbError> + Send + 'static,
        T: Send + 'static,
    {
        let db = self.clone();
        tokio::task::spawn_blocking(move || f(&db))
            .await
            .map_err(|e| DbError::Internal(e.to_string()))?
    }
}

pub(crate) fn map_sqlite_err(e: rusqlite::Error) -> DbError {
    DbError::Internal(e.to_string())
}

#[async_trait]
impl Database for SqliteDatabase {
    async fn health_check(&self) -> Result<(), DbError> {
        self.blocking(|db| {
            db.with_conn(|conn| {
                conn.query_row("SELECT 1", [], |_| Ok(())).to_db()
            })
        })
        .await
    }

    async fn server_time(&self) -> Result<DateTime<Utc>, DbError> {
        // SQLite runs in-process; its clock is ours.
        self.health_check().await?;
        Ok(Utc::now())
    }

    async fn list_tasks(&self) -> Result<Vec<Task>, DbError> {
        self.blocking(|db| db.list_tasks_sync()).await
    }

    async fn get_task(&self, id: i64) -> Result<Task, DbError> {
        self.blocking(move |db| db.get_task_sync(id)).await
    }

    async fn count_tasks(&self) -> Result<i64, DbError> {
        self.blocking(|db| db.count_tasks_sync()).await
    }

    async fn create_task(&self, input: &CreateTask) -> Result<Task, DbError> {
        let input = input.clone();
        self.blocking(move |db| db.create_task_sync(&input)).await
    }

    async fn update_task(&self, id: i64, edit: &TaskEdit) -> Result<Task, DbError> {
        let edit = edit.clone();
        self.blocking(move |db| db.update_task_sync(id, &edit)).await
    }

    async fn set_status(&self, id: i64, status: Status) -> Result<Task, DbError> {
        self.blocking(move |db| db.set_status_sync(id, status)).await
    }

    async fn delete_task(&self, id: i64) -> Result<Task, DbError> {
        self.blocking(move |db| db.delete_task_sync(id)).await
    }

    async fn set_advice(
        &self,
        id: i64,
        advice: &str,
        generated_at: DateTime<Utc>,
    ) -> Result<Task, DbError> {
        let advice = advice.to_string();
        self.blocking(move |db| db.set_advice_sync(id, &advice, generated_at))
            .await
    }
}
