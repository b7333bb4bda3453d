#[cfg(feature = "postgres")]
pub mod postgres;
#[cfg(feature = "sqlite")]
pub mod sqlite;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use kanban_core::task::{CreateTask, Status, Task};

#[cfg(feature = "postgres")]
pub use postgres::PostgresDatabase;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("database error: {0}")]
    Internal(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Already-validated replacement values for a full task update.
///
/// `status: None` keeps whatever status is stored.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskEdit {
    pub title: String,
    pub description: Option<String>,
    pub status: Option<Status>,
}

/// Storage abstraction over the `tasks` table.
///
/// Every mutation is a single statement that both locates and writes the
/// row, so a concurrent delete surfaces as `NotFound` rather than a stale
/// success.
#[async_trait]
pub trait Database: Send + Sync {
    async fn health_check(&self) -> Result<(), DbError>;
    async fn server_time(&self) -> Result<DateTime<Utc>, DbError>;

    /// All tasks, newest first.
    async fn list_tasks(&self) -> Result<Vec<Task>, DbError>;
    async fn get_task(&self, id: i64) -> Result<Task, DbError>;
    async fn count_tasks(&self) -> Result<i64, DbError>;

    /// Insert with status `todo`. Input must already be normalized.
    async fn create_task(&self, input: &CreateTask) -> Result<Task, DbError>;
    async fn update_task(&self, id: i64, edit: &TaskEdit) -> Result<Task, DbError>;
    async fn set_status(&self, id: i64, status: Status) -> Result<Task, DbError>;
    /// Remove the row and return its last state.
    async fn delete_task(&self, id: i64) -> Result<Task, DbError>;
    /// Write the advice text and its timestamp together.
    async fn set_advice(
        &self,
        id: i64,
        advice: &str,
        generated_at: DateTime<Utc>,
    ) -> Result<Task, DbError>;
}

/// Connection settings, resolved from the environment.
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: Option<String>,
    pub name: String,
    /// Full connection URL; overrides the discrete fields when set.
    pub database_url: Option<String>,
    pub sqlite_path: Option<String>,
    /// Use Postgres when the crate is built with it.
    pub use_postgres: bool,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            host: "localhost".into(),
            port: 5432,
            user: "postgres".into(),
            password: None,
            name: "kanban_board".into(),
            database_url: None,
            sqlite_path: None,
            use_postgres: false,
        }
    }
}

impl DbConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let var = |k: &str| std::env::var(k).ok().filter(|v| !v.is_empty());
        let database_url = var("DATABASE_URL");
        let host = var("DB_HOST");
        Self {
            use_postgres: database_url.is_some() || host.is_some(),
            host: host.unwrap_or(defaults.host),
            port: var("DB_PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            user: var("DB_USER").unwrap_or(defaults.user),
            password: var("DB_PASSWORD"),
            name: var("DB_NAME").unwrap_or(defaults.name),
            database_url,
            sqlite_path: var("KANBAN_DB_PATH"),
        }
    }

    /// Human-readable target with the password elided, for logs.
    pub fn describe(&self) -> String {
        if !self.use_postgres || !cfg!(feature = "postgres") {
            return format!(
                "sqlite:{}",
                self.sqlite_path.as_deref().unwrap_or("kanban.db")
            );
        }
        match &self.database_url {
            Some(_) => "postgres (DATABASE_URL)".to_string(),
            None => format!(
                "postgres://{}@{}:{}/{}",
                self.user, self.host, self.port, self.name
            ),
        }
    }
}

/// Open whichever backend the configuration and enabled features select.
pub async fn open(config: &DbConfig) -> Result<Arc<dyn Database>, DbError> {
    #[cfg(feature = "postgres")]
    {
        if config.use_postgres {
            tracing::info!(db = %config.describe(), "connecting to postgres");
            return Ok(Arc::new(PostgresDatabase::connect_with(config).await?));
        }
    }
    open_sqlite(config).await
}

#[cfg(feature = "sqlite")]
async fn open_sqlite(config: &DbConfig) -> Result<Arc<dyn Database>, DbError> {
    tracing::info!(db = %config.describe(), "opening sqlite database");
    let config = config.clone();
    let db = tokio::task::spawn_blocking(move || SqliteDatabase::open(&config))
        .await
        .map_err(|e| DbError::Internal(e.to_string()))??;
    Ok(Arc::new(db))
}

#[cfg(not(feature = "sqlite"))]
async fn open_sqlite(_config: &DbConfig) -> Result<Arc<dyn Database>, DbError> {
    Err(DbError::Internal("sqlite backend not enabled".into()))
}

/// Snapshot printed by the connectivity check command.
#[derive(Debug, Clone)]
pub struct ConnectionReport {
    pub server_time: DateTime<Utc>,
    pub task_count: i64,
    pub sample: Vec<Task>,
}

pub async fn connection_report(db: &dyn Database) -> Result<ConnectionReport, DbError> {
    let server_time = db.server_time().await?;
    let task_count = db.count_tasks().await?;
    let mut sample = db.list_tasks().await?;
    sample.truncate(3);
    Ok(ConnectionReport {
        server_time,
        task_count,
        sample,
    })
}
