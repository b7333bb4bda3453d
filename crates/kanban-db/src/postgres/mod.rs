pub(crate) mod migrations;
pub mod queries;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;

use kanban_core::task::{CreateTask, Status, Task};

use crate::{Database, DbConfig, DbError, TaskEdit};

pub(crate) fn pg_err(e: sqlx::Error) -> DbError {
    DbError::Internal(e.to_string())
}

pub(crate) fn pg_not_found(id: i64) -> DbError {
    DbError::NotFound(format!("task {id}"))
}

#[derive(Clone)]
pub struct PostgresDatabase {
    pub(crate) pool: PgPool,
}

impl PostgresDatabase {
    fn pool_options() -> PgPoolOptions {
        PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(2))
            .idle_timeout(Duration::from_secs(30))
    }

    /// Connect using a full URL and run migrations.
    pub async fn connect(url: &str) -> Result<Self, DbError> {
        let pool = Self::pool_options().connect(url).await.map_err(pg_err)?;
        Self::init(pool).await
    }

    /// Connect from discrete settings, honouring `database_url` if present.
    pub async fn connect_with(config: &DbConfig) -> Result<Self, DbError> {
        if let Some(url) = &config.database_url {
            return Self::connect(url).await;
        }
        let mut opts = PgConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .database(&config.name);
        if let Some(password) = &config.password {
            opts = opts.password(password);
        }
        let pool = Self::pool_options()
            .connect_with(opts)
            .await
            .map_err(pg_err)?;
        Self::init(pool).await
    }

    async fn init(pool: PgPool) -> Result<Self, DbError> {
        migrations::run(&pool).await?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl Database for PostgresDatabase {
    async fn health_check(&self) -> Result<(), DbError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(pg_err)?;
        Ok(())
    }

    async fn server_time(&self) -> Result<DateTime<Utc>, DbError> {
        sqlx::query_scalar("SELECT NOW()")
            .fetch_one(&self.pool)
            .await
            .map_err(pg_err)
    }

    async fn list_tasks(&self) -> Result<Vec<Task>, DbError> {
        self.pg_list_tasks().await
    }
    async fn get_task(&self, id: i64) -> Result<Task, DbError> {
        self.pg_get_task(id).await
    }
    async fn count_tasks(&self) -> Result<i64, DbError> {
        self.pg_count_tasks().await
    }
    async fn create_task(&self, input: &CreateTask) -> Result<Task, DbError> {
        self.pg_create_task(input).await
    }
    async fn update_task(&self, id: i64, edit: &TaskEdit) -> Result<Task, DbError> {
        self.pg_update_task(id, edit).await
    }
    async fn set_status(&self, id: i64, status: Status) -> Result<Task, DbError> {
        self.pg_set_status(id, status).await
    }
    async fn delete_task(&self, id: i64) -> Result<Task, DbError> {
        self.pg_delete_task(id).await
    }
    async fn set_advice(
        &self,
        id: i64,
        advice: &str,
        generated_at: DateTime<Utc>,
    ) -> Result<Task, DbError> {
        self.pg_set_advice(id, advice, generated_at).await
    }
}
