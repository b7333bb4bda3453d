use chrono::{DateTime, Utc};

use kanban_core::task::{CreateTask, Status, Task};

use super::super::{pg_err, pg_not_found, PostgresDatabase};
use crate::{DbError, TaskEdit};

#[derive(sqlx::FromRow)]
struct TaskRow {
    id: i64,
    title: String,
    description: Option<String>,
    status: String,
    created_at: DateTime<Utc>,
    ai_advice: Option<String>,
    ai_advice_timestamp: Option<DateTime<Utc>>,
}

impl From<TaskRow> for Task {
    fn from(r: TaskRow) -> Self {
        Task {
            id: r.id,
            title: r.title,
            description: r.description,
            status: Status::parse_str(&r.status).unwrap_or(Status::Todo),
            created_at: r.created_at,
            ai_advice: r.ai_advice,
            ai_advice_timestamp: r.ai_advice_timestamp,
        }
    }
}

fn found(row: Option<TaskRow>, id: i64) -> Result<Task, DbError> {
    row.map(Task::from).ok_or_else(|| pg_not_found(id))
}

impl PostgresDatabase {
    pub(crate) async fn pg_create_task(&self, input: &CreateTask) -> Result<Task, DbError> {
        let row = sqlx::query_as::<_, TaskRow>(
            "INSERT INTO tasks (title, description) VALUES ($1, $2) RETURNING *",
        )
        .bind(&input.title)
        .bind(&input.description)
        .fetch_one(&self.pool)
        .await
        .map_err(pg_err)?;
        Ok(row.into())
    }

    pub(crate) async fn pg_get_task(&self, id: i64) -> Result<Task, DbError> {
        let row = sqlx::query_as::<_, TaskRow>("SELECT * FROM tasks WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(pg_err)?;
        found(row, id)
    }

    pub(crate) async fn pg_list_tasks(&self) -> Result<Vec<Task>, DbError> {
        let rows = sqlx::query_as::<_, TaskRow>(
            "SELECT * FROM tasks ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(pg_err)?;
        Ok(rows.into_iter().map(Task::from).collect())
    }

    pub(crate) async fn pg_count_tasks(&self) -> Result<i64, DbError> {
        sqlx::query_scalar("SELECT count(*) FROM tasks")
            .fetch_one(&self.pool)
            .await
            .map_err(pg_err)
    }

    pub(crate) async fn pg_update_task(&self, id: i64, edit: &TaskEdit) -> Result<Task, DbError> {
        let row = sqlx::query_as::<_, TaskRow>(
            "UPDATE tasks
             SET title = $1, description = $2, status = COALESCE($3, status)
             WHERE id = $4
             RETURNING *",
        )
        .bind(&edit.title)
        .bind(&edit.description)
        .bind(edit.status.map(|s| s.as_str()))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(pg_err)?;
        found(row, id)
    }

    pub(crate) async fn pg_set_status(&self, id: i64, status: Status) -> Result<Task, DbError> {
        let row = sqlx::query_as::<_, TaskRow>(
            "UPDATE tasks SET status = $1 WHERE id = $2 RETURNING *",
        )
        .bind(status.as_str())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(pg_err)?;
        found(row, id)
    }

    pub(crate) async fn pg_delete_task(&self, id: i64) -> Result<Task, DbError> {
        let row = sqlx::query_as::<_, TaskRow>("DELETE FROM tasks WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(pg_err)?;
        found(row, id)
    }

    pub(crate) async fn pg_set_advice(
        &self,
        id: i64,
        advice: &str,
        generated_at: DateTime<Utc>,
    ) -> Result<Task, DbError> {
        let row = sqlx::query_as::<_, TaskRow>(
            "UPDATE tasks SET ai_advice = $1, ai_advice_timestamp = $2
             WHERE id = $3
             RETURNING *",
        )
        .bind(advice)
        .bind(generated_at)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(pg_err)?;
        found(row, id)
    }
}
