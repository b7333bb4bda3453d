use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use kanban_core::advice::Advice;
use kanban_core::task::{CreateTask, StatusUpdate, Task, UpdateTask};
use kanban_core::validate;
use kanban_db::{Database, DbError, TaskEdit};
use tracing::{debug, warn};

use crate::{AdviceProvider, ServiceError, TaskService};

/// Server-side implementation: validates input, then talks to storage and
/// the advice provider directly.
pub struct LocalService {
    db: Arc<dyn Database>,
    advisor: Arc<dyn AdviceProvider>,
}

impl LocalService {
    pub fn new(db: Arc<dyn Database>, advisor: Arc<dyn AdviceProvider>) -> Self {
        Self { db, advisor }
    }

    pub fn db(&self) -> &Arc<dyn Database> {
        &self.db
    }
}

impl From<DbError> for ServiceError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::NotFound(what) => {
                debug!(%what, "no matching row");
                ServiceError::NotFound(validate::MSG_TASK_NOT_FOUND.into())
            }
            other => ServiceError::Internal(other.to_string()),
        }
    }
}

#[async_trait]
impl TaskService for LocalService {
    async fn health(&self) -> Result<(), ServiceError> {
        Ok(self.db.health_check().await?)
    }

    async fn list_tasks(&self) -> Result<Vec<Task>, ServiceError> {
        Ok(self.db.list_tasks().await?)
    }

    async fn create_task(&self, input: &CreateTask) -> Result<Task, ServiceError> {
        let clean = CreateTask {
            title: validate::normalize_title(&input.title)?,
            description: validate::normalize_description(input.description.as_deref())?,
        };
        Ok(self.db.create_task(&clean).await?)
    }

    async fn update_task(&self, id: &str, update: &UpdateTask) -> Result<Task, ServiceError> {
        let id = validate::parse_task_id(id)?;
        let edit = TaskEdit {
            title: validate::normalize_title(&update.title)?,
            description: validate::normalize_description(update.description.as_deref())?,
            status: validate::parse_optional_status(update.status.as_deref())?,
        };
        Ok(self.db.update_task(id, &edit).await?)
    }

    async fn delete_task(&self, id: &str) -> Result<Task, ServiceError> {
        let id = validate::parse_task_id(id)?;
        Ok(self.db.delete_task(id).await?)
    }

    async fn set_status(&self, id: &str, update: &StatusUpdate) -> Result<Task, ServiceError> {
        let id = validate::parse_task_id(id)?;
        let status = validate::parse_required_status(update.status.as_deref())?;
        Ok(self.db.set_status(id, status).await?)
    }

    async fn generate_advice(&self, id: &str) -> Result<Advice, ServiceError> {
        let id = validate::parse_task_id(id)?;
        // The provider is never called for a task that does not exist.
        let task = self.db.get_task(id).await?;

        let advice = self
            .advisor
            .generate(&task.title, task.description.as_deref())
            .await
            .map_err(|e| {
                warn!(task_id = id, kind = ?e.kind, detail = %e.detail, "advice generation failed");
                ServiceError::Unavailable(e.to_string())
            })?;

        let generated_at = Utc::now();
        let stored = self.db.set_advice(id, &advice, generated_at).await?;
        Ok(Advice {
            task_id: stored.id,
            advice,
            generated_at: stored.ai_advice_timestamp.unwrap_or(generated_at),
        })
    }
}
