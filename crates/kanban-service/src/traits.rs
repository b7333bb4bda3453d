use async_trait::async_trait;
use kanban_core::advice::Advice;
use kanban_core::task::{CreateTask, StatusUpdate, Task, UpdateTask};
use kanban_core::KanbanError;
use thiserror::Error;

/// Errors carry the user-facing message as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    InvalidInput(String),

    /// An upstream dependency (the advice provider) failed.
    #[error("{0}")]
    Unavailable(String),

    #[error("{0}")]
    Internal(String),
}

impl ServiceError {
    pub fn status_code(&self) -> u16 {
        self.kind().http_status()
    }

    pub fn message(&self) -> &str {
        match self {
            ServiceError::NotFound(m)
            | ServiceError::InvalidInput(m)
            | ServiceError::Unavailable(m)
            | ServiceError::Internal(m) => m,
        }
    }

    /// Tagged form shared with the wire taxonomy.
    pub fn kind(&self) -> KanbanError {
        match self {
            ServiceError::NotFound(m) => KanbanError::NotFound(m.clone()),
            ServiceError::InvalidInput(m) => KanbanError::Validation(m.clone()),
            ServiceError::Unavailable(m) => KanbanError::Provider(m.clone()),
            ServiceError::Internal(m) => KanbanError::Storage(m.clone()),
        }
    }
}

impl From<KanbanError> for ServiceError {
    fn from(e: KanbanError) -> Self {
        match e {
            KanbanError::Validation(m) => ServiceError::InvalidInput(m),
            KanbanError::NotFound(m) => ServiceError::NotFound(m),
            KanbanError::Provider(m) => ServiceError::Unavailable(m),
            KanbanError::Storage(m) => ServiceError::Internal(m),
        }
    }
}

/// Abstraction over the board's task operations.
///
/// The server routes program against `LocalService`; the terminal client
/// talks to a running server through `HttpService`. Ids are taken as raw
/// path segments so both sides reject malformed ids the same way.
#[async_trait]
pub trait TaskService: Send + Sync {
    async fn health(&self) -> Result<(), ServiceError>;

    async fn list_tasks(&self) -> Result<Vec<Task>, ServiceError>;
    async fn create_task(&self, input: &CreateTask) -> Result<Task, ServiceError>;
    async fn update_task(&self, id: &str, update: &UpdateTask) -> Result<Task, ServiceError>;
    /// Returns the deleted task's last state.
    async fn delete_task(&self, id: &str) -> Result<Task, ServiceError>;
    async fn set_status(&self, id: &str, update: &StatusUpdate) -> Result<Task, ServiceError>;
    async fn generate_advice(&self, id: &str) -> Result<Advice, ServiceError>;
}
