pub mod advice;
pub mod envelope;
pub mod error;
pub mod task;
pub mod validate;

pub use advice::Advice;
pub use envelope::ApiResponse;
pub use error::KanbanError;
pub use task::{CreateTask, Status, StatusUpdate, Task, UpdateTask};
