use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Result of `POST /api/tasks/{id}/advice`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Advice {
    pub task_id: i64,
    pub advice: String,
    pub generated_at: DateTime<Utc>,
}
