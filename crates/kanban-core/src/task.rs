use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Todo,
    Doing,
    Done,
}

impl Status {
    /// Column order on the board.
    pub const ALL: &[Status] = &[Status::Todo, Status::Doing, Status::Done];

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Todo => "todo",
            Status::Doing => "doing",
            Status::Done => "done",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Status::Todo => "To Do",
            Status::Doing => "Doing",
            Status::Done => "Done",
        }
    }

    pub fn parse_str(s: &str) -> Option<Self> {
        match s {
            "todo" => Some(Status::Todo),
            "doing" => Some(Status::Doing),
            "done" => Some(Status::Done),
            _ => None,
        }
    }

    /// Next state in the fixed todo -> doing -> done -> todo cycle.
    pub fn next(&self) -> Status {
        match self {
            Status::Todo => Status::Doing,
            Status::Doing => Status::Done,
            Status::Done => Status::Todo,
        }
    }

    /// Label for the action that moves a task out of this status.
    pub fn action_label(&self) -> &'static str {
        match self {
            Status::Todo => "Start",
            Status::Doing => "Complete",
            Status::Done => "Restart",
        }
    }

    pub fn index(&self) -> usize {
        match self {
            Status::Todo => 0,
            Status::Doing => 1,
            Status::Done => 2,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub status: Status,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub ai_advice: Option<String>,
    #[serde(default)]
    pub ai_advice_timestamp: Option<DateTime<Utc>>,
}

/// A `null` title reads as empty so it fails the required-title check.
fn null_as_empty<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(d)?.unwrap_or_default())
}

/// Body of `POST /api/tasks`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateTask {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Body of `PUT /api/tasks/{id}`.
///
/// `status` stays a raw string on the wire so an unknown value is reported
/// as a validation failure instead of a body parse error. `None` leaves the
/// stored status untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTask {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl UpdateTask {
    pub fn fields(title: impl Into<String>, description: Option<String>) -> Self {
        Self {
            title: title.into(),
            description,
            status: None,
        }
    }

    pub fn with_status(mut self, status: Status) -> Self {
        self.status = Some(status.as_str().to_string());
        self
    }
}

/// Body of `PATCH /api/tasks/{id}/status`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusUpdate {
    #[serde(default)]
    pub status: Option<String>,
}

impl From<Status> for StatusUpdate {
    fn from(status: Status) -> Self {
        Self {
            status: Some(status.as_str().to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parse_str_round_trip() {
        for s in Status::ALL {
            assert_eq!(Status::parse_str(s.as_str()), Some(*s));
        }
        assert_eq!(Status::parse_str("bogus"), None);
        assert_eq!(Status::parse_str("Todo"), None);
        assert_eq!(Status::parse_str(""), None);
    }

    #[test]
    fn status_cycle_and_labels() {
        assert_eq!(Status::Todo.next(), Status::Doing);
        assert_eq!(Status::Doing.next(), Status::Done);
        assert_eq!(Status::Done.next(), Status::Todo);
        assert_eq!(Status::Todo.action_label(), "Start");
        assert_eq!(Status::Doing.action_label(), "Complete");
        assert_eq!(Status::Done.action_label(), "Restart");
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Status::Doing).unwrap(), "\"doing\"");
        let s: Status = serde_json::from_str("\"done\"").unwrap();
        assert_eq!(s, Status::Done);
    }

    #[test]
    fn task_deserializes_without_advice_fields() {
        let json = r#"{"id":1,"title":"Write report","description":null,"status":"todo","created_at":"2024-01-01T00:00:00Z"}"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.id, 1);
        assert_eq!(task.description, None);
        assert!(task.ai_advice.is_none());
        assert!(task.ai_advice_timestamp.is_none());
    }

    #[test]
    fn update_task_omits_missing_status() {
        let body = serde_json::to_value(UpdateTask::fields("t", None)).unwrap();
        assert!(body.get("status").is_none());
        let body = serde_json::to_value(UpdateTask::fields("t", None).with_status(Status::Done)).unwrap();
        assert_eq!(body["status"], "done");
    }

    #[test]
    fn null_title_reads_as_empty() {
        let body: CreateTask = serde_json::from_str(r#"{"title":null}"#).unwrap();
        assert_eq!(body.title, "");
        let body: UpdateTask = serde_json::from_str(r#"{"title":null,"status":"done"}"#).unwrap();
        assert_eq!(body.title, "");
        assert_eq!(body.status.as_deref(), Some("done"));
    }
}
