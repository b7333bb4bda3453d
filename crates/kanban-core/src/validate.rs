//! Input normalization applied before any write reaches storage.

use crate::error::KanbanError;
use crate::task::Status;

pub const TITLE_MAX_CHARS: usize = 255;
pub const DESCRIPTION_MAX_CHARS: usize = 1000;

pub const MSG_TITLE_REQUIRED: &str = "Title is required and cannot be empty";
pub const MSG_TITLE_TOO_LONG: &str = "Title must be 255 characters or less";
pub const MSG_DESCRIPTION_TOO_LONG: &str = "Description must be 1000 characters or less";
pub const MSG_INVALID_ID: &str = "Invalid task ID";
pub const MSG_INVALID_STATUS: &str = "Status must be one of: todo, doing, done";
pub const MSG_STATUS_REQUIRED: &str = "Status is required and must be one of: todo, doing, done";
pub const MSG_TASK_NOT_FOUND: &str = "Task not found";

/// Trim and check a title. Length is counted in characters, not bytes.
pub fn normalize_title(raw: &str) -> Result<String, KanbanError> {
    let title = raw.trim();
    if title.is_empty() {
        return Err(KanbanError::Validation(MSG_TITLE_REQUIRED.into()));
    }
    if title.chars().count() > TITLE_MAX_CHARS {
        return Err(KanbanError::Validation(MSG_TITLE_TOO_LONG.into()));
    }
    Ok(title.to_string())
}

/// Trim a description; blank collapses to `None`.
pub fn normalize_description(raw: Option<&str>) -> Result<Option<String>, KanbanError> {
    let Some(desc) = raw.map(str::trim).filter(|d| !d.is_empty()) else {
        return Ok(None);
    };
    if desc.chars().count() > DESCRIPTION_MAX_CHARS {
        return Err(KanbanError::Validation(MSG_DESCRIPTION_TOO_LONG.into()));
    }
    Ok(Some(desc.to_string()))
}

pub fn parse_task_id(raw: &str) -> Result<i64, KanbanError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| KanbanError::Validation(MSG_INVALID_ID.into()))
}

/// Optional status, as accepted by the full update.
pub fn parse_optional_status(raw: Option<&str>) -> Result<Option<Status>, KanbanError> {
    match raw {
        None => Ok(None),
        Some(s) => Status::parse_str(s)
            .map(Some)
            .ok_or_else(|| KanbanError::Validation(MSG_INVALID_STATUS.into())),
    }
}

/// Mandatory status, as accepted by the status-only update.
pub fn parse_required_status(raw: Option<&str>) -> Result<Status, KanbanError> {
    raw.and_then(Status::parse_str)
        .ok_or_else(|| KanbanError::Validation(MSG_STATUS_REQUIRED.into()))
}
