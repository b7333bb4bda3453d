use serde::{Deserialize, Serialize};

use crate::error::KanbanError;

/// Uniform `{success, data?, message?}` wrapper returned by every endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Extra failure detail, only populated in development mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            error: None,
        }
    }

    pub fn ok_with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::ok(data)
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.into()),
            error: None,
        }
    }

    pub fn with_error_detail(mut self, detail: impl Into<String>) -> Self {
        self.error = Some(detail.into());
        self
    }

    /// Unwrap a decoded envelope. `status` is the HTTP status it arrived with
    /// and `purpose` names the call for the fallback message.
    pub fn into_result(self, status: u16, purpose: &str) -> Result<T, KanbanError> {
        let fallback = || format!("HTTP {status}: {purpose}");
        if !self.success || !(200..300).contains(&status) {
            let message = self.message.unwrap_or_else(fallback);
            let code = if (200..300).contains(&status) { 500 } else { status };
            return Err(KanbanError::from_status(code, message));
        }
        self.data
            .ok_or_else(|| KanbanError::Storage(format!("{}: missing data", fallback())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_serializes_without_data() {
        let v = serde_json::to_value(ApiResponse::<()>::failure("Task not found")).unwrap();
        assert_eq!(v, serde_json::json!({"success": false, "message": "Task not found"}));
    }

    #[test]
    fn into_result_uses_server_message() {
        let env: ApiResponse<i32> = ApiResponse::failure("Invalid task ID");
        let err = env.into_result(400, "update task").unwrap_err();
        assert_eq!(err, KanbanError::Validation("Invalid task ID".into()));
    }

    #[test]
    fn into_result_falls_back_to_status_line() {
        let env: ApiResponse<i32> = ApiResponse {
            success: false,
            data: None,
            message: None,
            error: None,
        };
        let err = env.into_result(404, "delete task").unwrap_err();
        assert_eq!(err, KanbanError::NotFound("HTTP 404: delete task".into()));
    }

    #[test]
    fn decodes_failure_for_payload_without_default() {
        use crate::task::Task;

        let env: ApiResponse<Task> =
            serde_json::from_str(r#"{"success":false,"message":"Task not found"}"#).unwrap();
        assert!(env.data.is_none());
        let err = env.into_result(404, "delete task").unwrap_err();
        assert_eq!(err, KanbanError::NotFound("Task not found".into()));
    }

    #[test]
    fn into_result_success() {
        assert_eq!(ApiResponse::ok(7).into_result(200, "x").unwrap(), 7);
    }
}
