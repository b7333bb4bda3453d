use async_trait::async_trait;
use kanban_core::advice::Advice;
use kanban_core::envelope::ApiResponse;
use kanban_core::task::{CreateTask, StatusUpdate, Task, UpdateTask};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;

use crate::{ServiceError, TaskService};

/// Body of the health endpoint.
#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub message: String,
}

/// Async HTTP client implementation of TaskService.
/// Connects to a running kanban-server. One request per call, no retries.
#[derive(Clone)]
pub struct HttpService {
    base_url: String,
    client: Client,
}

impl HttpService {
    pub fn new(base_url: &str) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        Self {
            base_url,
            client: Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    pub async fn health_status(&self) -> Result<HealthStatus, ServiceError> {
        let resp = self
            .client
            .get(self.url("/api/health"))
            .send()
            .await
            .map_err(|e| ServiceError::Internal(format!("connection failed: {e}")))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ServiceError::Internal(format!(
                "HTTP {}: health check",
                status.as_u16()
            )));
        }
        resp.json::<HealthStatus>()
            .await
            .map_err(|e| ServiceError::Internal(format!("json decode: {e}")))
    }

    async fn send<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        purpose: &str,
    ) -> Result<T, ServiceError> {
        let resp = builder
            .send()
            .await
            .map_err(|e| ServiceError::Internal(format!("connection failed: {e}")))?;
        handle_envelope(resp, purpose).await
    }
}

/// Decode the `{success, data, message}` envelope. Non-2xx statuses and
/// `success: false` both become errors carrying the server's message, or
/// `HTTP <code>: <purpose>` when it sent none.
async fn handle_envelope<T: DeserializeOwned>(
    resp: reqwest::Response,
    purpose: &str,
) -> Result<T, ServiceError> {
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    match serde_json::from_str::<ApiResponse<T>>(&body) {
        Ok(envelope) => Ok(envelope.into_result(status, purpose)?),
        Err(e) => {
            let fallback = format!("HTTP {status}: {purpose}");
            // A failing response's body may not carry `data` of the expected
            // shape; recover its message if present.
            let message = serde_json::from_str::<ApiResponse<serde_json::Value>>(&body)
                .ok()
                .and_then(|env| env.message)
                .unwrap_or(fallback);
            if (200..300).contains(&status) {
                Err(ServiceError::Internal(format!("{message} (json decode: {e})")))
            } else {
                Err(kanban_core::KanbanError::from_status(status, message).into())
            }
        }
    }
}

#[async_trait]
impl TaskService for HttpService {
    async fn health(&self) -> Result<(), ServiceError> {
        self.health_status().await.map(|_| ())
    }

    async fn list_tasks(&self) -> Result<Vec<Task>, ServiceError> {
        self.send(self.client.get(self.url("/api/tasks")), "fetch tasks")
            .await
    }

    async fn create_task(&self, input: &CreateTask) -> Result<Task, ServiceError> {
        self.send(
            self.client.post(self.url("/api/tasks")).json(input),
            "create task",
        )
        .await
    }

    async fn update_task(&self, id: &str, update: &UpdateTask) -> Result<Task, ServiceError> {
        self.send(
            self.client
                .put(self.url(&format!("/api/tasks/{id}")))
                .json(update),
            "update task",
        )
        .await
    }

    async fn delete_task(&self, id: &str) -> Result<Task, ServiceError> {
        self.send(
            self.client.delete(self.url(&format!("/api/tasks/{id}"))),
            "delete task",
        )
        .await
    }

    async fn set_status(&self, id: &str, update: &StatusUpdate) -> Result<Task, ServiceError> {
        self.send(
            self.client
                .patch(self.url(&format!("/api/tasks/{id}/status")))
                .json(update),
            "update task status",
        )
        .await
    }

    async fn generate_advice(&self, id: &str) -> Result<Advice, ServiceError> {
        self.send(
            self.client.post(self.url(&format!("/api/tasks/{id}/advice"))),
            "generate advice",
        )
        .await
    }
}
