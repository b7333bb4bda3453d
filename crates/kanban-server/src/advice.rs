//! Advice generation through a hosted chat-completion endpoint.

use std::time::Duration;

use async_trait::async_trait;
use kanban_service::{AdviceError, AdviceErrorKind, AdviceProvider};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";
pub const MODEL: &str = "gpt-4o";
pub const MAX_TOKENS: u32 = 300;
pub const TEMPERATURE: f32 = 0.7;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Fixed-structure prompt embedding the task's title and description.
pub fn build_prompt(title: &str, description: Option<&str>) -> String {
    let description = description
        .filter(|d| !d.trim().is_empty())
        .unwrap_or("No description provided");
    format!(
        "Analyze this task and provide comprehensive guidance:\n\n\
         Title: {title}\n\
         Description: {description}\n\n\
         Please provide practical advice covering:\n\n\
         1. RISK MANAGEMENT: Identify potential blockers, dependencies, or challenges that could derail this task. What should be watched carefully?\n\n\
         2. BEST PRACTICES: What proven approaches, standards, or methodologies should be applied? Any performance, security, or maintainability considerations?\n\n\
         3. IMPLEMENTATION STRATEGY: Suggest efficient approaches, tools, or techniques. Break down complex work into manageable steps.\n\n\
         Keep advice actionable and concise. Focus on practical guidance that helps ensure successful task completion.\n\n\
         IMPORTANT: Limit your response to a maximum of 100 words."
    )
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

/// Chat-completion client. Without an API key every call fails with the
/// configuration error and no request is sent.
pub struct OpenAiAdvisor {
    api_key: Option<String>,
    base_url: String,
    client: reqwest::Client,
}

impl OpenAiAdvisor {
    pub fn new(api_key: Option<String>, base_url: &str) -> Result<Self, AdviceError> {
        Self::with_timeout(api_key, base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(
        api_key: Option<String>,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, AdviceError> {
        let client = reqwest::Client::builder()
            .user_agent("kanban-server")
            .timeout(timeout)
            .build()
            .map_err(|e| AdviceError::new(AdviceErrorKind::Other, format!("HTTP client init: {e}")))?;
        let api_key = api_key.filter(|k| !k.trim().is_empty());
        if api_key.is_none() {
            warn!("OPENAI_API_KEY not set; advice generation is disabled");
        }
        Ok(Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn completions_url(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }
}

fn classify_transport(e: &reqwest::Error) -> AdviceErrorKind {
    if e.is_timeout() {
        AdviceErrorKind::Timeout
    } else if e.is_connect() {
        AdviceErrorKind::Connect
    } else {
        AdviceErrorKind::Other
    }
}

#[async_trait]
impl AdviceProvider for OpenAiAdvisor {
    async fn generate(
        &self,
        title: &str,
        description: Option<&str>,
    ) -> Result<String, AdviceError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| AdviceError::from(AdviceErrorKind::NotConfigured))?;

        let prompt = build_prompt(title, description);
        let body = ChatRequest {
            model: MODEL,
            messages: vec![ChatMessage {
                role: "user",
                content: &prompt,
            }],
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
        };

        debug!(model = MODEL, "requesting advice");
        let resp = self
            .client
            .post(self.completions_url())
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AdviceError::new(classify_transport(&e), e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().await.unwrap_or_default();
            return Err(AdviceError::new(
                AdviceErrorKind::from_status(status.as_u16()),
                format!("provider returned {status}: {detail}"),
            ));
        }

        let parsed: ChatResponse = resp
            .json()
            .await
            .map_err(|e| AdviceError::new(classify_transport(&e), format!("decode: {e}")))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or_else(|| AdviceError::new(AdviceErrorKind::Other, "empty completion"))
    }
}

#[cfg(test)]
mod tests {
    use axum::{http::StatusCode, routing::post, Json, Router};
    use serde_json::{json, Value};
    use tokio::net::TcpListener;

    use super::*;

    /// Stand-in provider that answers every completion with `status`/`body`.
    async fn spawn_provider(status: StatusCode, body: Value) -> String {
        let app = Router::new().route(
            "/v1/chat/completions",
            post(move |Json(req): Json<Value>| {
                let body = body.clone();
                async move {
                    assert_eq!(req["model"], MODEL);
                    assert_eq!(req["max_tokens"], MAX_TOKENS);
                    (status, Json(body))
                }
            }),
        );
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[test]
    fn prompt_embeds_task_fields() {
        let p = build_prompt("Ship v2", Some("Migrate the database"));
        assert!(p.contains("Title: Ship v2\n"));
        assert!(p.contains("Description: Migrate the database\n"));
        assert!(p.contains("1. RISK MANAGEMENT"));
        assert!(p.contains("2. BEST PRACTICES"));
        assert!(p.contains("3. IMPLEMENTATION STRATEGY"));
        assert!(p.ends_with("maximum of 100 words."));
    }

    #[test]
    fn prompt_placeholder_without_description() {
        let p = build_prompt("Ship v2", None);
        assert!(p.contains("Description: No description provided"));
    }

    #[tokio::test]
    async fn missing_key_fails_without_request() {
        // Unroutable base URL: any request attempt would be a Connect error.
        let advisor = OpenAiAdvisor::new(None, "http://127.0.0.1:9").unwrap();
        assert!(!advisor.is_configured());
        let err = advisor.generate("t", None).await.unwrap_err();
        assert_eq!(err.kind, AdviceErrorKind::NotConfigured);
    }

    #[tokio::test]
    async fn success_returns_trimmed_text() {
        let base = spawn_provider(
            StatusCode::OK,
            json!({"choices": [{"message": {"role": "assistant", "content": "  Start small.\n"}}]}),
        )
        .await;
        let advisor = OpenAiAdvisor::new(Some("sk-test".into()), &base).unwrap();
        let text = advisor.generate("t", Some("d")).await.unwrap();
        assert_eq!(text, "Start small.");
    }

    #[tokio::test]
    async fn provider_statuses_map_to_kinds() {
        let cases = [
            (StatusCode::TOO_MANY_REQUESTS, AdviceErrorKind::RateLimited),
            (StatusCode::UNAUTHORIZED, AdviceErrorKind::Unauthorized),
            (StatusCode::BAD_GATEWAY, AdviceErrorKind::ProviderFailure),
            (StatusCode::BAD_REQUEST, AdviceErrorKind::Other),
        ];
        for (status, kind) in cases {
            let base = spawn_provider(status, json!({"error": {"message": "nope"}})).await;
            let advisor = OpenAiAdvisor::new(Some("sk-test".into()), &base).unwrap();
            let err = advisor.generate("t", None).await.unwrap_err();
            assert_eq!(err.kind, kind, "status {status}");
            assert_eq!(err.to_string(), kind.message());
        }
    }

    #[tokio::test]
    async fn unreachable_provider_is_connect_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let advisor = OpenAiAdvisor::new(Some("sk-test".into()), &format!("http://{addr}")).unwrap();
        let err = advisor.generate("t", None).await.unwrap_err();
        assert_eq!(err.kind, AdviceErrorKind::Connect);
    }

    #[tokio::test]
    async fn slow_provider_is_timeout_error() {
        let app = Router::new().route(
            "/v1/chat/completions",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Json(json!({"choices": []}))
            }),
        );
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let advisor = OpenAiAdvisor::with_timeout(
            Some("sk-test".into()),
            &format!("http://{addr}"),
            Duration::from_millis(200),
        )
        .unwrap();
        let err = advisor.generate("t", None).await.unwrap_err();
        assert_eq!(err.kind, AdviceErrorKind::Timeout);
        assert_eq!(err.to_string(), AdviceErrorKind::Timeout.message());
    }
}
