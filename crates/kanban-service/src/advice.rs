use async_trait::async_trait;
use thiserror::Error;

/// Cause of an advice generation failure. Each kind maps to one fixed
/// user-facing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdviceErrorKind {
    NotConfigured,
    RateLimited,
    Unauthorized,
    ProviderFailure,
    Connect,
    Timeout,
    Other,
}

impl AdviceErrorKind {
    pub fn message(&self) -> &'static str {
        match self {
            AdviceErrorKind::NotConfigured => {
                "AI service is not properly configured. Please check OPENAI_API_KEY environment variable."
            }
            AdviceErrorKind::RateLimited => {
                "AI service temporarily unavailable due to rate limits. Please try again in a few moments."
            }
            AdviceErrorKind::Unauthorized => {
                "AI service authentication failed. Please check API key configuration."
            }
            AdviceErrorKind::ProviderFailure => {
                "AI service is experiencing technical difficulties. Please try again later."
            }
            AdviceErrorKind::Connect => {
                "Unable to connect to AI service. Please check your internet connection."
            }
            AdviceErrorKind::Timeout => "AI service request timed out. Please try again.",
            AdviceErrorKind::Other => {
                "AI service encountered an unexpected error. Please try again."
            }
        }
    }

    /// Classify a non-success provider HTTP status.
    pub fn from_status(status: u16) -> Self {
        match status {
            429 => AdviceErrorKind::RateLimited,
            401 => AdviceErrorKind::Unauthorized,
            s if s >= 500 => AdviceErrorKind::ProviderFailure,
            _ => AdviceErrorKind::Other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", .kind.message())]
pub struct AdviceError {
    pub kind: AdviceErrorKind,
    /// Raw cause, for logs only.
    pub detail: String,
}

impl AdviceError {
    pub fn new(kind: AdviceErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }
}

impl From<AdviceErrorKind> for AdviceError {
    fn from(kind: AdviceErrorKind) -> Self {
        Self::new(kind, kind.message())
    }
}

/// Source of free-text advice for a task.
#[async_trait]
pub trait AdviceProvider: Send + Sync {
    /// Returns trimmed advice text.
    async fn generate(&self, title: &str, description: Option<&str>)
        -> Result<String, AdviceError>;
}
