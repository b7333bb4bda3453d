use thiserror::Error;

/// Failure taxonomy shared by the server handlers and the client gateway.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KanbanError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Provider(String),

    #[error("{0}")]
    Storage(String),
}

impl KanbanError {
    pub fn http_status(&self) -> u16 {
        match self {
            KanbanError::Validation(_) => 400,
            KanbanError::NotFound(_) => 404,
            KanbanError::Provider(_) => 503,
            KanbanError::Storage(_) => 500,
        }
    }

    /// Classify a non-success HTTP status back into the taxonomy.
    pub fn from_status(code: u16, message: String) -> Self {
        match code {
            400 => KanbanError::Validation(message),
            404 => KanbanError::NotFound(message),
            503 => KanbanError::Provider(message),
            _ => KanbanError::Storage(message),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            KanbanError::Validation(m)
            | KanbanError::NotFound(m)
            | KanbanError::Provider(m)
            | KanbanError::Storage(m) => m,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_taxonomy() {
        assert_eq!(KanbanError::Validation("x".into()).http_status(), 400);
        assert_eq!(KanbanError::NotFound("x".into()).http_status(), 404);
        assert_eq!(KanbanError::Provider("x".into()).http_status(), 503);
        assert_eq!(KanbanError::Storage("x".into()).http_status(), 500);
    }

    #[test]
    fn from_status_unknown_codes_are_storage() {
        let e = KanbanError::from_status(502, "bad gateway".into());
        assert_eq!(e, KanbanError::Storage("bad gateway".into()));
        assert_eq!(e.message(), "bad gateway");
    }
}
