pub mod health;
pub mod tasks;

use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::routing::any;
use axum::{Json, Router};
use kanban_core::envelope::ApiResponse;
use kanban_service::{LocalService, ServiceError};
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use tracing::error;

pub struct InnerAppState {
    pub service: LocalService,
    /// Adds error detail to 500 responses.
    pub dev_mode: bool,
}

pub type AppState = Arc<InnerAppState>;

#[derive(Debug, Clone, Default)]
pub struct RouterOptions {
    /// Directory holding the browser client; `index.html` is the
    /// single-page fallback.
    pub client_dir: Option<PathBuf>,
    pub dev_mode: bool,
}

pub type ErrorResponse = (StatusCode, Json<ApiResponse<()>>);

pub const MSG_API_NOT_FOUND: &str = "API endpoint not found";

pub fn build_router(state: AppState, options: &RouterOptions) -> Router {
    let api = Router::new()
        .merge(tasks::routes())
        .merge(health::routes())
        .route("/api", any(api_not_found))
        .route("/api/{*rest}", any(api_not_found))
        .method_not_allowed_fallback(api_not_found)
        .with_state(state);

    let router = match &options.client_dir {
        Some(dir) => {
            let index = ServeFile::new(dir.join("index.html"));
            api.fallback_service(ServeDir::new(dir).fallback(index))
        }
        None => api,
    };

    router
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

async fn api_not_found() -> ErrorResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ApiResponse::failure(MSG_API_NOT_FOUND)),
    )
}

/// Map a service error onto the failure envelope.
pub(crate) fn to_error(state: &AppState, e: ServiceError) -> ErrorResponse {
    let status =
        StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut body = ApiResponse::failure(e.message());
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        error!(error = ?e, "request failed");
        if state.dev_mode {
            body = body.with_error_detail(format!("{e:?}"));
        }
    }
    (status, Json(body))
}

/// Malformed or missing JSON bodies are client errors.
pub(crate) fn body_error(rejection: JsonRejection) -> ErrorResponse {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiResponse::failure(rejection.body_text())),
    )
}
