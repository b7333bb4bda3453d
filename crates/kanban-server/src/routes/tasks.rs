use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{get, patch, post, put},
    Json, Router,
};
use kanban_core::advice::Advice;
use kanban_core::envelope::ApiResponse;
use kanban_core::task::{CreateTask, StatusUpdate, Task, UpdateTask};
use kanban_service::TaskService;
use tracing::info;

use super::{body_error, to_error, AppState, ErrorResponse};

type ApiResult<T> = Result<Json<ApiResponse<T>>, ErrorResponse>;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/tasks", get(list_tasks).post(create_task))
        .route("/api/tasks/{id}", put(update_task).delete(delete_task))
        .route("/api/tasks/{id}/status", patch(update_status))
        .route("/api/tasks/{id}/advice", post(generate_advice))
}

async fn list_tasks(State(state): State<AppState>) -> ApiResult<Vec<Task>> {
    state
        .service
        .list_tasks()
        .await
        .map(|t| Json(ApiResponse::ok(t)))
        .map_err(|e| to_error(&state, e))
}

async fn create_task(
    State(state): State<AppState>,
    input: Result<Json<CreateTask>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<Task>>), ErrorResponse> {
    let Json(input) = input.map_err(body_error)?;
    let task = state
        .service
        .create_task(&input)
        .await
        .map_err(|e| to_error(&state, e))?;
    info!(task_id = task.id, "task created");
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(task))))
}

async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
    input: Result<Json<UpdateTask>, JsonRejection>,
) -> ApiResult<Task> {
    let Json(input) = input.map_err(body_error)?;
    state
        .service
        .update_task(&id, &input)
        .await
        .map(|t| Json(ApiResponse::ok(t)))
        .map_err(|e| to_error(&state, e))
}

async fn delete_task(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Task> {
    let task = state
        .service
        .delete_task(&id)
        .await
        .map_err(|e| to_error(&state, e))?;
    info!(task_id = task.id, "task deleted");
    Ok(Json(ApiResponse::ok_with_message(
        task,
        "Task deleted successfully",
    )))
}

async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    input: Result<Json<StatusUpdate>, JsonRejection>,
) -> ApiResult<Task> {
    let Json(input) = input.map_err(body_error)?;
    state
        .service
        .set_status(&id, &input)
        .await
        .map(|t| Json(ApiResponse::ok(t)))
        .map_err(|e| to_error(&state, e))
}

async fn generate_advice(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Advice> {
    state
        .service
        .generate_advice(&id)
        .await
        .map(|a| Json(ApiResponse::ok(a)))
        .map_err(|e| to_error(&state, e))
}
