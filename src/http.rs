//! HTTP transport: axum REST API over the task lifecycle service.

use std::net::SocketAddr;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::{ErrorCode, TaskError};
use crate::service::TaskService;
use crate::types::{BoardReorder, StatusUpdate, TaskInput};

impl IntoResponse for TaskError {
    fn into_response(self) -> Response {
        let status = match self.code {
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            // Deleting an already-deleted task reports success, matching the
            // idempotent contract clients rely on.
            ErrorCode::AlreadyDeleted => {
                return (StatusCode::OK, Json(json!({ "message": "Success" }))).into_response();
            }
            ErrorCode::DatabaseError | ErrorCode::InternalError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            _ => StatusCode::BAD_REQUEST,
        };
        (status, Json(self)).into_response()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListParams {
    #[serde(default)]
    page: i64,
    #[serde(default = "default_page_size")]
    size: i64,
    sort_by: Option<String>,
    sort_dir: Option<String>,
}

fn default_page_size() -> i64 {
    10
}

#[derive(Debug, Deserialize)]
struct PageParams {
    #[serde(default)]
    page: i64,
    #[serde(default = "default_page_size")]
    size: i64,
}

async fn create_task(
    State(service): State<TaskService>,
    Json(input): Json<TaskInput>,
) -> Result<impl IntoResponse, TaskError> {
    let task = service.create_task(input)?;
    Ok((StatusCode::CREATED, Json(task)))
}

async fn list_tasks(
    State(service): State<TaskService>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, TaskError> {
    let page = service.list_tasks(
        params.page,
        params.size,
        params.sort_by.as_deref(),
        params.sort_dir.as_deref(),
    )?;
    Ok(Json(page))
}

async fn get_task(
    State(service): State<TaskService>,
    Path(task_id): Path<i64>,
) -> Result<impl IntoResponse, TaskError> {
    Ok(Json(service.get_task(task_id)?))
}

async fn update_task(
    State(service): State<TaskService>,
    Path(task_id): Path<i64>,
    Json(input): Json<TaskInput>,
) -> Result<impl IntoResponse, TaskError> {
    Ok(Json(service.update_task(task_id, input)?))
}

async fn delete_task(
    State(service): State<TaskService>,
    Path(task_id): Path<i64>,
) -> Result<impl IntoResponse, TaskError> {
    service.delete_task(task_id)?;
    Ok(Json(json!({ "message": "Task deleted successfully" })))
}

async fn restore_task(
    State(service): State<TaskService>,
    Path(task_id): Path<i64>,
) -> Result<impl IntoResponse, TaskError> {
    Ok(Json(service.restore_task(task_id)?))
}

async fn complete_task(
    State(service): State<TaskService>,
    Path(task_id): Path<i64>,
) -> Result<impl IntoResponse, TaskError> {
    Ok(Json(service.mark_completed(task_id)?))
}

async fn update_status(
    State(service): State<TaskService>,
    Path(task_id): Path<i64>,
    Json(update): Json<StatusUpdate>,
) -> Result<impl IntoResponse, TaskError> {
    Ok(Json(service.update_status(task_id, update)?))
}

async fn reorder_board(
    State(service): State<TaskService>,
    Json(request): Json<BoardReorder>,
) -> Result<impl IntoResponse, TaskError> {
    service.reorder_board(request)?;
    Ok(Json(json!({ "message": "Board reordered successfully" })))
}

async fn list_deleted(
    State(service): State<TaskService>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, TaskError> {
    Ok(Json(service.list_deleted(params.page, params.size)?))
}

async fn health() -> impl IntoResponse {
    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "status": "ok",
    }))
}

/// Build the router with all routes.
pub fn build_router(service: TaskService) -> Router {
    // Configure CORS for development
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/tasks", post(create_task).get(list_tasks))
        .route("/api/tasks/deleted", get(list_deleted))
        .route("/api/tasks/board/reorder", patch(reorder_board))
        .route(
            "/api/tasks/{task_id}",
            get(get_task).put(update_task).delete(delete_task),
        )
        .route("/api/tasks/{task_id}/restore", post(restore_task))
        .route("/api/tasks/{task_id}/complete", patch(complete_task))
        .route("/api/tasks/{task_id}/status", patch(update_status))
        .route("/api/health", get(health))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

/// Start the HTTP server on the specified port and serve until interrupted.
pub async fn start_server(service: TaskService, port: u16) -> anyhow::Result<()> {
    let app = build_router(service);

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Task board listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("Shutting down");
}
