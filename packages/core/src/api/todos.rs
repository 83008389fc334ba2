//! Todo Endpoints
//!
//! REST surface over [`TodoService`]. All bodies are JSON camelCase.
//!
//! # Endpoints
//!
//! - `GET /api/health` - Health check with cache counters
//! - `GET /api/todos` - Prioritized listing (`?includeDone=true` opts in)
//! - `POST /api/todos` - Create a new todo
//! - `GET /api/todos/:id` - Get a todo by id
//! - `PATCH /api/todos/:id` - Sparse update (title, priority, status)
//! - `DELETE /api/todos/:id` - Delete a todo and its subtree
//! - `POST /api/todos/:id/move` - Re-parent a todo
//! - `GET /api/todos/:id/ancestors` - Root-first breadcrumb
//! - `GET /api/todos/:id/descendants` - Every descendant id
//! - `GET /api/todos/:id/history` - Status-change log, newest first

use axum::{
    extract::{Path, Query, State},
    response::Json,
    routing::{delete, get, patch, post},
    Router,
};
use serde::{Deserialize, Serialize};

use crate::api::{AppState, HttpError};
use crate::hierarchy::CacheStats;
use crate::models::{NewTodo, StatusChange, TodoChanges, TodoId, TodoItem};
use crate::services::{Breadcrumb, PrioritizedTodo};

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
    pub cache: CacheStats,
}

/// Query parameters for the todo listing
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    /// Include `DONE` todos (hidden by default)
    #[serde(default)]
    include_done: bool,
}

/// Body of a move request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveRequest {
    /// New parent; `null` (or absent) detaches to the root level
    #[serde(default)]
    parent_id: Option<TodoId>,
}

/// Response of a move request
#[derive(Debug, Serialize, Deserialize)]
pub struct MoveResponse {
    /// False when the move was skipped as a no-op
    pub moved: bool,
}

/// Response of a delete request
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResponse {
    /// The deleted todo and every descendant that went with it, sorted
    pub removed_ids: Vec<TodoId>,
}

/// Health check endpoint
///
/// Returns server status, version and hierarchy cache counters. Useful
/// for verifying the server is up before running anything else.
async fn health_check(State(state): State<AppState>) -> Json<HealthStatus> {
    let cache = state.todos.cache_stats().await;

    Json(HealthStatus {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        cache,
    })
}

/// Prioritized todo listing with breadcrumbs
async fn list_todos(
    State(state): State<AppState>,
    Query(params): Query<ListQuery>,
) -> Result<Json<Vec<PrioritizedTodo>>, HttpError> {
    let todos = state.todos.prioritized(params.include_done).await?;
    Ok(Json(todos))
}

/// Create a new todo
async fn create_todo(
    State(state): State<AppState>,
    Json(new): Json<NewTodo>,
) -> Result<Json<TodoItem>, HttpError> {
    let todo = state.todos.create_todo(new).await?;
    Ok(Json(todo))
}

/// Get a todo by id
async fn get_todo(
    State(state): State<AppState>,
    Path(id): Path<TodoId>,
) -> Result<Json<TodoItem>, HttpError> {
    let todo = state.todos.todo(id).await?;
    Ok(Json(todo))
}

/// Apply a sparse update to a todo
async fn update_todo(
    State(state): State<AppState>,
    Path(id): Path<TodoId>,
    Json(changes): Json<TodoChanges>,
) -> Result<Json<TodoItem>, HttpError> {
    let todo = state.todos.update_todo(id, changes).await?;
    Ok(Json(todo))
}

/// Delete a todo and its whole subtree
async fn delete_todo(
    State(state): State<AppState>,
    Path(id): Path<TodoId>,
) -> Result<Json<DeleteResponse>, HttpError> {
    let removed_ids = state.todos.delete_todo(id).await?;
    Ok(Json(DeleteResponse { removed_ids }))
}

/// Re-parent a todo
async fn move_todo(
    State(state): State<AppState>,
    Path(id): Path<TodoId>,
    Json(request): Json<MoveRequest>,
) -> Result<Json<MoveResponse>, HttpError> {
    let moved = state.todos.move_todo(id, request.parent_id).await?;
    Ok(Json(MoveResponse { moved }))
}

/// Ancestor breadcrumb of a todo, root first
async fn get_ancestors(
    State(state): State<AppState>,
    Path(id): Path<TodoId>,
) -> Result<Json<Vec<Breadcrumb>>, HttpError> {
    let breadcrumb = state.todos.breadcrumb_of(id).await?;
    Ok(Json(breadcrumb))
}

/// Every descendant id of a todo, sorted
async fn get_descendants(
    State(state): State<AppState>,
    Path(id): Path<TodoId>,
) -> Result<Json<Vec<TodoId>>, HttpError> {
    let ids = state.todos.descendants_of(id).await?;
    Ok(Json(ids))
}

/// Status-change log of a todo, newest first
async fn get_history(
    State(state): State<AppState>,
    Path(id): Path<TodoId>,
) -> Result<Json<Vec<StatusChange>>, HttpError> {
    let history = state.todos.history_of(id).await?;
    Ok(Json(history))
}

/// Build the todo endpoint router
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/todos", get(list_todos))
        .route("/api/todos", post(create_todo))
        .route("/api/todos/:id", get(get_todo))
        .route("/api/todos/:id", patch(update_todo))
        .route("/api/todos/:id", delete(delete_todo))
        .route("/api/todos/:id/move", post(move_todo))
        .route("/api/todos/:id/ancestors", get(get_ancestors))
        .route("/api/todos/:id/descendants", get(get_descendants))
        .route("/api/todos/:id/history", get(get_history))
        .with_state(state)
}
