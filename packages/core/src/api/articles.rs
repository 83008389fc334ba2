//! Article Endpoints
//!
//! REST surface over [`ArticleService`]. Flat CRUD plus the read toggle.
//!
//! # Endpoints
//!
//! - `GET /api/articles` - List articles, unread first
//! - `POST /api/articles` - Save an article to read later
//! - `GET /api/articles/:id` - Get an article by id
//! - `PATCH /api/articles/:id` - Sparse update
//! - `DELETE /api/articles/:id` - Delete an article
//! - `POST /api/articles/:id/read` - Mark read (or unread again)

use axum::{
    extract::{Path, State},
    response::Json,
    routing::{delete, get, patch, post},
    Router,
};
use serde::Deserialize;

use crate::api::{AppState, HttpError};
use crate::models::{Article, ArticleChanges, ArticleId, NewArticle};

/// Body of a read toggle request
#[derive(Debug, Deserialize)]
pub struct ReadRequest {
    /// Defaults to true; send `{"read": false}` to mark unread again
    #[serde(default = "default_read")]
    read: bool,
}

fn default_read() -> bool {
    true
}

/// List every article, unread first
async fn list_articles(
    State(state): State<AppState>,
) -> Result<Json<Vec<Article>>, HttpError> {
    let articles = state.articles.list().await?;
    Ok(Json(articles))
}

/// Save an article to read later
async fn create_article(
    State(state): State<AppState>,
    Json(new): Json<NewArticle>,
) -> Result<Json<Article>, HttpError> {
    let article = state.articles.add(new).await?;
    Ok(Json(article))
}

/// Get an article by id
async fn get_article(
    State(state): State<AppState>,
    Path(id): Path<ArticleId>,
) -> Result<Json<Article>, HttpError> {
    let article = state.articles.get(id).await?;
    Ok(Json(article))
}

/// Apply a sparse update to an article
async fn update_article(
    State(state): State<AppState>,
    Path(id): Path<ArticleId>,
    Json(changes): Json<ArticleChanges>,
) -> Result<Json<Article>, HttpError> {
    let article = state.articles.update(id, changes).await?;
    Ok(Json(article))
}

/// Delete an article
async fn delete_article(
    State(state): State<AppState>,
    Path(id): Path<ArticleId>,
) -> Result<Json<serde_json::Value>, HttpError> {
    state.articles.delete(id).await?;
    Ok(Json(serde_json::json!({ "deleted": true })))
}

/// Toggle the read flag
async fn mark_read(
    State(state): State<AppState>,
    Path(id): Path<ArticleId>,
    Json(request): Json<ReadRequest>,
) -> Result<Json<Article>, HttpError> {
    let article = state.articles.mark_read(id, request.read).await?;
    Ok(Json(article))
}

/// Build the article endpoint router
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/articles", get(list_articles))
        .route("/api/articles", post(create_article))
        .route("/api/articles/:id", get(get_article))
        .route("/api/articles/:id", patch(update_article))
        .route("/api/articles/:id", delete(delete_article))
        .route("/api/articles/:id/read", post(mark_read))
        .with_state(state)
}
