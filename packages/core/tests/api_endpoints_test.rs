//! Integration tests for the REST API
//!
//! Drives the full router in-process with `tower::ServiceExt::oneshot`
//! against a real temporary database, asserting response shapes, status
//! codes and the error body contract.

use anyhow::Result;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::sync::Arc;
use tasktree_core::api::{create_router, AppState};
use tasktree_core::db::{ArticleStore, DatabaseService, SqliteTodoStore, TodoStore};
use tasktree_core::services::{ArticleService, SyncedTodoRepository, TodoService};
use tempfile::TempDir;
use tower::ServiceExt;

/// Test helper: full router over a fresh database
async fn create_test_app() -> Result<(Router, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let db = DatabaseService::new(db_path).await?;
    let store: Arc<dyn TodoStore> = Arc::new(SqliteTodoStore::new(db.clone()));
    let article_store = ArticleStore::new(db);

    let repo = Arc::new(SyncedTodoRepository::open(store.clone()).await?);
    let todos = Arc::new(TodoService::new(repo, store));
    let articles = Arc::new(ArticleService::new(article_store, todos.event_sender()));

    let app = create_router(AppState { todos, articles });
    Ok((app, temp_dir))
}

/// Test helper: send one request, decode the JSON body
async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> Result<(StatusCode, Value)> {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&json)?))?,
        None => builder.body(Body::empty())?,
    };

    let response = app.clone().oneshot(request).await?;
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), 1_000_000).await?;
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)?
    };

    Ok((status, value))
}

/// Test helper: create a todo, returning its id
async fn create_todo(app: &Router, title: &str, parent: Option<i64>) -> Result<i64> {
    let mut body = json!({ "title": title });
    if let Some(parent_id) = parent {
        body["parentId"] = json!(parent_id);
    }

    let (status, value) = send(app, "POST", "/api/todos", Some(body)).await?;
    assert_eq!(status, StatusCode::OK);
    Ok(value["id"].as_i64().expect("created todo has an id"))
}

// ============================================================================
// Health and routing
// ============================================================================

#[tokio::test]
async fn test_health_endpoint() -> Result<()> {
    let (app, _tmp) = create_test_app().await?;

    let (status, body) = send(&app, "GET", "/api/health", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert!(body.get("version").is_some());
    assert_eq!(body["cache"]["relations"], 0);

    Ok(())
}

#[tokio::test]
async fn test_unknown_route_returns_404() -> Result<()> {
    let (app, _tmp) = create_test_app().await?;

    let (status, _body) = send(&app, "GET", "/api/nonexistent", None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    Ok(())
}

// ============================================================================
// Todo CRUD
// ============================================================================

#[tokio::test]
async fn test_create_and_fetch_todo() -> Result<()> {
    let (app, _tmp) = create_test_app().await?;

    let (status, created) = send(
        &app,
        "POST",
        "/api/todos",
        Some(json!({ "title": "write tests" })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["title"], "write tests");
    assert_eq!(created["status"], "BACKLOG");
    assert_eq!(created["parentId"], Value::Null);
    assert!(created.get("createdAt").is_some());
    assert!(created.get("lastInteractedAt").is_some());

    let id = created["id"].as_i64().expect("id assigned");
    let (status, fetched) = send(&app, "GET", &format!("/api/todos/{}", id), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["title"], "write tests");

    Ok(())
}

#[tokio::test]
async fn test_create_rejects_blank_title() -> Result<()> {
    let (app, _tmp) = create_test_app().await?;

    let (status, body) = send(
        &app,
        "POST",
        "/api/todos",
        Some(json!({ "title": "  " })),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_INPUT");

    Ok(())
}

#[tokio::test]
async fn test_get_unknown_todo_is_404_with_code() -> Result<()> {
    let (app, _tmp) = create_test_app().await?;

    let (status, body) = send(&app, "GET", "/api/todos/999", None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "TODO_NOT_FOUND");
    assert_eq!(body["message"], "Todo not found: 999");

    Ok(())
}

#[tokio::test]
async fn test_patch_status_ripples_to_parent() -> Result<()> {
    let (app, _tmp) = create_test_app().await?;
    let a = create_todo(&app, "A", None).await?;
    let b = create_todo(&app, "B", Some(a)).await?;

    let (status, updated) = send(
        &app,
        "PATCH",
        &format!("/api/todos/{}", b),
        Some(json!({ "status": "IN_PROGRESS" })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "IN_PROGRESS");

    let (_, parent) = send(&app, "GET", &format!("/api/todos/{}", a), None).await?;
    assert_eq!(parent["status"], "IN_PROGRESS");

    Ok(())
}

#[tokio::test]
async fn test_patch_unknown_todo_is_404() -> Result<()> {
    let (app, _tmp) = create_test_app().await?;

    let (status, body) = send(
        &app,
        "PATCH",
        "/api/todos/999",
        Some(json!({ "title": "renamed" })),
    )
    .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "TODO_NOT_FOUND");

    Ok(())
}

// ============================================================================
// Moves
// ============================================================================

#[tokio::test]
async fn test_move_cycle_is_conflict() -> Result<()> {
    let (app, _tmp) = create_test_app().await?;
    let a = create_todo(&app, "A", None).await?;
    let b = create_todo(&app, "B", Some(a)).await?;

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/todos/{}/move", a),
        Some(json!({ "parentId": b })),
    )
    .await?;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CIRCULAR_MOVE");

    Ok(())
}

#[tokio::test]
async fn test_move_null_parent_detaches() -> Result<()> {
    let (app, _tmp) = create_test_app().await?;
    let a = create_todo(&app, "A", None).await?;
    let b = create_todo(&app, "B", Some(a)).await?;

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/todos/{}/move", b),
        Some(json!({ "parentId": null })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["moved"], true);

    let (_, fetched) = send(&app, "GET", &format!("/api/todos/{}", b), None).await?;
    assert_eq!(fetched["parentId"], Value::Null);

    Ok(())
}

#[tokio::test]
async fn test_move_unknown_todo_reports_not_moved() -> Result<()> {
    let (app, _tmp) = create_test_app().await?;

    let (status, body) = send(
        &app,
        "POST",
        "/api/todos/999/move",
        Some(json!({ "parentId": null })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["moved"], false);

    Ok(())
}

// ============================================================================
// Deletes
// ============================================================================

#[tokio::test]
async fn test_delete_returns_removed_ids() -> Result<()> {
    let (app, _tmp) = create_test_app().await?;
    let a = create_todo(&app, "A", None).await?;
    let b = create_todo(&app, "B", Some(a)).await?;

    let (status, body) = send(&app, "DELETE", &format!("/api/todos/{}", a), None).await?;
    assert_eq!(status, StatusCode::OK);

    let mut expected = vec![a, b];
    expected.sort_unstable();
    let removed: Vec<i64> = body["removedIds"]
        .as_array()
        .expect("removedIds is an array")
        .iter()
        .filter_map(Value::as_i64)
        .collect();
    assert_eq!(removed, expected);

    let (status, _) = send(&app, "GET", &format!("/api/todos/{}", b), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    Ok(())
}

// ============================================================================
// Listing and tree views
// ============================================================================

#[tokio::test]
async fn test_listing_excludes_done_by_default() -> Result<()> {
    let (app, _tmp) = create_test_app().await?;
    let a = create_todo(&app, "open", None).await?;
    let b = create_todo(&app, "finished", None).await?;

    send(
        &app,
        "PATCH",
        &format!("/api/todos/{}", b),
        Some(json!({ "status": "DONE" })),
    )
    .await?;

    let (status, listing) = send(&app, "GET", "/api/todos", None).await?;
    assert_eq!(status, StatusCode::OK);
    let entries = listing.as_array().expect("listing is an array");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["id"], a);

    let (_, listing) = send(&app, "GET", "/api/todos?includeDone=true", None).await?;
    assert_eq!(listing.as_array().map(Vec::len), Some(2));

    Ok(())
}

#[tokio::test]
async fn test_ancestors_endpoint_returns_breadcrumb() -> Result<()> {
    let (app, _tmp) = create_test_app().await?;
    let a = create_todo(&app, "Project", None).await?;
    let b = create_todo(&app, "Phase", Some(a)).await?;
    let c = create_todo(&app, "Task", Some(b)).await?;

    let (status, body) = send(
        &app,
        "GET",
        &format!("/api/todos/{}/ancestors", c),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!([
            { "id": a, "title": "Project" },
            { "id": b, "title": "Phase" }
        ])
    );

    Ok(())
}

#[tokio::test]
async fn test_descendants_endpoint() -> Result<()> {
    let (app, _tmp) = create_test_app().await?;
    let a = create_todo(&app, "A", None).await?;
    let b = create_todo(&app, "B", Some(a)).await?;
    let c = create_todo(&app, "C", Some(b)).await?;

    let (status, body) = send(
        &app,
        "GET",
        &format!("/api/todos/{}/descendants", a),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);

    let mut expected = vec![b, c];
    expected.sort_unstable();
    assert_eq!(body, json!(expected));

    Ok(())
}

#[tokio::test]
async fn test_history_endpoint() -> Result<()> {
    let (app, _tmp) = create_test_app().await?;
    let a = create_todo(&app, "A", None).await?;

    send(
        &app,
        "PATCH",
        &format!("/api/todos/{}", a),
        Some(json!({ "status": "NEXT_TO_TAKE" })),
    )
    .await?;

    let (status, body) = send(&app, "GET", &format!("/api/todos/{}/history", a), None).await?;
    assert_eq!(status, StatusCode::OK);

    let rows = body.as_array().expect("history is an array");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["from"], "BACKLOG");
    assert_eq!(rows[0]["to"], "NEXT_TO_TAKE");
    assert_eq!(rows[0]["todoId"], a);

    Ok(())
}

// ============================================================================
// Articles
// ============================================================================

#[tokio::test]
async fn test_article_lifecycle() -> Result<()> {
    let (app, _tmp) = create_test_app().await?;

    let (status, created) = send(
        &app,
        "POST",
        "/api/articles",
        Some(json!({
            "title": "Fearless concurrency",
            "url": "https://example.com/fearless"
        })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["read"], false);
    let id = created["id"].as_i64().expect("article id assigned");

    let (status, read) = send(
        &app,
        "POST",
        &format!("/api/articles/{}/read", id),
        Some(json!({})),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(read["read"], true);

    let (status, updated) = send(
        &app,
        "PATCH",
        &format!("/api/articles/{}", id),
        Some(json!({ "note": "worth rereading" })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["note"], "worth rereading");

    let (status, body) = send(&app, "DELETE", &format!("/api/articles/{}", id), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deleted"], true);

    let (status, body) = send(&app, "GET", &format!("/api/articles/{}", id), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "ARTICLE_NOT_FOUND");

    Ok(())
}

#[tokio::test]
async fn test_article_listing_puts_unread_first() -> Result<()> {
    let (app, _tmp) = create_test_app().await?;

    let (_, first) = send(
        &app,
        "POST",
        "/api/articles",
        Some(json!({ "title": "first" })),
    )
    .await?;
    let (_, second) = send(
        &app,
        "POST",
        "/api/articles",
        Some(json!({ "title": "second" })),
    )
    .await?;

    // Mark the newer one read; the unread one must list first
    send(
        &app,
        "POST",
        &format!("/api/articles/{}/read", second["id"]),
        Some(json!({})),
    )
    .await?;

    let (status, listing) = send(&app, "GET", "/api/articles", None).await?;
    assert_eq!(status, StatusCode::OK);
    let entries = listing.as_array().expect("listing is an array");
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["id"], first["id"]);
    assert_eq!(entries[0]["read"], false);
    assert_eq!(entries[1]["read"], true);

    Ok(())
}
