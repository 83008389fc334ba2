//! HTTP API
//!
//! REST surface over the service layer, one endpoint module per
//! concern, merged into a single router:
//!
//! - `todos` - hierarchy-aware todo CRUD, move, breadcrumbs, history
//! - `articles` - flat read-later CRUD
//! - `events` - Server-Sent Events stream of domain events
//!
//! All request and response bodies are JSON camelCase. Errors come back
//! as [`HttpError`] bodies with a machine-readable code.

pub mod articles;
pub mod events;
pub mod http_error;
pub mod todos;

pub use http_error::HttpError;

use crate::services::{ArticleService, TodoService};
use axum::http::{header, Method};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

/// Shared state for all endpoint handlers
#[derive(Clone)]
pub struct AppState {
    pub todos: Arc<TodoService>,
    pub articles: Arc<ArticleService>,
}

/// Create the main application router with all endpoint modules
///
/// Each endpoint module contributes its routes independently via
/// `.merge()`.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(todos::routes(state.clone()))
        .merge(articles::routes(state.clone()))
        .merge(events::routes(state))
        .layer(cors_layer())
}

/// Create the CORS layer
///
/// Allows requests from local frontend dev servers. Supports a custom
/// origin via the CORS_ALLOW_ORIGIN environment variable.
fn cors_layer() -> CorsLayer {
    let default_origins = [
        "http://localhost:1420",
        "http://localhost:5173", // Vite default
    ];

    let origins: Vec<header::HeaderValue> =
        if let Ok(custom_origin) = std::env::var("CORS_ALLOW_ORIGIN") {
            vec![custom_origin
                .parse::<header::HeaderValue>()
                .expect("Invalid CORS_ALLOW_ORIGIN - must be valid HTTP origin")]
        } else {
            default_origins
                .iter()
                .map(|o| o.parse::<header::HeaderValue>().unwrap())
                .collect()
        };

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers(Any)
        .allow_credentials(false)
}

/// Start the HTTP server
///
/// Binds to localhost only; this is a personal backend, not a shared
/// deployment.
///
/// # Errors
///
/// Returns an error if the listener fails to bind or the server stops
/// unexpectedly.
pub async fn serve(state: AppState, port: u16) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("127.0.0.1:{}", port);
    tracing::info!("🚀 TaskTree server starting on http://{}", addr);
    tracing::info!("📡 Event stream at http://{}/api/events", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
