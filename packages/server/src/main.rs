//! TaskTree HTTP Server Binary
//!
//! Standalone binary exposing the TaskTree backend as a localhost REST
//! API with an SSE event stream.
//!
//! # Usage
//!
//! ```bash
//! # Start with default settings (port 4680, ~/.tasktree/tasktree.db)
//! cargo run --bin tasktree-server
//!
//! # Custom port and database
//! TASKTREE_PORT=4681 TASKTREE_DB=/tmp/tasktree.db cargo run --bin tasktree-server
//! ```
//!
//! # Environment Variables
//!
//! - `TASKTREE_CONFIG`: Config file path (default: ~/.tasktree/config.json)
//! - `TASKTREE_DB`: Database file path
//! - `TASKTREE_PORT`: Server port (default: 4680)
//! - `RUST_LOG`: Logging level (e.g., "info", "debug", "trace")
//!
//! # Security
//!
//! Personal single-user backend: binds to localhost only, no
//! authentication.

mod config;

use std::sync::Arc;
use std::time::Duration;

use tasktree_core::api::{self, AppState};
use tasktree_core::db::{ArticleStore, DatabaseService, SqliteTodoStore, TodoStore};
use tasktree_core::services::{ArticleService, SyncedTodoRepository, TodoService};

use config::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("🚀 TaskTree Server");
    tracing::info!("==================================");

    let config = ServerConfig::load()?;
    let db_path = config.database_path()?;

    tracing::info!("📦 Database: {}", db_path.display());
    tracing::info!("📡 Port: {}", config.http.port);

    tracing::info!("🔧 Initializing services...");

    let db = DatabaseService::new(db_path).await?;
    let store: Arc<dyn TodoStore> = Arc::new(SqliteTodoStore::new(db.clone()));
    let article_store = ArticleStore::new(db);

    let repo = Arc::new(SyncedTodoRepository::open(store.clone()).await?);
    let todos = Arc::new(TodoService::new(repo, store));
    let articles = Arc::new(ArticleService::new(article_store, todos.event_sender()));

    tracing::info!("✅ Services initialized");

    if config.reconcile.enabled {
        spawn_reconciler(todos.clone(), config.reconcile.interval_secs);
    }

    api::serve(
        AppState { todos, articles },
        config.http.port,
    )
    .await
}

/// Periodically drop cache relations for rows deleted out of band
fn spawn_reconciler(todos: Arc<TodoService>, interval_secs: u64) {
    tracing::info!("🧹 Cache reconciler running every {}s", interval_secs);

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
        // The first tick fires immediately; right after startup the
        // cache was just built, so skip it.
        interval.tick().await;

        loop {
            interval.tick().await;
            match todos.reconcile_all().await {
                Ok(stale) if stale.is_empty() => {
                    tracing::debug!("Cache reconcile: clean");
                }
                Ok(stale) => {
                    tracing::info!("Cache reconcile dropped {} stale todos", stale.len());
                }
                Err(e) => {
                    tracing::warn!("Cache reconcile failed: {}", e);
                }
            }
        }
    });
}
