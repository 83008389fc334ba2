//! Database Connection Management
//!
//! This module provides the core database connection and initialization
//! functionality using libsql for TaskTree's relational storage.
//!
//! # Architecture
//!
//! - **Path-agnostic**: Accepts any valid PathBuf; the parent directory is
//!   created on demand
//! - **Idempotent schema**: CREATE TABLE IF NOT EXISTS only, safe to run on
//!   every startup
//! - **WAL mode**: Write-Ahead Logging for better concurrency
//! - **Foreign keys**: Enabled for referential integrity
//!
//! # Connection Patterns
//!
//! Use `connect_with_timeout()` in async functions. The 5-second busy
//! timeout makes concurrent operations wait and retry instead of failing
//! immediately with `SQLITE_BUSY` when the Tokio runtime interleaves
//! statements from different tasks.

use crate::db::error::StoreError;
use libsql::{Builder, Database};
use std::path::PathBuf;
use std::sync::Arc;

/// Database service for managing the libsql connection and schema
///
/// # Examples
///
/// ```no_run
/// use tasktree_core::db::DatabaseService;
/// use std::path::PathBuf;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let db = DatabaseService::new(PathBuf::from("./data/tasktree.db")).await?;
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct DatabaseService {
    /// libsql database handle (wrapped in Arc for sharing)
    pub db: Arc<Database>,

    /// Path to the database file
    pub db_path: PathBuf,
}

impl DatabaseService {
    /// Create a new DatabaseService with the specified database path
    ///
    /// This will:
    /// 1. Ensure the parent directory exists (create if needed)
    /// 2. Open/create the database file
    /// 3. Initialize the schema (CREATE TABLE IF NOT EXISTS)
    /// 4. Enable SQLite features (WAL mode, foreign keys, busy timeout)
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the parent directory cannot be created, the
    /// connection fails, or schema initialization fails.
    pub async fn new(db_path: PathBuf) -> Result<Self, StoreError> {
        // Whether the file exists decides if we force a WAL checkpoint
        // after schema creation (fresh databases only).
        let is_new_database = !db_path.exists();

        // Ensure parent directory exists
        if let Some(parent) = db_path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent).map_err(StoreError::DirectoryCreationFailed)?;
            }
        }

        // Open database connection using Builder pattern
        let db = Builder::new_local(&db_path)
            .build()
            .await
            .map_err(|e| StoreError::connection_failed(db_path.clone(), e))?;

        let service = Self {
            db: Arc::new(db),
            db_path,
        };

        service.initialize_schema(is_new_database).await?;

        Ok(service)
    }

    /// Get a raw connection without the busy timeout configured.
    ///
    /// Only for single-threaded synchronous contexts; async code uses
    /// [`connect_with_timeout`](Self::connect_with_timeout).
    pub fn connect(&self) -> Result<libsql::Connection, StoreError> {
        self.db.connect().map_err(StoreError::LibsqlError)
    }

    /// Get an async connection with the busy timeout configured.
    ///
    /// Sets a 5-second busy timeout so concurrent operations wait and
    /// retry instead of failing immediately when the database is locked.
    pub async fn connect_with_timeout(&self) -> Result<libsql::Connection, StoreError> {
        let conn = self.connect()?;

        self.execute_pragma(&conn, "PRAGMA busy_timeout = 5000")
            .await?;

        Ok(conn)
    }

    /// Execute a PRAGMA statement
    ///
    /// PRAGMA statements return rows, so we must use query() instead of
    /// execute(). This helper encapsulates that pattern.
    async fn execute_pragma(
        &self,
        conn: &libsql::Connection,
        pragma: &str,
    ) -> Result<(), StoreError> {
        let mut stmt = conn.prepare(pragma).await.map_err(|e| {
            StoreError::sql_execution(format!("Failed to execute '{}': {}", pragma, e))
        })?;
        let _ = stmt.query(()).await.map_err(|e| {
            StoreError::sql_execution(format!("Failed to execute '{}': {}", pragma, e))
        })?;
        Ok(())
    }

    /// Initialize database schema and configuration
    ///
    /// Creates tables and indexes using CREATE TABLE IF NOT EXISTS,
    /// ensuring idempotent initialization (safe to call multiple times).
    ///
    /// # Schema
    ///
    /// - `todos`: hierarchical task items (`parent_id` self-reference with
    ///   ON DELETE CASCADE as a backstop for out-of-band deletes)
    /// - `status_history`: recorded status transitions, removed explicitly
    ///   by the service layer when the owning todo goes away
    /// - `articles`: flat read-later items
    async fn initialize_schema(&self, is_new_database: bool) -> Result<(), StoreError> {
        let conn = self.connect_with_timeout().await?;

        // Enable WAL mode for better concurrency
        self.execute_pragma(&conn, "PRAGMA journal_mode = WAL")
            .await?;

        // Enable foreign key constraints
        self.execute_pragma(&conn, "PRAGMA foreign_keys = ON")
            .await?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS todos (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                parent_id INTEGER,
                title TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'BACKLOG',
                priority INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                last_interacted_at TEXT NOT NULL,
                FOREIGN KEY (parent_id) REFERENCES todos(id) ON DELETE CASCADE
            )",
            (),
        )
        .await
        .map_err(|e| StoreError::sql_execution(format!("Failed to create todos table: {}", e)))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS status_history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                todo_id INTEGER NOT NULL,
                from_status TEXT NOT NULL,
                to_status TEXT NOT NULL,
                changed_at TEXT NOT NULL
            )",
            (),
        )
        .await
        .map_err(|e| {
            StoreError::sql_execution(format!("Failed to create status_history table: {}", e))
        })?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS articles (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                url TEXT,
                note TEXT,
                read INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                last_interacted_at TEXT NOT NULL
            )",
            (),
        )
        .await
        .map_err(|e| {
            StoreError::sql_execution(format!("Failed to create articles table: {}", e))
        })?;

        self.create_core_indexes(&conn).await?;

        // Force WAL checkpoint only for newly created databases. This
        // prevents races where rapid database creation in tests observes
        // "no such table" because WAL entries were not yet flushed.
        if is_new_database {
            self.execute_pragma(&conn, "PRAGMA wal_checkpoint(TRUNCATE)")
                .await?;
        }

        Ok(())
    }

    /// Create core indexes
    ///
    /// These never change (no ALTER TABLE required on user machines).
    async fn create_core_indexes(&self, conn: &libsql::Connection) -> Result<(), StoreError> {
        // Index on parent_id (hierarchy queries and rebuild)
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_todos_parent ON todos(parent_id)",
            (),
        )
        .await
        .map_err(|e| {
            StoreError::sql_execution(format!("Failed to create index 'idx_todos_parent': {}", e))
        })?;

        // Index on status (prioritized listing filter)
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_todos_status ON todos(status)",
            (),
        )
        .await
        .map_err(|e| {
            StoreError::sql_execution(format!("Failed to create index 'idx_todos_status': {}", e))
        })?;

        // Index on todo_id (history lookup and cascade delete)
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_history_todo ON status_history(todo_id)",
            (),
        )
        .await
        .map_err(|e| {
            StoreError::sql_execution(format!("Failed to create index 'idx_history_todo': {}", e))
        })?;

        // Index on read flag (unread-first listing)
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_articles_read ON articles(read)",
            (),
        )
        .await
        .map_err(|e| {
            StoreError::sql_execution(format!("Failed to create index 'idx_articles_read': {}", e))
        })?;

        Ok(())
    }
}
