//! Database Layer
//!
//! This module handles all persistence using libsql (SQLite):
//!
//! - Database initialization, schema creation and pragmas
//! - The [`TodoStore`] trait: the seam between the hierarchy engine and
//!   relational storage
//! - Concrete libsql-backed stores for todos and articles
//!
//! The hierarchy cache treats this layer as the source of truth: on
//! startup the full parent/child table is read once and the cache is
//! rebuilt from it.

mod database;
mod error;
mod sqlite_store;
mod todo_store;

pub use database::DatabaseService;
pub use error::StoreError;
pub use sqlite_store::{ArticleStore, SqliteTodoStore};
pub use todo_store::TodoStore;
