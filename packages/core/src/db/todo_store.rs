//! TodoStore Trait - Database Abstraction Layer
//!
//! This module defines the `TodoStore` trait that abstracts todo
//! persistence. The synchronized repository consumes this trait and never
//! talks to SQL directly, which keeps the store/cache lockstep logic
//! independent of the backend and lets tests substitute stores.
//!
//! # Design Decisions
//!
//! 1. **Async-first**: all methods are async; the embedded backend still
//!    awaits on connections and statement execution
//! 2. **Typed errors**: methods return [`StoreError`] so the service layer
//!    can chain store failures into its own error enum
//! 3. **Absence is data**: lookup and update methods return `Option`
//!    rather than an error for missing rows; the caller decides whether
//!    missing is a no-op or a domain error
//! 4. **No structural logic**: cycle checks, impact sets, and propagation
//!    order live in the hierarchy layer, not here

use crate::db::error::StoreError;
use crate::models::{NewTodo, StatusChange, TodoChanges, TodoId, TodoItem, TodoStatus};
use async_trait::async_trait;
use std::collections::HashSet;

/// Abstraction layer for todo persistence operations
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; the repository shares one store
/// behind an `Arc` across concurrent request handlers.
#[async_trait]
pub trait TodoStore: Send + Sync {
    //
    // CORE CRUD OPERATIONS
    //

    /// Insert a new todo and return it with the store-assigned id and
    /// timestamps filled in.
    async fn insert(&self, new: NewTodo) -> Result<TodoItem, StoreError>;

    /// Fetch a todo by id (None if it does not exist)
    async fn find_by_id(&self, id: TodoId) -> Result<Option<TodoItem>, StoreError>;

    /// Apply a sparse update and return the updated todo.
    ///
    /// Returns `Ok(None)` when no row with `id` exists. Bumps
    /// `last_interacted_at` whenever anything changed.
    async fn update_fields(
        &self,
        id: TodoId,
        changes: &TodoChanges,
    ) -> Result<Option<TodoItem>, StoreError>;

    /// Delete every todo in `ids`, returning the number of rows removed.
    ///
    /// The caller passes the full impact set (todo plus subtree); this
    /// method performs no cascade computation of its own.
    async fn delete_many(&self, ids: &HashSet<TodoId>) -> Result<u64, StoreError>;

    //
    // STRUCTURAL FIELD WRITES
    //

    /// Persist a new parent pointer (None = make the todo a root).
    /// Returns the number of rows affected.
    async fn set_parent(&self, id: TodoId, parent: Option<TodoId>) -> Result<u64, StoreError>;

    /// Persist a new status and bump `last_interacted_at`.
    /// Returns the number of rows affected.
    async fn set_status(&self, id: TodoId, status: TodoStatus) -> Result<u64, StoreError>;

    //
    // HIERARCHY SUPPORT
    //

    /// Direct children of `id`
    async fn find_children_of(&self, id: TodoId) -> Result<Vec<TodoItem>, StoreError>;

    /// Every (id, parent_id) pair in the store.
    ///
    /// This is the cache rebuild source: the whole forest in one query.
    async fn all_parent_child_pairs(&self) -> Result<Vec<(TodoId, Option<TodoId>)>, StoreError>;

    /// The subset of `ids` that exists in the store.
    ///
    /// Reconciliation diffs this against the cache to find relations that
    /// point at rows deleted out-of-band.
    async fn existing_ids(&self, ids: &HashSet<TodoId>) -> Result<HashSet<TodoId>, StoreError>;

    /// Every todo in the store (listing support)
    async fn all_todos(&self) -> Result<Vec<TodoItem>, StoreError>;

    //
    // STATUS HISTORY
    //

    /// Record one status transition
    async fn record_status_change(&self, change: StatusChange) -> Result<(), StoreError>;

    /// Status transitions of one todo, newest first
    async fn history_of(&self, id: TodoId) -> Result<Vec<StatusChange>, StoreError>;

    /// Remove all history rows belonging to the given todos.
    ///
    /// Called by the service layer as part of the delete cascade.
    async fn delete_history_for(&self, ids: &HashSet<TodoId>) -> Result<u64, StoreError>;
}
