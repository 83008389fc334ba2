//! TaskTree Core
//!
//! This crate provides the hierarchy engine, storage layer and service
//! orchestration for the TaskTree personal task tracker.
//!
//! # Architecture
//!
//! - **Hierarchy cache**: in-memory parent/child index over the todo
//!   forest; ancestor and subtree queries never touch the store
//! - **Synchronized repository**: every structural mutation persists
//!   first, then mirrors into the cache in one critical section
//! - **Status propagation**: a parent's status is derived from the max
//!   of its children's, rippling up to the root
//! - **libsql**: embedded SQLite-compatible database, WAL mode
//!
//! # Modules
//!
//! - [`models`] - Data structures (TodoItem, Article, events)
//! - [`hierarchy`] - Cache and tree consistency rules
//! - [`services`] - Business services (TodoService, ArticleService)
//! - [`db`] - Database layer with libsql integration
//! - [`api`] - axum REST surface and SSE event stream

pub mod api;
pub mod db;
pub mod hierarchy;
pub mod models;
pub mod services;

// Re-export commonly used types
pub use models::*;
pub use services::*;
