//! Business Services
//!
//! This module contains the core business logic services:
//!
//! - `SyncedTodoRepository` - store/cache synchronization for the todo tree
//! - `TodoService` - todo operations, status history, events
//! - `ArticleService` - the flat read-later list
//! - `NoteIntegration` - completion hook for an external notes system
//!
//! Services coordinate between the database layer and application logic,
//! implementing business rules and orchestrating complex operations.

pub mod article_service;
pub mod error;
pub mod note_integration;
pub mod todo_repository;
pub mod todo_service;

pub use article_service::ArticleService;
pub use error::ServiceError;
pub use note_integration::{NoopNoteIntegration, NoteIntegration};
pub use todo_repository::{MoveOutcome, RemovedSubtree, SyncedTodoRepository};
pub use todo_service::{Breadcrumb, PrioritizedTodo, TodoService};
