//! Service Layer Error Types
//!
//! This module defines error types for service-layer operations, layered
//! over the store and hierarchy errors they wrap.

use crate::db::StoreError;
use crate::hierarchy::HierarchyError;
use crate::models::{ArticleId, TodoId};
use thiserror::Error;

/// Service operation errors
///
/// High-level error type for all todo and article operations, with
/// proper error chaining to the store and hierarchy layers.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Todo not found by id
    #[error("Todo not found: {id}")]
    TodoNotFound { id: TodoId },

    /// Article not found by id
    #[error("Article not found: {id}")]
    ArticleNotFound { id: ArticleId },

    /// Referenced parent does not exist
    #[error("Invalid parent todo: {parent_id}")]
    InvalidParent { parent_id: TodoId },

    /// Input failed validation
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Store operation failed
    #[error("Store operation failed: {0}")]
    Store(#[from] StoreError),

    /// Hierarchy constraint violation or cache corruption
    #[error(transparent)]
    Hierarchy(#[from] HierarchyError),
}

impl ServiceError {
    /// Create a todo not found error
    pub fn todo_not_found(id: TodoId) -> Self {
        Self::TodoNotFound { id }
    }

    /// Create an article not found error
    pub fn article_not_found(id: ArticleId) -> Self {
        Self::ArticleNotFound { id }
    }

    /// Create an invalid parent error
    pub fn invalid_parent(parent_id: TodoId) -> Self {
        Self::InvalidParent { parent_id }
    }

    /// Create an invalid input error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::HierarchyError;

    #[test]
    fn test_error_messages() {
        let err = ServiceError::todo_not_found(42);
        assert_eq!(err.to_string(), "Todo not found: 42");

        let err = ServiceError::invalid_parent(7);
        assert_eq!(err.to_string(), "Invalid parent todo: 7");
    }

    #[test]
    fn test_hierarchy_error_is_transparent() {
        let err: ServiceError = HierarchyError::circular_move(1, 3).into();
        assert_eq!(
            err.to_string(),
            "Moving todo 1 under 3 would create a cycle"
        );
    }
}
