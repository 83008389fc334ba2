//! Hierarchy Error Types
//!
//! Two failure classes come out of the hierarchy layer and they must not
//! be confused: a rejected move is a domain error the caller reports back
//! to the client, while a corrupted cache is an internal fault that calls
//! for a rebuild.

use crate::models::TodoId;
use thiserror::Error;

/// Errors raised by hierarchy traversal and move validation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HierarchyError {
    /// A move was rejected because it would make a todo its own ancestor.
    /// No state is mutated; both ends of the rejected edge are named.
    #[error("Moving todo {id} under {parent} would create a cycle")]
    CircularMove { id: TodoId, parent: TodoId },

    /// A traversal revisited an id, which means the cached parent mapping
    /// itself contains a cycle. This cannot result from validated moves;
    /// the cache must be rebuilt from the store.
    #[error("Hierarchy cache corrupted: todo {id} revisited during traversal")]
    CorruptedTopology { id: TodoId },
}

impl HierarchyError {
    /// Create a circular move rejection
    pub fn circular_move(id: TodoId, parent: TodoId) -> Self {
        Self::CircularMove { id, parent }
    }

    /// Create a corrupted topology error
    pub fn corrupted_topology(id: TodoId) -> Self {
        Self::CorruptedTopology { id }
    }

    /// True for faults that require a cache rebuild rather than a client fix
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::CorruptedTopology { .. })
    }
}
