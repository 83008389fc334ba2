//! Hierarchy Cache and Consistency Layer
//!
//! The in-memory side of the todo forest: a denormalized parent/child
//! index ([`HierarchyCache`]) plus the pure rules that keep it a forest
//! ([`consistency`]). The synchronized repository in `services` owns the
//! cache, wraps it in a lock, and keeps it in lockstep with the store.

pub mod cache;
pub mod consistency;
pub mod error;

pub use cache::{CacheStats, HierarchyCache};
pub use consistency::{propagation_order, removal_impact, validate_move, MoveCheck};
pub use error::HierarchyError;
