//! Tree Consistency Rules
//!
//! Pure decision functions over the [`HierarchyCache`]: move validation,
//! the ancestor visit order for status propagation, and the impact set of
//! a subtree removal. Nothing here touches the store or mutates the
//! cache; the synchronized repository applies what these functions
//! decide, which keeps the rules trivially testable.

use crate::hierarchy::cache::HierarchyCache;
use crate::hierarchy::error::HierarchyError;
use crate::models::TodoId;
use std::collections::HashSet;

/// Outcome of move validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveCheck {
    /// The move is structurally sound and should be applied
    Apply,
    /// The move is a no-op (e.g. a todo moved under itself); apply nothing
    Skip,
}

/// Validate re-parenting `id` under `new_parent` against the current forest.
///
/// Rules, in order:
/// - moving to root (`None`) is always sound
/// - a self-parent request is a harmless no-op, not an error
/// - if `id` appears in the inclusive ancestor chain of `new_parent`, the
///   move would make `id` its own ancestor and is rejected with
///   [`HierarchyError::CircularMove`] naming both ids
///
/// Existence of the involved todos is the store's concern; the caller
/// checks it before asking for validation.
pub fn validate_move(
    cache: &HierarchyCache,
    id: TodoId,
    new_parent: Option<TodoId>,
) -> Result<MoveCheck, HierarchyError> {
    let Some(parent) = new_parent else {
        return Ok(MoveCheck::Apply);
    };

    if parent == id {
        return Ok(MoveCheck::Skip);
    }

    // The inclusive chain is {parent} plus parent's ancestors; the
    // parent == id case is already handled above.
    if cache.ancestor_chain(parent)?.contains(&id) {
        return Err(HierarchyError::circular_move(id, parent));
    }

    Ok(MoveCheck::Apply)
}

/// Ancestors of `id` in the order status propagation visits them:
/// nearest first, root last.
///
/// Every ancestor is part of the order. Propagation must not stop early
/// just because one ancestor's status comes out unchanged; a farther
/// ancestor can still disagree with its children.
pub fn propagation_order(
    cache: &HierarchyCache,
    id: TodoId,
) -> Result<Vec<TodoId>, HierarchyError> {
    let mut chain = cache.ancestor_chain(id)?;
    chain.reverse();
    Ok(chain)
}

/// The full set of ids removed when `id` is deleted: the todo itself plus
/// every descendant.
///
/// Computed from the cache BEFORE any mutation, so the store delete and
/// the cache cleanup work from the same snapshot.
pub fn removal_impact(
    cache: &HierarchyCache,
    id: TodoId,
) -> Result<HashSet<TodoId>, HierarchyError> {
    let mut impact = cache.subtree_ids(id)?;
    impact.insert(id);
    Ok(impact)
}
