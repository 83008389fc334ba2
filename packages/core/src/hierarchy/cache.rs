//! In-Memory Hierarchy Cache
//!
//! Denormalized parent/child index over the persisted todo forest. The
//! cache answers ancestor and subtree queries without touching the store:
//! O(1) average parent and children lookup, O(depth) ancestor chains,
//! O(subtree) descendant collection.
//!
//! # Invariants
//!
//! - **Mirror**: `child_to_parent[c] == p` exactly when `c` is in
//!   `parent_to_children[p]`. Every mutation updates both maps together.
//! - **Forest**: no id is its own ancestor. Enforced upstream by move
//!   validation; traversals still guard against revisits and report
//!   [`HierarchyError::CorruptedTopology`] instead of looping forever.
//! - **Store-derived**: the cache holds only ids. It is rebuilt wholesale
//!   from the store's (id, parent) pairs at startup and on reload, and is
//!   never persisted itself.
//!
//! The cache is a plain data structure with no locking; the owning
//! repository wraps it in an `RwLock` and serializes writers.

use crate::hierarchy::error::HierarchyError;
use crate::models::TodoId;
use serde::Serialize;
use std::collections::{HashMap, HashSet, VecDeque};

/// Parent/child index over todo ids.
#[derive(Debug, Clone, Default)]
pub struct HierarchyCache {
    /// child id -> parent id (absent = root)
    child_to_parent: HashMap<TodoId, TodoId>,

    /// parent id -> direct children (absent or empty = leaf)
    parent_to_children: HashMap<TodoId, HashSet<TodoId>>,
}

impl HierarchyCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace the parent relation of `child`.
    ///
    /// Any existing relation for `child` is removed first, so redundant
    /// calls and re-parenting both collapse into one code path. Passing
    /// `None` leaves `child` as a root (equivalent to
    /// [`remove_relation`](Self::remove_relation)).
    pub fn set_relation(&mut self, child: TodoId, parent: Option<TodoId>) {
        self.remove_relation(child);

        if let Some(parent) = parent {
            self.child_to_parent.insert(child, parent);
            self.parent_to_children
                .entry(parent)
                .or_default()
                .insert(child);
        }
    }

    /// Remove the parent relation of `child`, if any.
    ///
    /// Empty child sets are pruned so the reverse map never accumulates
    /// stale parent entries. Relations where `child` is the parent are
    /// untouched; callers removing a whole subtree call this once per
    /// impacted id.
    pub fn remove_relation(&mut self, child: TodoId) {
        if let Some(old_parent) = self.child_to_parent.remove(&child) {
            if let Some(siblings) = self.parent_to_children.get_mut(&old_parent) {
                siblings.remove(&child);
                if siblings.is_empty() {
                    self.parent_to_children.remove(&old_parent);
                }
            }
        }
    }

    /// Parent of `id`, or None for roots and unknown ids
    pub fn parent_of(&self, id: TodoId) -> Option<TodoId> {
        self.child_to_parent.get(&id).copied()
    }

    /// Direct children of `id` (empty for leaves and unknown ids)
    pub fn children_of(&self, id: TodoId) -> Vec<TodoId> {
        self.parent_to_children
            .get(&id)
            .map(|children| children.iter().copied().collect())
            .unwrap_or_default()
    }

    /// True if `id` participates in any relation, as child or parent.
    ///
    /// Note that a root todo without children is legitimately absent from
    /// the cache; existence checks belong to the store.
    pub fn contains(&self, id: TodoId) -> bool {
        self.child_to_parent.contains_key(&id) || self.parent_to_children.contains_key(&id)
    }

    /// Every id participating in any relation
    pub fn tracked_ids(&self) -> HashSet<TodoId> {
        let mut ids: HashSet<TodoId> = self.child_to_parent.keys().copied().collect();
        ids.extend(self.parent_to_children.keys().copied());
        ids
    }

    /// Number of parent/child relations currently cached
    pub fn relation_count(&self) -> usize {
        self.child_to_parent.len()
    }

    /// True when no relation is cached
    pub fn is_empty(&self) -> bool {
        self.child_to_parent.is_empty()
    }

    /// Walk from `id` to its root and return the ancestor ids root-first.
    ///
    /// `id` itself is not part of the chain; roots and unknown ids yield
    /// an empty vec. A revisited id during the walk means the mapping
    /// contains a cycle and traversal aborts with
    /// [`HierarchyError::CorruptedTopology`].
    pub fn ancestor_chain(&self, id: TodoId) -> Result<Vec<TodoId>, HierarchyError> {
        let mut chain = Vec::new();
        let mut visited = HashSet::from([id]);
        let mut current = id;

        while let Some(parent) = self.child_to_parent.get(&current).copied() {
            if !visited.insert(parent) {
                return Err(HierarchyError::corrupted_topology(parent));
            }
            chain.push(parent);
            current = parent;
        }

        chain.reverse();
        Ok(chain)
    }

    /// Collect every descendant of `id` by breadth-first traversal.
    ///
    /// The result excludes `id` itself; leaves and unknown ids yield an
    /// empty set. The same revisit guard as
    /// [`ancestor_chain`](Self::ancestor_chain) applies.
    pub fn subtree_ids(&self, id: TodoId) -> Result<HashSet<TodoId>, HierarchyError> {
        let mut descendants = HashSet::new();
        let mut queue = VecDeque::from([id]);

        while let Some(current) = queue.pop_front() {
            if let Some(children) = self.parent_to_children.get(&current) {
                for &child in children {
                    if child == id || !descendants.insert(child) {
                        return Err(HierarchyError::corrupted_topology(child));
                    }
                    queue.push_back(child);
                }
            }
        }

        Ok(descendants)
    }

    /// Discard all relations and rebuild from (child, parent) pairs.
    ///
    /// Pairs with `None` parents are accepted and simply leave the child
    /// unregistered, so the store can hand over its full id/parent listing
    /// unfiltered. Rebuilding from the same pairs is idempotent.
    pub fn rebuild<I>(&mut self, pairs: I)
    where
        I: IntoIterator<Item = (TodoId, Option<TodoId>)>,
    {
        self.child_to_parent.clear();
        self.parent_to_children.clear();

        for (child, parent) in pairs {
            self.set_relation(child, parent);
        }
    }

    /// Get cache statistics (for logging/monitoring)
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            relations: self.child_to_parent.len(),
            parents: self.parent_to_children.len(),
        }
    }
}

/// Statistics about the hierarchy cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Number of child -> parent relations
    pub relations: usize,
    /// Number of distinct parents with at least one child
    pub parents: usize,
}
