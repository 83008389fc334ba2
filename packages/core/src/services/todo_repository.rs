//! Synchronized Todo Repository
//!
//! Keeps the in-memory [`HierarchyCache`] and the relational store in
//! lockstep. Every structural mutation follows the same shape:
//!
//! 1. take the mutation lock (single logical writer)
//! 2. validate against the current cache
//! 3. persist to the store
//! 4. mirror the change into the cache
//!
//! The cache is only ever touched after the store write succeeds, so a
//! failed store call leaves the pair consistent. Multi-relation cache
//! updates (delete, reconcile) happen under one write guard so readers
//! never observe a half-applied forest.
//!
//! Status propagation lives here as well because it has to read child
//! statuses and write ancestor statuses inside the same critical section
//! as the triggering mutation.

use crate::db::TodoStore;
use crate::hierarchy::{
    propagation_order, removal_impact, validate_move, CacheStats, HierarchyCache, HierarchyError,
    MoveCheck,
};
use crate::models::{NewTodo, StatusRipple, TodoChanges, TodoId, TodoItem, TodoStatus};
use crate::services::error::ServiceError;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// What a move request did.
///
/// Moves on unknown ids and self-parent moves are deliberate no-ops, not
/// errors; callers that need to react (event emission, follow-up
/// propagation) branch on this.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The parent pointer changed. `old_parent` is the pre-move parent,
    /// kept so the vacated chain can be recomputed.
    Applied { old_parent: Option<TodoId> },
    /// Nothing was written (unknown id or self-parent request).
    Skipped,
}

/// Result of a cascading delete.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemovedSubtree {
    /// Every id removed: the requested todo plus all its descendants.
    pub removed: HashSet<TodoId>,
    /// Parent the deleted todo hung under, if any. The caller recomputes
    /// that chain since it just lost a child.
    pub old_parent: Option<TodoId>,
}

/// Repository pairing the relational store with the hierarchy cache.
///
/// Constructed via [`open`](Self::open), which loads the full parent
/// table and builds the cache before the value exists. There is no
/// uninitialized state to misuse.
pub struct SyncedTodoRepository {
    store: Arc<dyn TodoStore>,
    cache: RwLock<HierarchyCache>,
    write_lock: Mutex<()>,
}

impl SyncedTodoRepository {
    /// Open the repository: load all `(id, parent)` pairs from the store
    /// and build the hierarchy cache from them.
    pub async fn open(store: Arc<dyn TodoStore>) -> Result<Self, ServiceError> {
        let pairs = store.all_parent_child_pairs().await?;

        let mut cache = HierarchyCache::new();
        cache.rebuild(pairs);

        let stats = cache.stats();
        tracing::info!(
            "Hierarchy cache built: {} relations across {} parents",
            stats.relations,
            stats.parents
        );

        Ok(Self {
            store,
            cache: RwLock::new(cache),
            write_lock: Mutex::new(()),
        })
    }

    /// Rebuild the cache wholesale from the store.
    ///
    /// Recovery path after corruption or suspected divergence; the swap
    /// happens under the mutation lock so no writer observes the old
    /// forest.
    pub async fn reload(&self) -> Result<(), ServiceError> {
        let _write_guard = self.write_lock.lock().await;

        let pairs = self.store.all_parent_child_pairs().await?;

        let mut cache = self.cache.write().await;
        cache.rebuild(pairs);

        let stats = cache.stats();
        tracing::info!(
            "Hierarchy cache reloaded: {} relations across {} parents",
            stats.relations,
            stats.parents
        );

        Ok(())
    }

    /// Create a todo. The store assigns the id; the cache learns the
    /// relation afterwards.
    ///
    /// A requested parent that does not exist is rejected with
    /// `InvalidParent` before anything is written.
    pub async fn create(&self, new: NewTodo) -> Result<TodoItem, ServiceError> {
        let _write_guard = self.write_lock.lock().await;

        if let Some(parent_id) = new.parent_id {
            if self.store.find_by_id(parent_id).await?.is_none() {
                return Err(ServiceError::invalid_parent(parent_id));
            }
        }

        let todo = self.store.insert(new).await?;

        if todo.parent_id.is_some() {
            let mut cache = self.cache.write().await;
            cache.set_relation(todo.id, todo.parent_id);
        }

        Ok(todo)
    }

    /// Re-parent a todo (`None` detaches it to the root level).
    ///
    /// Validation and application form one critical section, so the
    /// cycle check always runs against the forest the write lands in.
    /// Unknown ids and self-parent requests are skipped without writes;
    /// a cycle is a hard error naming both ids.
    pub async fn move_todo(
        &self,
        id: TodoId,
        new_parent: Option<TodoId>,
    ) -> Result<MoveOutcome, ServiceError> {
        let _write_guard = self.write_lock.lock().await;

        let Some(current) = self.store.find_by_id(id).await? else {
            tracing::debug!("Ignoring move of unknown todo {}", id);
            return Ok(MoveOutcome::Skipped);
        };

        if let Some(parent_id) = new_parent {
            if parent_id != id && self.store.find_by_id(parent_id).await?.is_none() {
                return Err(ServiceError::invalid_parent(parent_id));
            }
        }

        {
            let cache = self.cache.read().await;
            match validate_move(&cache, id, new_parent).map_err(Self::escalate)? {
                MoveCheck::Apply => {}
                MoveCheck::Skip => return Ok(MoveOutcome::Skipped),
            }
        }

        if current.parent_id == new_parent {
            return Ok(MoveOutcome::Skipped);
        }

        self.store.set_parent(id, new_parent).await?;

        let mut cache = self.cache.write().await;
        cache.set_relation(id, new_parent);

        Ok(MoveOutcome::Applied {
            old_parent: current.parent_id,
        })
    }

    /// Delete a todo and its whole subtree.
    ///
    /// The impact set is computed from the cache before anything is
    /// mutated, then the store delete and the cache cleanup both work
    /// from that snapshot. Unknown id returns an empty result.
    pub async fn delete(&self, id: TodoId) -> Result<RemovedSubtree, ServiceError> {
        let _write_guard = self.write_lock.lock().await;

        let Some(current) = self.store.find_by_id(id).await? else {
            tracing::debug!("Ignoring delete of unknown todo {}", id);
            return Ok(RemovedSubtree::default());
        };

        let removed = {
            let cache = self.cache.read().await;
            removal_impact(&cache, id).map_err(Self::escalate)?
        };

        self.store.delete_many(&removed).await?;

        {
            let mut cache = self.cache.write().await;
            for &gone in &removed {
                cache.remove_relation(gone);
            }
        }

        Ok(RemovedSubtree {
            removed,
            old_parent: current.parent_id,
        })
    }

    /// Set a todo's status and ripple the change up its ancestor chain.
    ///
    /// Returns the refreshed todo and one [`StatusRipple`] per ancestor
    /// whose stored status actually changed. Unknown id is an error here
    /// (updates name a todo the caller believes exists).
    pub async fn update_status_and_propagate(
        &self,
        id: TodoId,
        new_status: TodoStatus,
    ) -> Result<(TodoItem, Vec<StatusRipple>), ServiceError> {
        let _write_guard = self.write_lock.lock().await;

        let current = self
            .store
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::todo_not_found(id))?;

        if current.status == new_status {
            return Ok((current, Vec::new()));
        }

        self.store.set_status(id, new_status).await?;

        let order = {
            let cache = self.cache.read().await;
            propagation_order(&cache, id).map_err(Self::escalate)?
        };
        let ripples = self.recompute_order(order).await?;

        let refreshed = self
            .store
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::todo_not_found(id))?;

        Ok((refreshed, ripples))
    }

    /// Sparse non-structural update (title, priority).
    ///
    /// Status is intentionally excluded; it must travel through
    /// [`update_status_and_propagate`](Self::update_status_and_propagate)
    /// so ancestors stay consistent.
    pub async fn update_fields(
        &self,
        id: TodoId,
        changes: &TodoChanges,
    ) -> Result<TodoItem, ServiceError> {
        let _write_guard = self.write_lock.lock().await;

        self.store
            .update_fields(id, changes)
            .await?
            .ok_or_else(|| ServiceError::todo_not_found(id))
    }

    /// Recompute the ancestor chain of `id` (nearest first, all the way
    /// to the root). Used after a todo gained a new place in the forest.
    pub async fn propagate_from(&self, id: TodoId) -> Result<Vec<StatusRipple>, ServiceError> {
        let _write_guard = self.write_lock.lock().await;

        let order = {
            let cache = self.cache.read().await;
            propagation_order(&cache, id).map_err(Self::escalate)?
        };
        self.recompute_order(order).await
    }

    /// Recompute `start` itself and then its ancestor chain. Used after
    /// `start` lost a child (move away or delete), since its own derived
    /// status may drop.
    pub async fn recompute_chain(&self, start: TodoId) -> Result<Vec<StatusRipple>, ServiceError> {
        let _write_guard = self.write_lock.lock().await;

        let mut order = vec![start];
        {
            let cache = self.cache.read().await;
            order.extend(propagation_order(&cache, start).map_err(Self::escalate)?);
        }
        self.recompute_order(order).await
    }

    /// Drop cache relations for ids the store no longer has.
    ///
    /// Candidates are expanded with their cached descendants before the
    /// store is asked which ids still exist; relations of the missing
    /// ones are removed under one write guard. Self-healing for rows
    /// deleted out of band (foreign-key cascade, manual SQL).
    ///
    /// Returns the stale ids, sorted.
    pub async fn reconcile(
        &self,
        candidates: HashSet<TodoId>,
    ) -> Result<Vec<TodoId>, ServiceError> {
        let _write_guard = self.write_lock.lock().await;

        let expanded = {
            let cache = self.cache.read().await;
            let mut expanded = HashSet::new();
            for &id in &candidates {
                expanded.insert(id);
                expanded.extend(cache.subtree_ids(id).map_err(Self::escalate)?);
            }
            expanded
        };

        if expanded.is_empty() {
            return Ok(Vec::new());
        }

        let existing = self.store.existing_ids(&expanded).await?;
        let mut stale: Vec<TodoId> = expanded.difference(&existing).copied().collect();
        stale.sort_unstable();

        if !stale.is_empty() {
            let mut cache = self.cache.write().await;
            for &gone in &stale {
                // Detach surviving children first so they become roots
                // instead of pointing at a missing parent.
                for child in cache.children_of(gone) {
                    cache.remove_relation(child);
                }
                cache.remove_relation(gone);
            }
            tracing::warn!(
                "Reconciled hierarchy cache: dropped {} stale todos: {:?}",
                stale.len(),
                stale
            );
        }

        Ok(stale)
    }

    /// Ancestor ids of `id`, root first.
    pub async fn ancestors_of(&self, id: TodoId) -> Result<Vec<TodoId>, ServiceError> {
        let cache = self.cache.read().await;
        cache.ancestor_chain(id).map_err(Self::escalate)
    }

    /// Every descendant id of `id` (excluding `id` itself).
    pub async fn descendants_of(&self, id: TodoId) -> Result<HashSet<TodoId>, ServiceError> {
        let cache = self.cache.read().await;
        cache.subtree_ids(id).map_err(Self::escalate)
    }

    /// Ids the cache currently tracks (any id on either side of a
    /// relation).
    pub async fn tracked_ids(&self) -> HashSet<TodoId> {
        self.cache.read().await.tracked_ids()
    }

    /// Cache size counters, for logs and the health endpoint.
    pub async fn cache_stats(&self) -> CacheStats {
        self.cache.read().await.stats()
    }

    /// Fetch a single todo.
    pub async fn todo(&self, id: TodoId) -> Result<Option<TodoItem>, ServiceError> {
        Ok(self.store.find_by_id(id).await?)
    }

    /// Direct children of `id`, from the store.
    pub async fn children_of(&self, id: TodoId) -> Result<Vec<TodoItem>, ServiceError> {
        Ok(self.store.find_children_of(id).await?)
    }

    /// Every todo in the store.
    pub async fn all_todos(&self) -> Result<Vec<TodoItem>, ServiceError> {
        Ok(self.store.all_todos().await?)
    }

    /// Recompute the derived status of each id in `order`.
    ///
    /// For every entry: read its direct children from the store, take
    /// the max of their statuses, persist it when it differs from the
    /// stored value. Childless entries keep their own status. The walk
    /// never stops early; a farther ancestor can still disagree with its
    /// children even when a nearer one came out unchanged.
    ///
    /// Caller holds the mutation lock.
    async fn recompute_order(&self, order: Vec<TodoId>) -> Result<Vec<StatusRipple>, ServiceError> {
        let mut ripples = Vec::new();

        for ancestor_id in order {
            let children = self.store.find_children_of(ancestor_id).await?;
            let Some(derived) = children.iter().map(|c| c.status).max() else {
                continue;
            };

            let Some(ancestor) = self.store.find_by_id(ancestor_id).await? else {
                continue;
            };

            if ancestor.status != derived {
                self.store.set_status(ancestor_id, derived).await?;
                ripples.push(StatusRipple {
                    id: ancestor_id,
                    from: ancestor.status,
                    to: derived,
                });
            }
        }

        Ok(ripples)
    }

    /// Convert a hierarchy error, logging loudly when it signals cache
    /// corruption. Corruption means the forest invariant broke; callers
    /// are expected to [`reload`](Self::reload).
    fn escalate(err: HierarchyError) -> ServiceError {
        if err.is_fatal() {
            tracing::error!("Hierarchy cache corrupted: {}. Reload required.", err);
        }
        ServiceError::from(err)
    }
}
