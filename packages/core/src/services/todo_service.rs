//! Todo Service
//!
//! Orchestration layer over [`SyncedTodoRepository`]: status history,
//! domain events, the note integration hook and the prioritized listing
//! live here. The repository guarantees store/cache consistency; this
//! layer decides what a mutation *means* (which history rows to write,
//! which events to broadcast, when the notes system hears about a
//! completion).

use crate::db::TodoStore;
use crate::hierarchy::CacheStats;
use crate::models::{
    NewTodo, StatusChange, StatusRipple, TodoChanges, TodoEvent, TodoId, TodoItem, TodoStatus,
};
use crate::services::error::ServiceError;
use crate::services::note_integration::{NoopNoteIntegration, NoteIntegration};
use crate::services::todo_repository::{MoveOutcome, RemovedSubtree, SyncedTodoRepository};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Capacity of the domain event broadcast channel.
///
/// Slow subscribers past this many buffered events get `Lagged` and skip
/// ahead; they do not block mutations.
const TODO_EVENT_CHANNEL_CAPACITY: usize = 128;

/// One ancestor step of a todo's path, root first
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Breadcrumb {
    pub id: TodoId,
    pub title: String,
}

/// A todo in the prioritized listing, with its ancestor path attached
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrioritizedTodo {
    #[serde(flatten)]
    pub todo: TodoItem,
    pub breadcrumb: Vec<Breadcrumb>,
}

/// High-level todo operations
pub struct TodoService {
    repo: Arc<SyncedTodoRepository>,
    store: Arc<dyn TodoStore>,
    notes: Arc<dyn NoteIntegration>,
    event_tx: broadcast::Sender<TodoEvent>,
}

impl TodoService {
    /// Create the service over an opened repository.
    ///
    /// `store` is the same store the repository wraps; the service uses
    /// it directly for status history rows.
    pub fn new(repo: Arc<SyncedTodoRepository>, store: Arc<dyn TodoStore>) -> Self {
        let (event_tx, _) = broadcast::channel(TODO_EVENT_CHANNEL_CAPACITY);

        Self {
            repo,
            store,
            notes: Arc::new(NoopNoteIntegration),
            event_tx,
        }
    }

    /// Attach a note integration (default is a no-op)
    pub fn with_note_integration(mut self, notes: Arc<dyn NoteIntegration>) -> Self {
        self.notes = notes;
        self
    }

    /// Returns a broadcast receiver for all todo and article events
    pub fn subscribe_to_events(&self) -> broadcast::Receiver<TodoEvent> {
        self.event_tx.subscribe()
    }

    /// The event sender itself, for collaborators (article service) that
    /// publish onto the same channel
    pub fn event_sender(&self) -> broadcast::Sender<TodoEvent> {
        self.event_tx.clone()
    }

    /// Emit a domain event to all subscribers
    ///
    /// Ignores errors if no subscribers (expected in some tests).
    fn emit_event(&self, event: TodoEvent) {
        let _ = self.event_tx.send(event);
    }

    /// Create a todo.
    ///
    /// When it lands under a parent, the new child's urgency is rippled
    /// upward immediately (a fresh `Backlog` child under a `Done` parent
    /// reopens that parent).
    pub async fn create_todo(&self, new: NewTodo) -> Result<TodoItem, ServiceError> {
        if new.title.trim().is_empty() {
            return Err(ServiceError::invalid_input("Todo title must not be empty"));
        }

        let todo = self.repo.create(new).await?;

        let rippled = if todo.parent_id.is_some() {
            self.repo.propagate_from(todo.id).await?
        } else {
            Vec::new()
        };
        self.record_ripples(&rippled).await?;

        self.emit_event(TodoEvent::TodoCreated {
            todo: todo.clone(),
            rippled,
        });

        Ok(todo)
    }

    /// Fetch a todo, erroring when it does not exist
    pub async fn todo(&self, id: TodoId) -> Result<TodoItem, ServiceError> {
        self.repo
            .todo(id)
            .await?
            .ok_or_else(|| ServiceError::todo_not_found(id))
    }

    /// Change a todo's status and ripple it up the ancestor chain.
    ///
    /// Writes one history row for the todo and one per rippled ancestor,
    /// all sharing a timestamp. Setting the current status again is a
    /// no-op. Returns the refreshed todo.
    pub async fn change_status(
        &self,
        id: TodoId,
        new_status: TodoStatus,
    ) -> Result<TodoItem, ServiceError> {
        let current = self.todo(id).await?;
        if current.status == new_status {
            return Ok(current);
        }

        let (updated, rippled) = self.repo.update_status_and_propagate(id, new_status).await?;

        let changed_at = Utc::now();
        self.store
            .record_status_change(StatusChange {
                todo_id: id,
                from: current.status,
                to: new_status,
                changed_at,
            })
            .await?;
        self.record_ripples(&rippled).await?;

        if new_status == TodoStatus::Done {
            self.notify_completed(&updated).await;
        }

        self.emit_event(TodoEvent::StatusChanged {
            id,
            from: current.status,
            to: new_status,
            rippled,
        });

        Ok(updated)
    }

    /// Apply a sparse update.
    ///
    /// Title and priority go straight to the store; a status change is
    /// routed through [`change_status`](Self::change_status) so the
    /// ancestor chain stays consistent.
    pub async fn update_todo(
        &self,
        id: TodoId,
        changes: TodoChanges,
    ) -> Result<TodoItem, ServiceError> {
        if let Some(title) = &changes.title {
            if title.trim().is_empty() {
                return Err(ServiceError::invalid_input("Todo title must not be empty"));
            }
        }

        let status_change = changes.status;
        let field_changes = TodoChanges {
            status: None,
            ..changes
        };

        let mut todo = if field_changes.is_empty() {
            self.todo(id).await?
        } else {
            let updated = self.repo.update_fields(id, &field_changes).await?;
            self.emit_event(TodoEvent::TodoUpdated {
                todo: updated.clone(),
            });
            updated
        };

        if let Some(new_status) = status_change {
            todo = self.change_status(id, new_status).await?;
        }

        Ok(todo)
    }

    /// Re-parent a todo (`None` moves it to the root level).
    ///
    /// After a successful re-parent both chains are recomputed: the new
    /// one (it gained the subtree's urgency) and the vacated one (it
    /// lost it). Returns false when the move was skipped as a no-op.
    pub async fn move_todo(
        &self,
        id: TodoId,
        new_parent: Option<TodoId>,
    ) -> Result<bool, ServiceError> {
        let old_parent = match self.repo.move_todo(id, new_parent).await? {
            MoveOutcome::Skipped => return Ok(false),
            MoveOutcome::Applied { old_parent } => old_parent,
        };

        let mut rippled = self.repo.propagate_from(id).await?;
        if let Some(vacated) = old_parent {
            rippled.extend(self.repo.recompute_chain(vacated).await?);
        }
        self.record_ripples(&rippled).await?;

        self.emit_event(TodoEvent::TodoMoved {
            id,
            parent_id: new_parent,
            rippled,
        });

        Ok(true)
    }

    /// Delete a todo and its whole subtree.
    ///
    /// History rows of every removed todo go with it, and the vacated
    /// parent chain is recomputed. Unknown id is a no-op returning an
    /// empty list. Returns the removed ids, sorted.
    pub async fn delete_todo(&self, id: TodoId) -> Result<Vec<TodoId>, ServiceError> {
        let RemovedSubtree {
            removed,
            old_parent,
        } = self.repo.delete(id).await?;

        if removed.is_empty() {
            return Ok(Vec::new());
        }

        self.store.delete_history_for(&removed).await?;

        let rippled = match old_parent {
            Some(vacated) => self.repo.recompute_chain(vacated).await?,
            None => Vec::new(),
        };
        self.record_ripples(&rippled).await?;

        let mut ids: Vec<TodoId> = removed.into_iter().collect();
        ids.sort_unstable();

        self.emit_event(TodoEvent::TodoDeleted {
            ids: ids.clone(),
            rippled,
        });

        Ok(ids)
    }

    /// Todos ordered by what deserves attention: status urgency, then
    /// priority, then most recently touched. `Done` todos are excluded
    /// unless `include_done` is set. Each entry carries its ancestor
    /// breadcrumb, root first.
    pub async fn prioritized(&self, include_done: bool) -> Result<Vec<PrioritizedTodo>, ServiceError> {
        let all = self.repo.all_todos().await?;

        let titles: HashMap<TodoId, String> =
            all.iter().map(|t| (t.id, t.title.clone())).collect();

        let mut list: Vec<TodoItem> = all
            .into_iter()
            .filter(|t| include_done || t.status != TodoStatus::Done)
            .collect();

        list.sort_by(|a, b| {
            b.status
                .cmp(&a.status)
                .then_with(|| b.priority.cmp(&a.priority))
                .then_with(|| b.last_interacted_at.cmp(&a.last_interacted_at))
        });

        let mut out = Vec::with_capacity(list.len());
        for todo in list {
            let breadcrumb = self
                .repo
                .ancestors_of(todo.id)
                .await?
                .into_iter()
                .filter_map(|ancestor| {
                    titles.get(&ancestor).map(|title| Breadcrumb {
                        id: ancestor,
                        title: title.clone(),
                    })
                })
                .collect();
            out.push(PrioritizedTodo { todo, breadcrumb });
        }

        Ok(out)
    }

    /// Ancestor path of a todo, root first, with titles
    pub async fn breadcrumb_of(&self, id: TodoId) -> Result<Vec<Breadcrumb>, ServiceError> {
        // Existence check first so unknown ids 404 instead of returning
        // an empty path.
        self.todo(id).await?;

        let mut crumbs = Vec::new();
        for ancestor in self.repo.ancestors_of(id).await? {
            if let Some(todo) = self.repo.todo(ancestor).await? {
                crumbs.push(Breadcrumb {
                    id: todo.id,
                    title: todo.title,
                });
            }
        }

        Ok(crumbs)
    }

    /// Every descendant id of a todo, sorted
    pub async fn descendants_of(&self, id: TodoId) -> Result<Vec<TodoId>, ServiceError> {
        self.todo(id).await?;

        let mut ids: Vec<TodoId> = self.repo.descendants_of(id).await?.into_iter().collect();
        ids.sort_unstable();
        Ok(ids)
    }

    /// Status-change log of a todo, newest first
    pub async fn history_of(&self, id: TodoId) -> Result<Vec<StatusChange>, ServiceError> {
        self.todo(id).await?;
        Ok(self.store.history_of(id).await?)
    }

    /// Drop cache relations for todos the store no longer has.
    ///
    /// Checks everything the cache tracks. Returns the stale ids,
    /// sorted. Run periodically and after suspected out-of-band writes.
    pub async fn reconcile_all(&self) -> Result<Vec<TodoId>, ServiceError> {
        let tracked = self.repo.tracked_ids().await;
        self.repo.reconcile(tracked).await
    }

    /// Rebuild the hierarchy cache wholesale from the store
    pub async fn reload(&self) -> Result<(), ServiceError> {
        self.repo.reload().await
    }

    /// Cache size counters, for the health endpoint
    pub async fn cache_stats(&self) -> CacheStats {
        self.repo.cache_stats().await
    }

    /// Write history rows for rippled ancestors and notify the notes
    /// system about any that auto-completed. One shared timestamp per
    /// batch.
    async fn record_ripples(&self, ripples: &[StatusRipple]) -> Result<(), ServiceError> {
        if ripples.is_empty() {
            return Ok(());
        }

        let changed_at = Utc::now();
        for ripple in ripples {
            self.store
                .record_status_change(StatusChange {
                    todo_id: ripple.id,
                    from: ripple.from,
                    to: ripple.to,
                    changed_at,
                })
                .await?;

            if ripple.to == TodoStatus::Done {
                if let Some(todo) = self.repo.todo(ripple.id).await? {
                    self.notify_completed(&todo).await;
                }
            }
        }

        Ok(())
    }

    /// Tell the notes system a todo completed. Failures are logged and
    /// swallowed; the status change already happened.
    async fn notify_completed(&self, todo: &TodoItem) {
        if let Err(e) = self.notes.todo_completed(todo).await {
            tracing::warn!("Note integration failed for completed todo {}: {}", todo.id, e);
        }
    }
}
