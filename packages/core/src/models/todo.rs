//! Todo Data Structures
//!
//! This module defines the core `TodoItem` struct and related types for
//! TaskTree's hierarchical task tracking.
//!
//! # Architecture
//!
//! - **Store-assigned ids**: `TodoId` is an `i64` assigned by the database
//!   (`INTEGER PRIMARY KEY AUTOINCREMENT`), never generated in application code
//! - **Ordered statuses**: `TodoStatus` is a total order by urgency, so the
//!   "strongest child status" computation is plain `max`
//! - **Sparse updates**: `TodoChanges` carries only the fields a caller wants
//!   to change; everything else is left untouched
//!
//! # Examples
//!
//! ```rust
//! use tasktree_core::models::{NewTodo, TodoStatus};
//!
//! let new = NewTodo::new("Write the report")
//!     .with_status(TodoStatus::NextToTake)
//!     .with_priority(2);
//!
//! assert_eq!(new.status, TodoStatus::NextToTake);
//! assert!(TodoStatus::InProgress > TodoStatus::Done);
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Identifier for a todo item, assigned by the store on insert.
pub type TodoId = i64;

/// Todo status as a total order by urgency.
///
/// Variant order matters: `Ord` is derived, so comparisons follow the
/// declaration order from least urgent (`Done`) to most urgent
/// (`InProgress`). Status propagation relies on this to compute the
/// strongest status among a todo's children with a plain `max`.
///
/// The wire and database representation is the SCREAMING_SNAKE_CASE string
/// (`"WILL_BE_BACK"`, `"IN_PROGRESS"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TodoStatus {
    /// Finished, lowest urgency
    Done,
    /// Parked with no particular plan (default for new todos)
    Backlog,
    /// Deliberately set aside, to be picked up again
    WillBeBack,
    /// Waiting on someone else to come back
    PingMe,
    /// Queued as the next thing to pick up
    NextToTake,
    /// Actively being worked on, highest urgency
    InProgress,
}

impl TodoStatus {
    /// Database/wire string for this status
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Done => "DONE",
            Self::Backlog => "BACKLOG",
            Self::WillBeBack => "WILL_BE_BACK",
            Self::PingMe => "PING_ME",
            Self::NextToTake => "NEXT_TO_TAKE",
            Self::InProgress => "IN_PROGRESS",
        }
    }
}

impl Default for TodoStatus {
    fn default() -> Self {
        Self::Backlog
    }
}

impl FromStr for TodoStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DONE" => Ok(Self::Done),
            "BACKLOG" => Ok(Self::Backlog),
            "WILL_BE_BACK" => Ok(Self::WillBeBack),
            "PING_ME" => Ok(Self::PingMe),
            "NEXT_TO_TAKE" => Ok(Self::NextToTake),
            "IN_PROGRESS" => Ok(Self::InProgress),
            // Also accept lowercase variants for lenient client input
            "done" => Ok(Self::Done),
            "backlog" => Ok(Self::Backlog),
            "will_be_back" => Ok(Self::WillBeBack),
            "ping_me" => Ok(Self::PingMe),
            "next_to_take" => Ok(Self::NextToTake),
            "in_progress" => Ok(Self::InProgress),
            _ => Err(format!("Invalid todo status: {}", s)),
        }
    }
}

impl std::fmt::Display for TodoStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single todo item.
///
/// # Fields
///
/// - `id`: Store-assigned identifier
/// - `parent_id`: Optional parent todo (None means this todo is a root)
/// - `title`: Short human-readable description
/// - `status`: Current [`TodoStatus`]
/// - `priority`: Free-form priority weight (higher = more important)
/// - `created_at`: Timestamp when the todo was inserted
/// - `last_interacted_at`: Timestamp of the most recent mutation
///
/// The parent/child relation lives both here (`parent_id`, the persisted
/// truth) and in the in-memory hierarchy cache (the denormalized index).
/// The cache is always rebuilt from the persisted pairs, never the other
/// way around.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoItem {
    /// Store-assigned identifier
    pub id: TodoId,

    /// Parent todo id (None = root)
    pub parent_id: Option<TodoId>,

    /// Short human-readable description
    pub title: String,

    /// Current status
    pub status: TodoStatus,

    /// Priority weight, higher is more important
    pub priority: i32,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Timestamp of the most recent mutation
    pub last_interacted_at: DateTime<Utc>,
}

/// Parameters for inserting a new todo.
///
/// The store assigns the id and both timestamps; everything else comes
/// from here. `status` defaults to [`TodoStatus::Backlog`] and `priority`
/// to zero when a client omits them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTodo {
    pub title: String,

    #[serde(default)]
    pub parent_id: Option<TodoId>,

    #[serde(default)]
    pub status: TodoStatus,

    #[serde(default)]
    pub priority: i32,
}

impl NewTodo {
    /// Create insert parameters for a root todo with default status and priority
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            parent_id: None,
            status: TodoStatus::default(),
            priority: 0,
        }
    }

    /// Place the new todo under the given parent
    pub fn with_parent(mut self, parent_id: TodoId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    /// Override the initial status
    pub fn with_status(mut self, status: TodoStatus) -> Self {
        self.status = status;
        self
    }

    /// Override the priority weight
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

/// Sparse update for a todo item.
///
/// `None` means "leave unchanged". Structural changes (re-parenting) go
/// through the move operation instead, and a present `status` is routed
/// through the status-change path so propagation and history recording
/// happen.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoChanges {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TodoStatus>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,
}

impl TodoChanges {
    /// True when no field would change
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.status.is_none() && self.priority.is_none()
    }

    /// Change the title
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Change the status
    pub fn status(mut self, status: TodoStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Change the priority weight
    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }
}

/// One recorded status transition of a todo.
///
/// Written on every explicit status change and on every propagated
/// ancestor change. History rows are removed together with the todo they
/// belong to when a subtree is deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChange {
    pub todo_id: TodoId,
    pub from: TodoStatus,
    pub to: TodoStatus,
    pub changed_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_order_follows_urgency() {
        assert!(TodoStatus::Done < TodoStatus::Backlog);
        assert!(TodoStatus::Backlog < TodoStatus::WillBeBack);
        assert!(TodoStatus::WillBeBack < TodoStatus::PingMe);
        assert!(TodoStatus::PingMe < TodoStatus::NextToTake);
        assert!(TodoStatus::NextToTake < TodoStatus::InProgress);
    }

    #[test]
    fn test_status_max_picks_most_urgent() {
        let children = [TodoStatus::Done, TodoStatus::Backlog, TodoStatus::PingMe];
        assert_eq!(
            children.iter().copied().max(),
            Some(TodoStatus::PingMe),
            "max over children must be the most urgent status"
        );

        let all_done = [TodoStatus::Done, TodoStatus::Done];
        assert_eq!(all_done.iter().copied().max(), Some(TodoStatus::Done));
    }

    #[test]
    fn test_status_string_round_trip() {
        let statuses = [
            TodoStatus::Done,
            TodoStatus::Backlog,
            TodoStatus::WillBeBack,
            TodoStatus::PingMe,
            TodoStatus::NextToTake,
            TodoStatus::InProgress,
        ];

        for status in statuses {
            let parsed = TodoStatus::from_str(status.as_str()).unwrap();
            assert_eq!(parsed, status);
        }
    }

    #[test]
    fn test_status_accepts_lowercase() {
        assert_eq!(
            TodoStatus::from_str("will_be_back").unwrap(),
            TodoStatus::WillBeBack
        );
        assert_eq!(
            TodoStatus::from_str("in_progress").unwrap(),
            TodoStatus::InProgress
        );
        assert!(TodoStatus::from_str("almost_done").is_err());
    }

    #[test]
    fn test_todo_item_serialization_contract() {
        let todo = TodoItem {
            id: 7,
            parent_id: Some(3),
            title: "Review draft".to_string(),
            status: TodoStatus::NextToTake,
            priority: 1,
            created_at: Utc::now(),
            last_interacted_at: Utc::now(),
        };

        let json = serde_json::to_value(&todo).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["parentId"], 3);
        assert_eq!(json["title"], "Review draft");
        assert_eq!(json["status"], "NEXT_TO_TAKE");
        assert_eq!(json["priority"], 1);
        assert!(json.get("lastInteractedAt").is_some());
        // camelCase contract: no snake_case leakage
        assert!(json.get("parent_id").is_none());
        assert!(json.get("last_interacted_at").is_none());
    }

    #[test]
    fn test_new_todo_defaults() {
        let json = json!({ "title": "Just a title" });
        let new: NewTodo = serde_json::from_value(json).unwrap();

        assert_eq!(new.title, "Just a title");
        assert_eq!(new.parent_id, None);
        assert_eq!(new.status, TodoStatus::Backlog);
        assert_eq!(new.priority, 0);
    }

    #[test]
    fn test_changes_default_is_empty() {
        let changes = TodoChanges::default();
        assert!(changes.is_empty());

        let changes = TodoChanges::default().title("Renamed");
        assert!(!changes.is_empty());
        assert_eq!(changes.status, None);
    }

    #[test]
    fn test_changes_deserialize_partial() {
        let json = json!({ "status": "PING_ME" });
        let changes: TodoChanges = serde_json::from_value(json).unwrap();

        assert_eq!(changes.status, Some(TodoStatus::PingMe));
        assert_eq!(changes.title, None);
        assert_eq!(changes.priority, None);
    }
}
