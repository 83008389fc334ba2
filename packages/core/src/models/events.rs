//! Domain Events
//!
//! This module defines the events emitted after every successful mutation.
//! Mutations notify explicitly on write; there is no observable store
//! underneath, so anything that wants to react to changes (the SSE stream,
//! tests, future consumers) subscribes to the broadcast channel instead of
//! watching state.
//!
//! # Event Flow
//!
//! 1. A service mutation succeeds (store and cache updated)
//! 2. The matching event is sent on the tokio broadcast channel
//! 3. All subscribers receive it asynchronously; the HTTP layer forwards
//!    events to clients as server-sent events

use crate::models::{Article, ArticleId, TodoId, TodoItem, TodoStatus};
use serde::{Deserialize, Serialize};

/// One ancestor status update applied during upward propagation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusRipple {
    pub id: TodoId,
    pub from: TodoStatus,
    pub to: TodoStatus,
}

/// Events emitted after successful mutations.
///
/// Serialized in internally-tagged form: the `type` field carries the
/// event name and sits flat next to the payload fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TodoEvent {
    /// A todo was created
    #[serde(rename = "todo:created", rename_all = "camelCase")]
    TodoCreated {
        todo: TodoItem,
        rippled: Vec<StatusRipple>,
    },

    /// A todo's non-structural fields were updated
    #[serde(rename = "todo:updated", rename_all = "camelCase")]
    TodoUpdated { todo: TodoItem },

    /// A todo's status changed, possibly rippling to ancestors
    #[serde(rename = "todo:statusChanged", rename_all = "camelCase")]
    StatusChanged {
        id: TodoId,
        from: TodoStatus,
        to: TodoStatus,
        rippled: Vec<StatusRipple>,
    },

    /// A todo was re-parented
    #[serde(rename = "todo:moved", rename_all = "camelCase")]
    TodoMoved {
        id: TodoId,
        parent_id: Option<TodoId>,
        rippled: Vec<StatusRipple>,
    },

    /// A todo and its whole subtree were deleted
    #[serde(rename = "todo:deleted", rename_all = "camelCase")]
    TodoDeleted {
        ids: Vec<TodoId>,
        rippled: Vec<StatusRipple>,
    },

    /// An article was created
    #[serde(rename = "article:created", rename_all = "camelCase")]
    ArticleCreated { article: Article },

    /// An article was updated (including read/unread flips)
    #[serde(rename = "article:updated", rename_all = "camelCase")]
    ArticleUpdated { article: Article },

    /// An article was deleted
    #[serde(rename = "article:deleted", rename_all = "camelCase")]
    ArticleDeleted { id: ArticleId },
}

impl TodoEvent {
    /// Get a string representation of the event type
    ///
    /// Used as the SSE event name so clients can register per-type
    /// listeners.
    pub fn event_type(&self) -> &'static str {
        match self {
            TodoEvent::TodoCreated { .. } => "todo:created",
            TodoEvent::TodoUpdated { .. } => "todo:updated",
            TodoEvent::StatusChanged { .. } => "todo:statusChanged",
            TodoEvent::TodoMoved { .. } => "todo:moved",
            TodoEvent::TodoDeleted { .. } => "todo:deleted",
            TodoEvent::ArticleCreated { .. } => "article:created",
            TodoEvent::ArticleUpdated { .. } => "article:updated",
            TodoEvent::ArticleDeleted { .. } => "article:deleted",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Contract test: documents and enforces the exact JSON format clients
    /// consume over SSE.
    ///
    /// Serde's `#[serde(tag = "type")]` produces an INTERNALLY-TAGGED format
    /// where the discriminator field sits flat next to the payload fields
    /// (NOT nested under a variant key).
    #[test]
    fn test_event_serialization_contract() {
        let event = TodoEvent::StatusChanged {
            id: 12,
            from: TodoStatus::Backlog,
            to: TodoStatus::InProgress,
            rippled: vec![StatusRipple {
                id: 3,
                from: TodoStatus::Backlog,
                to: TodoStatus::InProgress,
            }],
        };

        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["type"], "todo:statusChanged");
        assert_eq!(json["id"], 12);
        assert_eq!(json["from"], "BACKLOG");
        assert_eq!(json["to"], "IN_PROGRESS");
        assert_eq!(json["rippled"][0]["id"], 3);
        assert_eq!(json["rippled"][0]["to"], "IN_PROGRESS");
        // Flat format: no nesting under a variant key
        assert!(json.get("statusChanged").is_none());
    }

    #[test]
    fn test_moved_event_field_names() {
        let event = TodoEvent::TodoMoved {
            id: 5,
            parent_id: None,
            rippled: Vec::new(),
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "todo:moved");
        assert!(json.get("parentId").is_some(), "camelCase field expected");
        assert!(json["parentId"].is_null());
        assert!(json.get("parent_id").is_none());
    }

    #[test]
    fn test_event_type_matches_tag() {
        let event = TodoEvent::TodoDeleted {
            ids: vec![1, 2, 3],
            rippled: Vec::new(),
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], event.event_type());
    }
}
