//! Data Models
//!
//! This module contains the core data structures used throughout TaskTree:
//!
//! - `TodoItem` - hierarchical task with an ordered status
//! - `Article` - flat read-later item
//! - `TodoEvent` - notifications emitted after every successful mutation
//!
//! Ids are store-assigned integers; all wire structs serialize camelCase.

mod article;
mod events;
mod todo;

pub use article::{Article, ArticleChanges, ArticleId, NewArticle};
pub use events::{StatusRipple, TodoEvent};
pub use todo::{NewTodo, StatusChange, TodoChanges, TodoId, TodoItem, TodoStatus};
