//! Article Data Structures
//!
//! Flat read-later items tracked alongside todos. Articles have no
//! hierarchy and never touch the hierarchy cache; they exist so one
//! backend covers both halves of the tracker.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier for an article, assigned by the store on insert.
pub type ArticleId = i64;

/// A read-later article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    /// Store-assigned identifier
    pub id: ArticleId,

    /// Article title
    pub title: String,

    /// Optional source URL
    pub url: Option<String>,

    /// Optional free-form note
    pub note: Option<String>,

    /// Whether the article has been read
    pub read: bool,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Timestamp of the most recent mutation
    pub last_interacted_at: DateTime<Utc>,
}

/// Parameters for inserting a new article.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewArticle {
    pub title: String,

    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub note: Option<String>,
}

impl NewArticle {
    /// Create insert parameters with only a title
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: None,
            note: None,
        }
    }

    /// Attach a source URL
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Attach a note
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Sparse update for an article. `None` means "leave unchanged".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleChanges {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read: Option<bool>,
}

impl ArticleChanges {
    /// True when no field would change
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.url.is_none() && self.note.is_none() && self.read.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_article_serialization_contract() {
        let article = Article {
            id: 4,
            title: "Borrow checker deep dive".to_string(),
            url: Some("https://example.com/borrowck".to_string()),
            note: None,
            read: false,
            created_at: Utc::now(),
            last_interacted_at: Utc::now(),
        };

        let json = serde_json::to_value(&article).unwrap();
        assert_eq!(json["id"], 4);
        assert_eq!(json["title"], "Borrow checker deep dive");
        assert_eq!(json["url"], "https://example.com/borrowck");
        assert_eq!(json["read"], false);
        assert!(json.get("lastInteractedAt").is_some());
    }

    #[test]
    fn test_new_article_defaults() {
        let json = json!({ "title": "Minimal" });
        let new: NewArticle = serde_json::from_value(json).unwrap();

        assert_eq!(new.title, "Minimal");
        assert!(new.url.is_none());
        assert!(new.note.is_none());
    }
}
