//! Article Service
//!
//! Flat CRUD over the read-later list. No hierarchy involvement; the
//! only coupling to the todo side is the shared event channel.

use crate::db::ArticleStore;
use crate::models::{Article, ArticleChanges, ArticleId, NewArticle, TodoEvent};
use crate::services::error::ServiceError;
use tokio::sync::broadcast;

/// High-level article operations
pub struct ArticleService {
    store: ArticleStore,
    event_tx: broadcast::Sender<TodoEvent>,
}

impl ArticleService {
    /// Create the service. `event_tx` is the todo service's sender, so
    /// one subscription sees both entity streams.
    pub fn new(store: ArticleStore, event_tx: broadcast::Sender<TodoEvent>) -> Self {
        Self { store, event_tx }
    }

    fn emit_event(&self, event: TodoEvent) {
        let _ = self.event_tx.send(event);
    }

    /// Save an article to read later
    pub async fn add(&self, new: NewArticle) -> Result<Article, ServiceError> {
        if new.title.trim().is_empty() {
            return Err(ServiceError::invalid_input(
                "Article title must not be empty",
            ));
        }

        let article = self.store.insert(new).await?;

        self.emit_event(TodoEvent::ArticleCreated {
            article: article.clone(),
        });

        Ok(article)
    }

    /// Fetch an article, erroring when it does not exist
    pub async fn get(&self, id: ArticleId) -> Result<Article, ServiceError> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::article_not_found(id))
    }

    /// Every article, unread first, most recently touched first within
    /// each group
    pub async fn list(&self) -> Result<Vec<Article>, ServiceError> {
        Ok(self.store.list_all().await?)
    }

    /// Apply a sparse update
    pub async fn update(
        &self,
        id: ArticleId,
        changes: ArticleChanges,
    ) -> Result<Article, ServiceError> {
        if let Some(title) = &changes.title {
            if title.trim().is_empty() {
                return Err(ServiceError::invalid_input(
                    "Article title must not be empty",
                ));
            }
        }

        let article = self
            .store
            .update_fields(id, &changes)
            .await?
            .ok_or_else(|| ServiceError::article_not_found(id))?;

        self.emit_event(TodoEvent::ArticleUpdated {
            article: article.clone(),
        });

        Ok(article)
    }

    /// Mark an article read (or unread again)
    pub async fn mark_read(&self, id: ArticleId, read: bool) -> Result<Article, ServiceError> {
        let article = self
            .store
            .set_read(id, read)
            .await?
            .ok_or_else(|| ServiceError::article_not_found(id))?;

        self.emit_event(TodoEvent::ArticleUpdated {
            article: article.clone(),
        });

        Ok(article)
    }

    /// Delete an article. Unknown id is an error (articles are always
    /// addressed individually).
    pub async fn delete(&self, id: ArticleId) -> Result<(), ServiceError> {
        if !self.store.delete(id).await? {
            return Err(ServiceError::article_not_found(id));
        }

        self.emit_event(TodoEvent::ArticleDeleted { id });

        Ok(())
    }
}
