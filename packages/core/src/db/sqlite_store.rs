//! SqliteTodoStore - TodoStore Implementation for libsql
//!
//! Implements the [`TodoStore`] trait over [`DatabaseService`], holding
//! all todo SQL and the row-to-model conversion in one place. The flat
//! [`ArticleStore`] lives here too; it is concrete because articles need
//! no abstraction seam.
//!
//! Timestamps are written as RFC3339 strings; parsing accepts both
//! RFC3339 and SQLite's `CURRENT_TIMESTAMP` format so rows created with
//! the column default still decode.

use crate::db::database::DatabaseService;
use crate::db::error::StoreError;
use crate::db::todo_store::TodoStore;
use crate::models::{
    Article, ArticleChanges, ArticleId, NewArticle, NewTodo, StatusChange, TodoChanges, TodoId,
    TodoItem, TodoStatus,
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use libsql::Row;
use std::collections::HashSet;
use std::str::FromStr;

/// Render an id set as a SQL IN-list.
///
/// Ids are integers, so inlining them is injection-safe and avoids
/// building per-call placeholder strings.
fn id_list(ids: &HashSet<TodoId>) -> String {
    let mut ids: Vec<TodoId> = ids.iter().copied().collect();
    ids.sort_unstable();
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse a timestamp column, accepting RFC3339 and SQLite formats
fn parse_timestamp(s: &str, field: &str) -> Result<DateTime<Utc>, StoreError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Ok(naive.and_utc());
    }

    Err(StoreError::row_decode(format!(
        "Unable to parse {} timestamp '{}'",
        field, s
    )))
}

fn parse_status(s: &str) -> Result<TodoStatus, StoreError> {
    TodoStatus::from_str(s).map_err(StoreError::row_decode)
}

/// TodoStore implementation backed by libsql
pub struct SqliteTodoStore {
    db: DatabaseService,
}

impl SqliteTodoStore {
    /// Create a new store over an initialized database
    pub fn new(db: DatabaseService) -> Self {
        Self { db }
    }

    /// Convert a `todos` row to a TodoItem
    ///
    /// Expected columns (in order): id, parent_id, title, status,
    /// priority, created_at, last_interacted_at.
    fn todo_from_row(row: &Row) -> Result<TodoItem, StoreError> {
        let id: TodoId = row
            .get(0)
            .map_err(|e| StoreError::row_decode(format!("Failed to get id: {}", e)))?;
        let parent_id: Option<TodoId> = row
            .get(1)
            .map_err(|e| StoreError::row_decode(format!("Failed to get parent_id: {}", e)))?;
        let title: String = row
            .get(2)
            .map_err(|e| StoreError::row_decode(format!("Failed to get title: {}", e)))?;
        let status: String = row
            .get(3)
            .map_err(|e| StoreError::row_decode(format!("Failed to get status: {}", e)))?;
        let priority: i64 = row
            .get(4)
            .map_err(|e| StoreError::row_decode(format!("Failed to get priority: {}", e)))?;
        let created_at: String = row
            .get(5)
            .map_err(|e| StoreError::row_decode(format!("Failed to get created_at: {}", e)))?;
        let last_interacted_at: String = row.get(6).map_err(|e| {
            StoreError::row_decode(format!("Failed to get last_interacted_at: {}", e))
        })?;

        Ok(TodoItem {
            id,
            parent_id,
            title,
            status: parse_status(&status)?,
            priority: priority as i32,
            created_at: parse_timestamp(&created_at, "created_at")?,
            last_interacted_at: parse_timestamp(&last_interacted_at, "last_interacted_at")?,
        })
    }

    /// Run a SELECT over `todos` and collect every row
    async fn query_todos(
        &self,
        sql: &str,
        params: impl libsql::params::IntoParams,
        context: &str,
    ) -> Result<Vec<TodoItem>, StoreError> {
        let conn = self.db.connect_with_timeout().await?;

        let mut stmt = conn.prepare(sql).await.map_err(|e| {
            StoreError::sql_execution(format!("Failed to prepare {} query: {}", context, e))
        })?;

        let mut rows = stmt.query(params).await.map_err(|e| {
            StoreError::sql_execution(format!("Failed to execute {} query: {}", context, e))
        })?;

        let mut todos = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| StoreError::sql_execution(e.to_string()))?
        {
            todos.push(Self::todo_from_row(&row)?);
        }

        Ok(todos)
    }
}

#[async_trait]
impl TodoStore for SqliteTodoStore {
    async fn insert(&self, new: NewTodo) -> Result<TodoItem, StoreError> {
        let conn = self.db.connect_with_timeout().await?;
        let now = Utc::now().to_rfc3339();

        conn.execute(
            "INSERT INTO todos (parent_id, title, status, priority, created_at, last_interacted_at)
             VALUES (?, ?, ?, ?, ?, ?)",
            (
                new.parent_id,
                new.title.as_str(),
                new.status.as_str(),
                new.priority as i64,
                now.as_str(),
                now.as_str(),
            ),
        )
        .await
        .map_err(|e| StoreError::sql_execution(format!("Failed to insert todo: {}", e)))?;

        let id = conn.last_insert_rowid();

        self.find_by_id(id)
            .await?
            .ok_or_else(|| StoreError::sql_execution(format!("Todo {} missing after insert", id)))
    }

    async fn find_by_id(&self, id: TodoId) -> Result<Option<TodoItem>, StoreError> {
        let conn = self.db.connect_with_timeout().await?;

        let mut stmt = conn
            .prepare(
                "SELECT id, parent_id, title, status, priority, created_at, last_interacted_at
                 FROM todos WHERE id = ?",
            )
            .await
            .map_err(|e| {
                StoreError::sql_execution(format!("Failed to prepare find_by_id query: {}", e))
            })?;

        let mut rows = stmt.query([id]).await.map_err(|e| {
            StoreError::sql_execution(format!("Failed to execute find_by_id query: {}", e))
        })?;

        match rows
            .next()
            .await
            .map_err(|e| StoreError::sql_execution(e.to_string()))?
        {
            Some(row) => Ok(Some(Self::todo_from_row(&row)?)),
            None => Ok(None),
        }
    }

    async fn update_fields(
        &self,
        id: TodoId,
        changes: &TodoChanges,
    ) -> Result<Option<TodoItem>, StoreError> {
        let Some(current) = self.find_by_id(id).await? else {
            return Ok(None);
        };

        if changes.is_empty() {
            return Ok(Some(current));
        }

        // Merge in Rust and write a fixed UPDATE rather than building
        // dynamic SET clauses.
        let title = changes.title.clone().unwrap_or(current.title);
        let status = changes.status.unwrap_or(current.status);
        let priority = changes.priority.unwrap_or(current.priority);

        let conn = self.db.connect_with_timeout().await?;
        conn.execute(
            "UPDATE todos SET title = ?, status = ?, priority = ?, last_interacted_at = ?
             WHERE id = ?",
            (
                title.as_str(),
                status.as_str(),
                priority as i64,
                Utc::now().to_rfc3339().as_str(),
                id,
            ),
        )
        .await
        .map_err(|e| StoreError::sql_execution(format!("Failed to update todo {}: {}", id, e)))?;

        self.find_by_id(id).await
    }

    async fn delete_many(&self, ids: &HashSet<TodoId>) -> Result<u64, StoreError> {
        if ids.is_empty() {
            return Ok(0);
        }

        let conn = self.db.connect_with_timeout().await?;
        let rows_affected = conn
            .execute(
                &format!("DELETE FROM todos WHERE id IN ({})", id_list(ids)),
                (),
            )
            .await
            .map_err(|e| StoreError::sql_execution(format!("Failed to delete todos: {}", e)))?;

        Ok(rows_affected)
    }

    async fn set_parent(&self, id: TodoId, parent: Option<TodoId>) -> Result<u64, StoreError> {
        let conn = self.db.connect_with_timeout().await?;

        let rows_affected = conn
            .execute(
                "UPDATE todos SET parent_id = ?, last_interacted_at = ? WHERE id = ?",
                (parent, Utc::now().to_rfc3339().as_str(), id),
            )
            .await
            .map_err(|e| {
                StoreError::sql_execution(format!("Failed to set parent of todo {}: {}", id, e))
            })?;

        Ok(rows_affected)
    }

    async fn set_status(&self, id: TodoId, status: TodoStatus) -> Result<u64, StoreError> {
        let conn = self.db.connect_with_timeout().await?;

        let rows_affected = conn
            .execute(
                "UPDATE todos SET status = ?, last_interacted_at = ? WHERE id = ?",
                (status.as_str(), Utc::now().to_rfc3339().as_str(), id),
            )
            .await
            .map_err(|e| {
                StoreError::sql_execution(format!("Failed to set status of todo {}: {}", id, e))
            })?;

        Ok(rows_affected)
    }

    async fn find_children_of(&self, id: TodoId) -> Result<Vec<TodoItem>, StoreError> {
        self.query_todos(
            "SELECT id, parent_id, title, status, priority, created_at, last_interacted_at
             FROM todos WHERE parent_id = ?",
            [id],
            "find_children_of",
        )
        .await
    }

    async fn all_parent_child_pairs(&self) -> Result<Vec<(TodoId, Option<TodoId>)>, StoreError> {
        let conn = self.db.connect_with_timeout().await?;

        let mut stmt = conn
            .prepare("SELECT id, parent_id FROM todos")
            .await
            .map_err(|e| {
                StoreError::sql_execution(format!("Failed to prepare pairs query: {}", e))
            })?;

        let mut rows = stmt.query(()).await.map_err(|e| {
            StoreError::sql_execution(format!("Failed to execute pairs query: {}", e))
        })?;

        let mut pairs = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| StoreError::sql_execution(e.to_string()))?
        {
            let id: TodoId = row
                .get(0)
                .map_err(|e| StoreError::row_decode(format!("Failed to get id: {}", e)))?;
            let parent_id: Option<TodoId> = row
                .get(1)
                .map_err(|e| StoreError::row_decode(format!("Failed to get parent_id: {}", e)))?;
            pairs.push((id, parent_id));
        }

        Ok(pairs)
    }

    async fn existing_ids(&self, ids: &HashSet<TodoId>) -> Result<HashSet<TodoId>, StoreError> {
        if ids.is_empty() {
            return Ok(HashSet::new());
        }

        let conn = self.db.connect_with_timeout().await?;

        let mut stmt = conn
            .prepare(&format!(
                "SELECT id FROM todos WHERE id IN ({})",
                id_list(ids)
            ))
            .await
            .map_err(|e| {
                StoreError::sql_execution(format!("Failed to prepare existing_ids query: {}", e))
            })?;

        let mut rows = stmt.query(()).await.map_err(|e| {
            StoreError::sql_execution(format!("Failed to execute existing_ids query: {}", e))
        })?;

        let mut existing = HashSet::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| StoreError::sql_execution(e.to_string()))?
        {
            let id: TodoId = row
                .get(0)
                .map_err(|e| StoreError::row_decode(format!("Failed to get id: {}", e)))?;
            existing.insert(id);
        }

        Ok(existing)
    }

    async fn all_todos(&self) -> Result<Vec<TodoItem>, StoreError> {
        self.query_todos(
            "SELECT id, parent_id, title, status, priority, created_at, last_interacted_at
             FROM todos",
            (),
            "all_todos",
        )
        .await
    }

    async fn record_status_change(&self, change: StatusChange) -> Result<(), StoreError> {
        let conn = self.db.connect_with_timeout().await?;

        conn.execute(
            "INSERT INTO status_history (todo_id, from_status, to_status, changed_at)
             VALUES (?, ?, ?, ?)",
            (
                change.todo_id,
                change.from.as_str(),
                change.to.as_str(),
                change.changed_at.to_rfc3339().as_str(),
            ),
        )
        .await
        .map_err(|e| {
            StoreError::sql_execution(format!(
                "Failed to record status change for todo {}: {}",
                change.todo_id, e
            ))
        })?;

        Ok(())
    }

    async fn history_of(&self, id: TodoId) -> Result<Vec<StatusChange>, StoreError> {
        let conn = self.db.connect_with_timeout().await?;

        let mut stmt = conn
            .prepare(
                "SELECT todo_id, from_status, to_status, changed_at
                 FROM status_history WHERE todo_id = ?
                 ORDER BY changed_at DESC, id DESC",
            )
            .await
            .map_err(|e| {
                StoreError::sql_execution(format!("Failed to prepare history query: {}", e))
            })?;

        let mut rows = stmt.query([id]).await.map_err(|e| {
            StoreError::sql_execution(format!("Failed to execute history query: {}", e))
        })?;

        let mut history = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| StoreError::sql_execution(e.to_string()))?
        {
            let todo_id: TodoId = row
                .get(0)
                .map_err(|e| StoreError::row_decode(format!("Failed to get todo_id: {}", e)))?;
            let from: String = row
                .get(1)
                .map_err(|e| StoreError::row_decode(format!("Failed to get from_status: {}", e)))?;
            let to: String = row
                .get(2)
                .map_err(|e| StoreError::row_decode(format!("Failed to get to_status: {}", e)))?;
            let changed_at: String = row
                .get(3)
                .map_err(|e| StoreError::row_decode(format!("Failed to get changed_at: {}", e)))?;

            history.push(StatusChange {
                todo_id,
                from: parse_status(&from)?,
                to: parse_status(&to)?,
                changed_at: parse_timestamp(&changed_at, "changed_at")?,
            });
        }

        Ok(history)
    }

    async fn delete_history_for(&self, ids: &HashSet<TodoId>) -> Result<u64, StoreError> {
        if ids.is_empty() {
            return Ok(0);
        }

        let conn = self.db.connect_with_timeout().await?;
        let rows_affected = conn
            .execute(
                &format!(
                    "DELETE FROM status_history WHERE todo_id IN ({})",
                    id_list(ids)
                ),
                (),
            )
            .await
            .map_err(|e| {
                StoreError::sql_execution(format!("Failed to delete status history: {}", e))
            })?;

        Ok(rows_affected)
    }
}

/// Store for flat read-later articles
pub struct ArticleStore {
    db: DatabaseService,
}

impl ArticleStore {
    /// Create a new store over an initialized database
    pub fn new(db: DatabaseService) -> Self {
        Self { db }
    }

    /// Convert an `articles` row to an Article
    ///
    /// Expected columns (in order): id, title, url, note, read,
    /// created_at, last_interacted_at.
    fn article_from_row(row: &Row) -> Result<Article, StoreError> {
        let id: ArticleId = row
            .get(0)
            .map_err(|e| StoreError::row_decode(format!("Failed to get id: {}", e)))?;
        let title: String = row
            .get(1)
            .map_err(|e| StoreError::row_decode(format!("Failed to get title: {}", e)))?;
        let url: Option<String> = row
            .get(2)
            .map_err(|e| StoreError::row_decode(format!("Failed to get url: {}", e)))?;
        let note: Option<String> = row
            .get(3)
            .map_err(|e| StoreError::row_decode(format!("Failed to get note: {}", e)))?;
        let read: i64 = row
            .get(4)
            .map_err(|e| StoreError::row_decode(format!("Failed to get read: {}", e)))?;
        let created_at: String = row
            .get(5)
            .map_err(|e| StoreError::row_decode(format!("Failed to get created_at: {}", e)))?;
        let last_interacted_at: String = row.get(6).map_err(|e| {
            StoreError::row_decode(format!("Failed to get last_interacted_at: {}", e))
        })?;

        Ok(Article {
            id,
            title,
            url,
            note,
            read: read != 0,
            created_at: parse_timestamp(&created_at, "created_at")?,
            last_interacted_at: parse_timestamp(&last_interacted_at, "last_interacted_at")?,
        })
    }

    /// Insert a new article and return it with the store-assigned id
    pub async fn insert(&self, new: NewArticle) -> Result<Article, StoreError> {
        let conn = self.db.connect_with_timeout().await?;
        let now = Utc::now().to_rfc3339();

        conn.execute(
            "INSERT INTO articles (title, url, note, read, created_at, last_interacted_at)
             VALUES (?, ?, ?, 0, ?, ?)",
            (
                new.title.as_str(),
                new.url,
                new.note,
                now.as_str(),
                now.as_str(),
            ),
        )
        .await
        .map_err(|e| StoreError::sql_execution(format!("Failed to insert article: {}", e)))?;

        let id = conn.last_insert_rowid();

        self.find_by_id(id).await?.ok_or_else(|| {
            StoreError::sql_execution(format!("Article {} missing after insert", id))
        })
    }

    /// Fetch an article by id (None if it does not exist)
    pub async fn find_by_id(&self, id: ArticleId) -> Result<Option<Article>, StoreError> {
        let conn = self.db.connect_with_timeout().await?;

        let mut stmt = conn
            .prepare(
                "SELECT id, title, url, note, read, created_at, last_interacted_at
                 FROM articles WHERE id = ?",
            )
            .await
            .map_err(|e| {
                StoreError::sql_execution(format!("Failed to prepare article query: {}", e))
            })?;

        let mut rows = stmt.query([id]).await.map_err(|e| {
            StoreError::sql_execution(format!("Failed to execute article query: {}", e))
        })?;

        match rows
            .next()
            .await
            .map_err(|e| StoreError::sql_execution(e.to_string()))?
        {
            Some(row) => Ok(Some(Self::article_from_row(&row)?)),
            None => Ok(None),
        }
    }

    /// Every article, unread first, most recently touched first within
    /// each group
    pub async fn list_all(&self) -> Result<Vec<Article>, StoreError> {
        let conn = self.db.connect_with_timeout().await?;

        let mut stmt = conn
            .prepare(
                "SELECT id, title, url, note, read, created_at, last_interacted_at
                 FROM articles ORDER BY read ASC, last_interacted_at DESC",
            )
            .await
            .map_err(|e| {
                StoreError::sql_execution(format!("Failed to prepare article list query: {}", e))
            })?;

        let mut rows = stmt.query(()).await.map_err(|e| {
            StoreError::sql_execution(format!("Failed to execute article list query: {}", e))
        })?;

        let mut articles = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| StoreError::sql_execution(e.to_string()))?
        {
            articles.push(Self::article_from_row(&row)?);
        }

        Ok(articles)
    }

    /// Apply a sparse update and return the updated article.
    ///
    /// Returns `Ok(None)` when no row with `id` exists.
    pub async fn update_fields(
        &self,
        id: ArticleId,
        changes: &ArticleChanges,
    ) -> Result<Option<Article>, StoreError> {
        let Some(current) = self.find_by_id(id).await? else {
            return Ok(None);
        };

        if changes.is_empty() {
            return Ok(Some(current));
        }

        let title = changes.title.clone().unwrap_or(current.title);
        let url = changes.url.clone().or(current.url);
        let note = changes.note.clone().or(current.note);
        let read = changes.read.unwrap_or(current.read);

        let conn = self.db.connect_with_timeout().await?;
        conn.execute(
            "UPDATE articles SET title = ?, url = ?, note = ?, read = ?, last_interacted_at = ?
             WHERE id = ?",
            (
                title.as_str(),
                url,
                note,
                read as i64,
                Utc::now().to_rfc3339().as_str(),
                id,
            ),
        )
        .await
        .map_err(|e| {
            StoreError::sql_execution(format!("Failed to update article {}: {}", id, e))
        })?;

        self.find_by_id(id).await
    }

    /// Flip the read flag. Returns the updated article, or `None` when the
    /// article does not exist.
    pub async fn set_read(&self, id: ArticleId, read: bool) -> Result<Option<Article>, StoreError> {
        let changes = ArticleChanges {
            read: Some(read),
            ..ArticleChanges::default()
        };
        self.update_fields(id, &changes).await
    }

    /// Delete an article. Returns true when a row was removed.
    pub async fn delete(&self, id: ArticleId) -> Result<bool, StoreError> {
        let conn = self.db.connect_with_timeout().await?;

        let rows_affected = conn
            .execute("DELETE FROM articles WHERE id = ?", [id])
            .await
            .map_err(|e| {
                StoreError::sql_execution(format!("Failed to delete article {}: {}", id, e))
            })?;

        Ok(rows_affected > 0)
    }
}
