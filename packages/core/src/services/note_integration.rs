//! Note Integration Seam
//!
//! Optional collaborator notified when a todo reaches `Done`, so an
//! external notes system can journal the completion. Failures are
//! logged by the caller and never break the status change itself.

use crate::models::TodoItem;
use async_trait::async_trait;

/// Receiver for completion notifications
#[async_trait]
pub trait NoteIntegration: Send + Sync {
    /// Called after `todo` transitioned to `Done` and the change was
    /// persisted.
    async fn todo_completed(&self, todo: &TodoItem) -> anyhow::Result<()>;
}

/// Default integration that does nothing
pub struct NoopNoteIntegration;

#[async_trait]
impl NoteIntegration for NoopNoteIntegration {
    async fn todo_completed(&self, _todo: &TodoItem) -> anyhow::Result<()> {
        Ok(())
    }
}
