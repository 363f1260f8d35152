use async_trait::async_trait;
use thiserror::Error;

use taskhub_core::domain::task::{NewTask, Task, TaskId, TaskStatus};

pub mod memory;
pub mod task;

pub use memory::InMemoryTaskRepository;
pub use task::SqlTaskRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

/// Durable task store. One insert per confirmed assignment, one single-row
/// read-modify-write per status change; tasks are never deleted.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Persists a new task with `status = no` and store-assigned id and
    /// timestamps, returning the stored record.
    async fn insert(&self, task: NewTask) -> Result<Task, RepositoryError>;

    async fn find_by_id(&self, id: TaskId) -> Result<Option<Task>, RepositoryError>;

    /// All tasks for a channel, most recent first. Identical creation times
    /// fall back to descending id so the order stays deterministic.
    async fn list_by_channel(&self, channel_id: &str) -> Result<Vec<Task>, RepositoryError>;

    /// Sets the status and refreshes `updated_at`. Returns the updated record,
    /// or `None` when the id does not exist (store untouched).
    async fn update_status(
        &self,
        id: TaskId,
        status: TaskStatus,
    ) -> Result<Option<Task>, RepositoryError>;
}
