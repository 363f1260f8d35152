use async_trait::async_trait;

use taskhub_core::domain::task::{NewTask, Task, TaskId, TaskStatus};
use taskhub_db::repositories::{SqlTaskRepository, TaskRepository};
use taskhub_slack::commands::{ServiceError, TaskCommandService};

/// Backs the Slack command router with the SQLite task repository.
pub struct StoreTaskService {
    repository: SqlTaskRepository,
}

impl StoreTaskService {
    pub fn new(repository: SqlTaskRepository) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl TaskCommandService for StoreTaskService {
    async fn create_task(&self, task: NewTask) -> Result<Task, ServiceError> {
        self.repository.insert(task).await.map_err(|error| ServiceError::Store(error.to_string()))
    }

    async fn list_tasks(&self, channel_id: &str) -> Result<Vec<Task>, ServiceError> {
        self.repository
            .list_by_channel(channel_id)
            .await
            .map_err(|error| ServiceError::Store(error.to_string()))
    }

    async fn set_status(
        &self,
        id: TaskId,
        status: TaskStatus,
    ) -> Result<Option<Task>, ServiceError> {
        self.repository
            .update_status(id, status)
            .await
            .map_err(|error| ServiceError::Store(error.to_string()))
    }
}
