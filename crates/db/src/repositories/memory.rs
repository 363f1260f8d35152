use chrono::Utc;
use tokio::sync::RwLock;

use taskhub_core::domain::task::{NewTask, Task, TaskId, TaskStatus};

use super::{RepositoryError, TaskRepository};

/// In-memory store with the same ordering semantics as the SQL repository.
/// Backs the command router tests, which do not need a live database.
#[derive(Default)]
pub struct InMemoryTaskRepository {
    state: RwLock<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    next_id: i64,
    tasks: Vec<Task>,
}

#[async_trait::async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn insert(&self, task: NewTask) -> Result<Task, RepositoryError> {
        let mut state = self.state.write().await;
        state.next_id += 1;
        let now = Utc::now();
        let stored = Task {
            id: TaskId(state.next_id),
            description: task.description,
            assignee: task.assignee,
            status: TaskStatus::default(),
            channel_id: task.channel_id,
            dispatcher_id: task.dispatcher_id,
            created_at: now,
            updated_at: now,
        };
        state.tasks.push(stored.clone());
        Ok(stored)
    }

    async fn find_by_id(&self, id: TaskId) -> Result<Option<Task>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state.tasks.iter().find(|task| task.id == id).cloned())
    }

    async fn list_by_channel(&self, channel_id: &str) -> Result<Vec<Task>, RepositoryError> {
        let state = self.state.read().await;
        let mut listed: Vec<Task> =
            state.tasks.iter().filter(|task| task.channel_id == channel_id).cloned().collect();
        listed.sort_by(|left, right| {
            right.created_at.cmp(&left.created_at).then(right.id.0.cmp(&left.id.0))
        });
        Ok(listed)
    }

    async fn update_status(
        &self,
        id: TaskId,
        status: TaskStatus,
    ) -> Result<Option<Task>, RepositoryError> {
        let mut state = self.state.write().await;
        let Some(task) = state.tasks.iter_mut().find(|task| task.id == id) else {
            return Ok(None);
        };
        task.status = status;
        task.updated_at = Utc::now();
        Ok(Some(task.clone()))
    }
}

#[cfg(test)]
mod tests {
    use taskhub_core::domain::task::{NewTask, TaskId, TaskStatus, TeamMember};

    use super::InMemoryTaskRepository;
    use crate::repositories::TaskRepository;

    fn new_task(description: &str, channel: &str) -> NewTask {
        NewTask::new(description, TeamMember::Kenny, channel, "U-dispatch").expect("valid task")
    }

    #[tokio::test]
    async fn mirrors_sql_ordering_and_status_semantics() {
        let repo = InMemoryTaskRepository::default();

        let first = repo.insert(new_task("first", "C1")).await.expect("insert");
        let second = repo.insert(new_task("second", "C1")).await.expect("insert");

        let listed = repo.list_by_channel("C1").await.expect("list");
        let ids: Vec<_> = listed.iter().map(|task| task.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);

        let updated = repo
            .update_status(first.id, TaskStatus::Done)
            .await
            .expect("update")
            .expect("present");
        assert_eq!(updated.status, TaskStatus::Done);

        assert!(repo
            .update_status(TaskId(42), TaskStatus::Done)
            .await
            .expect("update")
            .is_none());
    }
}
