use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info};

use taskhub_core::domain::task::{NewTask, Task, TaskId, TaskStatus, TeamMember};

use crate::blocks::{
    assignment_confirmation, assignment_prompt, capabilities, empty_list_message, error_message,
    status_change_confirmation, task_list_message, task_not_found_message, usage_hint_message,
    Capabilities, SlashResponse,
};
use crate::payloads::{Interaction, PendingAssignment, SlashCommandForm};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("task store failure: {0}")]
    Store(String),
}

/// Seam between the Slack surface and whatever holds the tasks. The server
/// backs this with the SQLite repository; tests use an in-memory impl.
#[async_trait]
pub trait TaskCommandService: Send + Sync {
    async fn create_task(&self, task: NewTask) -> Result<Task, ServiceError>;
    async fn list_tasks(&self, channel_id: &str) -> Result<Vec<Task>, ServiceError>;
    async fn set_status(
        &self,
        id: TaskId,
        status: TaskStatus,
    ) -> Result<Option<Task>, ServiceError>;
}

/// What an interaction produced: the response to send back to Slack, plus
/// the created task when confirmation succeeded so the caller can notify
/// the channel out of band.
#[derive(Clone, Debug)]
pub struct InteractionOutcome {
    pub response: SlashResponse,
    pub created: Option<Task>,
}

impl InteractionOutcome {
    fn reply(response: SlashResponse) -> Self {
        Self { response, created: None }
    }
}

/// Routes verified, decoded Slack payloads to the task service and renders
/// the response. All store access goes through the service seam; nothing
/// here touches SQL.
pub struct CommandRouter<S> {
    service: S,
}

impl<S: TaskCommandService> CommandRouter<S> {
    pub fn new(service: S) -> Self {
        Self { service }
    }

    /// `/addtask` never writes. It either asks for a description or renders
    /// the assignment prompt; the task is created only on confirmation.
    pub fn addtask(&self, form: &SlashCommandForm) -> SlashResponse {
        if form.text.is_empty() {
            debug!(channel_id = %form.channel_id, "addtask without description");
            return usage_hint_message();
        }
        assignment_prompt(&form.text, &form.channel_id, &form.user_id)
    }

    /// `/showlist` renders every task ever created in the channel, most
    /// recent first.
    pub async fn showlist(&self, form: &SlashCommandForm) -> Result<SlashResponse, ServiceError> {
        let tasks = self.service.list_tasks(&form.channel_id).await?;
        if tasks.is_empty() {
            return Ok(empty_list_message());
        }
        Ok(task_list_message(&tasks))
    }

    pub async fn interaction(
        &self,
        interaction: Interaction,
    ) -> Result<InteractionOutcome, ServiceError> {
        match interaction {
            Interaction::ConfirmAssignment { pending, user_id } => {
                self.confirm_assignment(pending, &user_id).await
            }
            Interaction::ChangeStatus { task_id, status, user_id } => {
                match self.service.set_status(task_id, status).await? {
                    Some(task) => {
                        info!(task_id = task.id.0, status = %task.status, "task status changed");
                        Ok(InteractionOutcome::reply(status_change_confirmation(&user_id, &task)))
                    }
                    None => {
                        debug!(task_id = task_id.0, "status change for unknown task");
                        Ok(InteractionOutcome::reply(task_not_found_message(task_id)))
                    }
                }
            }
        }
    }

    async fn confirm_assignment(
        &self,
        pending: PendingAssignment,
        user_id: &str,
    ) -> Result<InteractionOutcome, ServiceError> {
        let new_task = match TeamMember::parse(&pending.member)
            .and_then(|member| {
                NewTask::new(&pending.task, member, &pending.channel_id, &pending.dispatcher_id)
            }) {
            Ok(new_task) => new_task,
            Err(error) => {
                debug!(%error, "rejected assignment confirmation");
                return Ok(InteractionOutcome::reply(error_message(&error.to_string())));
            }
        };

        let task = self.service.create_task(new_task).await?;
        info!(
            task_id = task.id.0,
            assignee = %task.assignee,
            confirmed_by = %user_id,
            "task created"
        );
        Ok(InteractionOutcome {
            response: assignment_confirmation(&pending),
            created: Some(task),
        })
    }

    /// Static bot capabilities for the health/introspection endpoint.
    pub fn capabilities(&self) -> Capabilities {
        capabilities()
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use taskhub_core::domain::task::{NewTask, Task, TaskId, TaskStatus};
    use taskhub_db::repositories::{InMemoryTaskRepository, TaskRepository};

    use super::{CommandRouter, InteractionOutcome, ServiceError, TaskCommandService};
    use crate::blocks::ResponseType;
    use crate::payloads::{Interaction, PendingAssignment, SlashCommandForm};

    /// The in-memory repository behind the same adapter shape the server
    /// uses for the SQL store.
    #[derive(Default)]
    struct MemoryTaskService {
        repository: InMemoryTaskRepository,
    }

    #[async_trait]
    impl TaskCommandService for MemoryTaskService {
        async fn create_task(&self, new_task: NewTask) -> Result<Task, ServiceError> {
            self.repository
                .insert(new_task)
                .await
                .map_err(|error| ServiceError::Store(error.to_string()))
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

    fn router() -> CommandRouter<MemoryTaskService> {
        CommandRouter::new(MemoryTaskService::default())
    }

    fn slash(text: &str) -> SlashCommandForm {
        SlashCommandForm {
            text: text.to_owned(),
            channel_id: "C1".to_owned(),
            user_id: "U1".to_owned(),
        }
    }

    fn pending(task: &str, member: &str) -> PendingAssignment {
        PendingAssignment {
            task: task.to_owned(),
            member: member.to_owned(),
            channel_id: "C1".to_owned(),
            dispatcher_id: "U1".to_owned(),
        }
    }

    #[tokio::test]
    async fn addtask_without_text_asks_for_a_description_and_stores_nothing() {
        let router = router();
        let response = router.addtask(&slash(""));
        assert_eq!(response.response_type, ResponseType::Ephemeral);
        assert!(response.text.contains("Usage"));

        let list = router.showlist(&slash("")).await.expect("list");
        assert!(list.text.contains("No tasks found"));
    }

    #[tokio::test]
    async fn addtask_prompts_but_does_not_create_until_confirmed() {
        let router = router();
        let response = router.addtask(&slash("write release notes"));
        assert_eq!(response.attachments.len(), 1);

        // Nothing persisted until a member button is pressed.
        let list = router.showlist(&slash("")).await.expect("list");
        assert!(list.attachments.is_empty());

        let outcome = router
            .interaction(Interaction::ConfirmAssignment {
                pending: pending("write release notes", "Emma"),
                user_id: "U2".to_owned(),
            })
            .await
            .expect("confirm");
        let created = outcome.created.expect("task created");
        assert_eq!(created.status, TaskStatus::No);
        assert_eq!(outcome.response.replace_original, Some(true));

        let list = router.showlist(&slash("")).await.expect("list");
        assert!(list.text.contains("write release notes"));
        assert!(list.text.contains("*Emma*"));
    }

    #[tokio::test]
    async fn confirmation_with_blank_description_is_rejected_without_a_write() {
        let router = router();
        let outcome = router
            .interaction(Interaction::ConfirmAssignment {
                pending: pending("   ", "Nora"),
                user_id: "U2".to_owned(),
            })
            .await
            .expect("route");
        assert!(outcome.created.is_none());
        assert_eq!(outcome.response.response_type, ResponseType::Ephemeral);

        let list = router.showlist(&slash("")).await.expect("list");
        assert!(list.text.contains("No tasks found"));
    }

    #[tokio::test]
    async fn status_change_is_idempotent() {
        let router = router();
        router
            .interaction(Interaction::ConfirmAssignment {
                pending: pending("ship it", "Kenny"),
                user_id: "U2".to_owned(),
            })
            .await
            .expect("confirm");

        let change = Interaction::ChangeStatus {
            task_id: TaskId(1),
            status: TaskStatus::Done,
            user_id: "U3".to_owned(),
        };
        let first = router.interaction(change.clone()).await.expect("first");
        let second = router.interaction(change).await.expect("second");

        for outcome in [&first, &second] {
            assert!(outcome.response.text.contains("*done*"));
            assert_eq!(outcome.response.replace_original, Some(false));
        }
    }

    #[tokio::test]
    async fn status_change_for_missing_task_reports_not_found() {
        let router = router();
        let outcome: InteractionOutcome = router
            .interaction(Interaction::ChangeStatus {
                task_id: TaskId(99),
                status: TaskStatus::Done,
                user_id: "U3".to_owned(),
            })
            .await
            .expect("route");

        assert_eq!(outcome.response.response_type, ResponseType::Ephemeral);
        assert!(outcome.response.text.contains("Task #99"));
        assert!(outcome.created.is_none());
    }

    #[tokio::test]
    async fn list_is_scoped_to_the_requesting_channel() {
        let router = router();
        for (text, channel) in [("task one", "C1"), ("task two", "C2")] {
            let mut p = pending(text, "David");
            p.channel_id = channel.to_owned();
            router
                .interaction(Interaction::ConfirmAssignment { pending: p, user_id: "U2".into() })
                .await
                .expect("confirm");
        }

        let list = router.showlist(&slash("")).await.expect("list");
        assert!(list.text.contains("task one"));
        assert!(!list.text.contains("task two"));
    }

    #[test]
    fn capabilities_reports_running_status() {
        let caps = router().capabilities();
        assert_eq!(caps.status, "success");
        assert_eq!(caps.team_members.len(), 5);
    }
}
