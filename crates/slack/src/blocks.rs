use serde::Serialize;
use serde_json::json;

use taskhub_core::domain::task::{Task, TaskId, TaskStatus, TeamMember};

use crate::payloads::PendingAssignment;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseType {
    Ephemeral,
    InChannel,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionStyle {
    Default,
    Primary,
    Danger,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AttachmentAction {
    pub name: String,
    pub text: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub value: String,
    pub style: ActionStyle,
}

impl AttachmentAction {
    pub fn button(
        name: impl Into<String>,
        label: impl Into<String>,
        value: impl Into<String>,
        style: ActionStyle,
    ) -> Self {
        Self { name: name.into(), text: label.into(), kind: "button", value: value.into(), style }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Attachment {
    pub text: String,
    pub callback_id: String,
    pub actions: Vec<AttachmentAction>,
}

/// The outbound payload shape Slack expects for slash command and
/// interaction responses.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SlashResponse {
    pub response_type: ResponseType,
    pub text: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replace_original: Option<bool>,
}

impl SlashResponse {
    fn ephemeral(text: impl Into<String>) -> Self {
        Self {
            response_type: ResponseType::Ephemeral,
            text: text.into(),
            attachments: Vec::new(),
            replace_original: None,
        }
    }

    fn in_channel(text: impl Into<String>) -> Self {
        Self {
            response_type: ResponseType::InChannel,
            text: text.into(),
            attachments: Vec::new(),
            replace_original: None,
        }
    }
}

/// Each status maps to a distinct, fixed marker.
pub fn status_marker(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Done => "✅",
        TaskStatus::No => "❌",
        TaskStatus::InProgress => "🔄",
    }
}

pub fn usage_hint_message() -> SlashResponse {
    SlashResponse::ephemeral(
        "Please provide a task description. Usage: `/addtask [task description]`",
    )
}

pub fn empty_list_message() -> SlashResponse {
    SlashResponse::in_channel("No tasks found. Create one with `/addtask [task description]`")
}

/// The assignment prompt shown after `/addtask`: one button per roster
/// member, in `TeamMember::ALL` order, each carrying the full pending-task
/// payload so the server keeps no interim state.
pub fn assignment_prompt(text: &str, channel_id: &str, dispatcher_id: &str) -> SlashResponse {
    let actions = TeamMember::ALL
        .into_iter()
        .map(|member| {
            let value = json!({
                "task": text,
                "member": member.as_str(),
                "channel_id": channel_id,
                "dispatcher_id": dispatcher_id,
            })
            .to_string();
            AttachmentAction::button("assign", member.as_str(), value, ActionStyle::Default)
        })
        .collect();

    SlashResponse {
        response_type: ResponseType::Ephemeral,
        text: "Choose team member for task assignment:".to_owned(),
        attachments: vec![Attachment {
            text: format!("Task: {text}\nSelect team member to assign this task to:"),
            callback_id: "assign_task".to_owned(),
            actions,
        }],
        replace_original: None,
    }
}

fn status_button(label: &str, task_id: TaskId, target: TaskStatus, current: TaskStatus) -> AttachmentAction {
    let style = if current == target {
        ActionStyle::Default
    } else if target == TaskStatus::No {
        ActionStyle::Danger
    } else {
        ActionStyle::Primary
    };
    let value = json!({"task_id": task_id.0, "status": target.as_str()}).to_string();
    AttachmentAction::button("status", label, value, style)
}

fn task_line(task: &Task) -> String {
    format!(
        "{} *{}* | {} | Assigned to: *{}* | Status: *{}*",
        status_marker(task.status),
        task.created_at.format("%Y-%m-%d %H:%M"),
        task.description,
        task.assignee,
        task.status,
    )
}

/// Task list plus one set of status controls per task. Callers supply tasks
/// already ordered most recent first.
pub fn task_list_message(tasks: &[Task]) -> SlashResponse {
    let lines: Vec<String> = tasks.iter().map(task_line).collect();
    let attachments = tasks
        .iter()
        .map(|task| Attachment {
            text: format!(
                "Task #{}: {} (Assigned to: {})",
                task.id, task.description, task.assignee
            ),
            callback_id: format!("change_status_{}", task.id),
            actions: vec![
                status_button("Done", task.id, TaskStatus::Done, task.status),
                status_button("In Progress", task.id, TaskStatus::InProgress, task.status),
                status_button("Not Done", task.id, TaskStatus::No, task.status),
            ],
        })
        .collect();

    SlashResponse {
        response_type: ResponseType::InChannel,
        text: format!("*Task List:*\n{}", lines.join("\n")),
        attachments,
        replace_original: None,
    }
}

/// Confirmation replacing the assignment prompt once a member is picked.
pub fn assignment_confirmation(pending: &PendingAssignment) -> SlashResponse {
    let mut response = SlashResponse::in_channel(format!(
        "✅ Task assigned to *{}*: {}",
        pending.member, pending.task
    ));
    response.replace_original = Some(true);
    response
}

pub fn status_change_confirmation(actor_user_id: &str, task: &Task) -> SlashResponse {
    let mut response = SlashResponse::in_channel(format!(
        "{} <@{}> changed task status: \"{}\" → *{}*",
        status_marker(task.status),
        actor_user_id,
        task.description,
        task.status,
    ));
    response.replace_original = Some(false);
    response
}

/// Visible error for a status change against an id that no longer resolves.
pub fn task_not_found_message(task_id: TaskId) -> SlashResponse {
    SlashResponse::ephemeral(format!(
        ":warning: Task #{task_id} was not found. Run `/showlist` to see current tasks."
    ))
}

pub fn error_message(summary: &str) -> SlashResponse {
    SlashResponse::ephemeral(format!(":warning: {summary}"))
}

/// Static introspection payload served on `GET /slack/test`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Capabilities {
    pub status: &'static str,
    pub message: &'static str,
    pub team_members: Vec<&'static str>,
    pub status_options: Vec<&'static str>,
}

pub fn capabilities() -> Capabilities {
    Capabilities {
        status: "success",
        message: "Slack Task Assignment Bot is running",
        team_members: TeamMember::ALL.iter().map(TeamMember::as_str).collect(),
        status_options: TaskStatus::ALL.iter().map(TaskStatus::as_str).collect(),
    }
}
