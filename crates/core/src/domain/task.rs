use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(pub i64);

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Task completion state. Wire strings match the Slack payload contract,
/// including the space in `in progress`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    #[serde(rename = "done")]
    Done,
    #[serde(rename = "no")]
    No,
    #[serde(rename = "in progress")]
    InProgress,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 3] = [TaskStatus::Done, TaskStatus::No, TaskStatus::InProgress];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Done => "done",
            Self::No => "no",
            Self::InProgress => "in progress",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        match raw {
            "done" => Ok(Self::Done),
            "no" => Ok(Self::No),
            "in progress" => Ok(Self::InProgress),
            other => Err(DomainError::UnknownStatus(other.to_owned())),
        }
    }
}

impl Default for TaskStatus {
    fn default() -> Self {
        Self::No
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The fixed assignee roster. `ALL` is the canonical rendering order for
/// every member list the service emits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TeamMember {
    David,
    Emma,
    Nora,
    Eric,
    Kenny,
}

impl TeamMember {
    pub const ALL: [TeamMember; 5] = [
        TeamMember::David,
        TeamMember::Emma,
        TeamMember::Nora,
        TeamMember::Eric,
        TeamMember::Kenny,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::David => "David",
            Self::Emma => "Emma",
            Self::Nora => "Nora",
            Self::Eric => "Eric",
            Self::Kenny => "Kenny",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        Self::ALL
            .into_iter()
            .find(|member| member.as_str() == raw)
            .ok_or_else(|| DomainError::UnknownTeamMember(raw.to_owned()))
    }
}

impl std::fmt::Display for TeamMember {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted task record. Tasks are created through confirm-assignment,
/// mutated only through status changes, and never deleted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub description: String,
    pub assignee: TeamMember,
    pub status: TaskStatus,
    pub channel_id: String,
    pub dispatcher_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insertion payload for a confirmed assignment. `status` starts at `no`
/// and timestamps are assigned by the store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewTask {
    pub description: String,
    pub assignee: TeamMember,
    pub channel_id: String,
    pub dispatcher_id: String,
}

impl NewTask {
    pub fn new(
        description: impl Into<String>,
        assignee: TeamMember,
        channel_id: impl Into<String>,
        dispatcher_id: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let description = description.into().trim().to_owned();
        if description.is_empty() {
            return Err(DomainError::EmptyDescription);
        }
        Ok(Self {
            description,
            assignee,
            channel_id: channel_id.into(),
            dispatcher_id: dispatcher_id.into(),
        })
    }
}
