use chrono::{DateTime, Utc};
use sqlx::Row;

use taskhub_core::domain::task::{NewTask, Task, TaskId, TaskStatus, TeamMember};

use super::{RepositoryError, TaskRepository};
use crate::DbPool;

pub struct SqlTaskRepository {
    pool: DbPool,
}

impl SqlTaskRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_task(row: &sqlx::sqlite::SqliteRow) -> Result<Task, RepositoryError> {
    let id: i64 = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let description: String =
        row.try_get("description").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let assignee_str: String =
        row.try_get("assignee").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let status_str: String =
        row.try_get("status").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let channel_id: String =
        row.try_get("channel_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let dispatcher_id: String =
        row.try_get("dispatcher_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let created_at_str: String =
        row.try_get("created_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let updated_at_str: String =
        row.try_get("updated_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    let assignee = TeamMember::parse(&assignee_str)
        .map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let status =
        TaskStatus::parse(&status_str).map_err(|e| RepositoryError::Decode(e.to_string()))?;

    let created_at = parse_timestamp(&created_at_str)?;
    let updated_at = parse_timestamp(&updated_at_str)?;

    Ok(Task {
        id: TaskId(id),
        description,
        assignee,
        status,
        channel_id,
        dispatcher_id,
        created_at,
        updated_at,
    })
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Decode(format!("invalid timestamp `{raw}`: {e}")))
}

#[async_trait::async_trait]
impl TaskRepository for SqlTaskRepository {
    async fn insert(&self, task: NewTask) -> Result<Task, RepositoryError> {
        let now = Utc::now();
        let now_str = now.to_rfc3339();
        let status = TaskStatus::default();

        let result = sqlx::query(
            "INSERT INTO task (description, assignee, status, channel_id, dispatcher_id,
                               created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&task.description)
        .bind(task.assignee.as_str())
        .bind(status.as_str())
        .bind(&task.channel_id)
        .bind(&task.dispatcher_id)
        .bind(&now_str)
        .bind(&now_str)
        .execute(&self.pool)
        .await?;

        Ok(Task {
            id: TaskId(result.last_insert_rowid()),
            description: task.description,
            assignee: task.assignee,
            status,
            channel_id: task.channel_id,
            dispatcher_id: task.dispatcher_id,
            created_at: now,
            updated_at: now,
        })
    }

    async fn find_by_id(&self, id: TaskId) -> Result<Option<Task>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, description, assignee, status, channel_id, dispatcher_id,
                    created_at, updated_at
             FROM task WHERE id = ?",
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_task(r)?)),
            None => Ok(None),
        }
    }

    async fn list_by_channel(&self, channel_id: &str) -> Result<Vec<Task>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, description, assignee, status, channel_id, dispatcher_id,
                    created_at, updated_at
             FROM task WHERE channel_id = ?
             ORDER BY created_at DESC, id DESC",
        )
        .bind(channel_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_task).collect()
    }

    async fn update_status(
        &self,
        id: TaskId,
        status: TaskStatus,
    ) -> Result<Option<Task>, RepositoryError> {
        let result = sqlx::query("UPDATE task SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(Utc::now().to_rfc3339())
            .bind(id.0)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.find_by_id(id).await
    }
}
