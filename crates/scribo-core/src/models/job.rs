use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

/// State of an in-process pipeline run.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Running,
    Completed,
    Failed,
}

/// Handle for one asynchronous pipeline run, kept in an in-process registry.
///
/// Jobs are not persisted; a restart clears them. The durable record of what
/// happened to a file lives in its status column and processing log.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProcessingJob {
    pub id: Uuid,
    pub file_id: Uuid,
    pub status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl ProcessingJob {
    pub fn queued(file_id: Uuid) -> Self {
        ProcessingJob {
            id: Uuid::new_v4(),
            file_id,
            status: JobStatus::Queued,
            error: None,
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.status, JobStatus::Completed | JobStatus::Failed)
    }
}
