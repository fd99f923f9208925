//! In-process registry of pipeline runs.
//!
//! Jobs are held in memory only. A restart loses them, which is acceptable:
//! the durable outcome of a run lives in the file's status column and its
//! processing log. The registry exists so clients can poll a run they just
//! triggered instead of polling the file row.

use chrono::Utc;
use scribo_core::models::{JobStatus, ProcessingJob};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// How long a finished job stays queryable before enqueue evicts it.
const FINISHED_JOB_RETENTION_SECS: i64 = 3600;

struct JobEntry {
    job: ProcessingJob,
    owner: Uuid,
}

#[derive(Clone, Default)]
pub struct JobRegistry {
    jobs: Arc<RwLock<HashMap<Uuid, JobEntry>>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a freshly queued job for a file owned by `owner`. Finished
    /// jobs past their retention window are evicted here, so the registry
    /// stays bounded in a long-lived process.
    pub async fn enqueue(&self, file_id: Uuid, owner: Uuid) -> ProcessingJob {
        let job = ProcessingJob::queued(file_id);
        let mut jobs = self.jobs.write().await;
        let cutoff = Utc::now() - chrono::Duration::seconds(FINISHED_JOB_RETENTION_SECS);
        jobs.retain(|_, entry| match entry.job.finished_at {
            Some(finished) => finished > cutoff,
            None => true,
        });
        jobs.insert(
            job.id,
            JobEntry {
                job: job.clone(),
                owner,
            },
        );
        job
    }

    /// Look up a job and the user id that owns its file.
    pub async fn get(&self, job_id: Uuid) -> Option<(ProcessingJob, Uuid)> {
        let jobs = self.jobs.read().await;
        jobs.get(&job_id).map(|e| (e.job.clone(), e.owner))
    }

    pub async fn mark_running(&self, job_id: Uuid) {
        let mut jobs = self.jobs.write().await;
        if let Some(entry) = jobs.get_mut(&job_id) {
            entry.job.status = JobStatus::Running;
            entry.job.started_at = Some(Utc::now());
        }
    }

    pub async fn mark_completed(&self, job_id: Uuid) {
        let mut jobs = self.jobs.write().await;
        if let Some(entry) = jobs.get_mut(&job_id) {
            entry.job.status = JobStatus::Completed;
            entry.job.finished_at = Some(Utc::now());
        }
    }

    pub async fn mark_failed(&self, job_id: Uuid, error: String) {
        let mut jobs = self.jobs.write().await;
        if let Some(entry) = jobs.get_mut(&job_id) {
            entry.job.status = JobStatus::Failed;
            entry.job.error = Some(error);
            entry.job.finished_at = Some(Utc::now());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_job_lifecycle() {
        let registry = JobRegistry::new();
        let owner = Uuid::new_v4();
        let file_id = Uuid::new_v4();

        let job = registry.enqueue(file_id, owner).await;
        let (fetched, fetched_owner) = registry.get(job.id).await.unwrap();
        assert_eq!(fetched.status, JobStatus::Queued);
        assert_eq!(fetched_owner, owner);

        registry.mark_running(job.id).await;
        let (fetched, _) = registry.get(job.id).await.unwrap();
        assert_eq!(fetched.status, JobStatus::Running);
        assert!(fetched.started_at.is_some());

        registry.mark_failed(job.id, "engine down".to_string()).await;
        let (fetched, _) = registry.get(job.id).await.unwrap();
        assert_eq!(fetched.status, JobStatus::Failed);
        assert_eq!(fetched.error.as_deref(), Some("engine down"));
        assert!(fetched.is_finished());
    }

    #[tokio::test]
    async fn test_unknown_job_is_none() {
        let registry = JobRegistry::new();
        assert!(registry.get(Uuid::new_v4()).await.is_none());
    }

    #[tokio::test]
    async fn test_enqueue_evicts_stale_finished_jobs() {
        let registry = JobRegistry::new();
        let owner = Uuid::new_v4();

        let stale = registry.enqueue(Uuid::new_v4(), owner).await;
        registry.mark_completed(stale.id).await;
        {
            let mut jobs = registry.jobs.write().await;
            jobs.get_mut(&stale.id).unwrap().job.finished_at =
                Some(Utc::now() - chrono::Duration::seconds(FINISHED_JOB_RETENTION_SECS + 1));
        }

        let fresh = registry.enqueue(Uuid::new_v4(), owner).await;
        registry.mark_completed(fresh.id).await;

        let running = registry.enqueue(Uuid::new_v4(), owner).await;

        assert!(registry.get(stale.id).await.is_none());
        // Recently finished and unfinished jobs survive eviction.
        assert!(registry.get(fresh.id).await.is_some());
        assert!(registry.get(running.id).await.is_some());
    }
}
