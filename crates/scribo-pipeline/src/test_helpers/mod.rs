//! Test helpers for lifecycle unit and integration tests
//!
//! This module provides in-memory store implementations, a mock blob storage,
//! and scripted engines for isolated testing of the state machine. No
//! database connection or network access is needed.

pub mod fake_engines;
pub mod mock_storage;
pub mod mock_stores;

pub use fake_engines::{FakeSummarizer, FakeTranscriber, FakeTranslator};
pub use mock_storage::MockStorage;
pub use mock_stores::{MemoryFileStore, MemoryLogStore, MemoryQuotaStore};

use std::sync::Arc;
use std::time::Duration;

use scribo_core::models::{Caller, JobStatus, ProcessingJob, Role};
use uuid::Uuid;

use crate::controller::FileLifecycle;

/// A fully wired lifecycle over in-memory collaborators, with handles kept
/// for inspection and scripting.
pub struct Harness {
    pub files: Arc<MemoryFileStore>,
    pub logs: Arc<MemoryLogStore>,
    pub quotas: Arc<MemoryQuotaStore>,
    pub storage: Arc<MockStorage>,
    pub transcriber: Arc<FakeTranscriber>,
    pub summarizer: Arc<FakeSummarizer>,
    pub translator: Arc<FakeTranslator>,
    pub lifecycle: FileLifecycle,
}

/// Build a lifecycle whose engines transcribe to "hello world", summarize to
/// "a summary", and translate to "eine zusammenfassung". Source language is
/// "en".
pub fn harness() -> Harness {
    let files = Arc::new(MemoryFileStore::new());
    let logs = Arc::new(MemoryLogStore::new());
    let quotas = Arc::new(MemoryQuotaStore::new());
    let storage = Arc::new(MockStorage::new());
    let transcriber = Arc::new(FakeTranscriber::new("hello world", 12.5));
    let summarizer = Arc::new(FakeSummarizer::new("a summary", 100));
    let translator = Arc::new(FakeTranslator::new("eine zusammenfassung", 50));

    let lifecycle = FileLifecycle::new(
        files.clone(),
        logs.clone(),
        quotas.clone(),
        storage.clone(),
        transcriber.clone(),
        summarizer.clone(),
        translator.clone(),
        "en".to_string(),
    );

    Harness {
        files,
        logs,
        quotas,
        storage,
        transcriber,
        summarizer,
        translator,
        lifecycle,
    }
}

pub fn user_caller() -> Caller {
    Caller {
        user_id: Uuid::new_v4(),
        role: Role::User,
    }
}

pub fn admin_caller() -> Caller {
    Caller {
        user_id: Uuid::new_v4(),
        role: Role::Admin,
    }
}

/// Poll until the job leaves Queued/Running or two seconds pass.
pub async fn wait_for_job(
    lifecycle: &FileLifecycle,
    caller: Caller,
    job_id: Uuid,
) -> ProcessingJob {
    for _ in 0..200 {
        let job = lifecycle
            .get_job(caller, job_id)
            .await
            .expect("job should exist");
        if matches!(job.status, JobStatus::Completed | JobStatus::Failed) {
            return job;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("job {} did not finish in time", job_id);
}
