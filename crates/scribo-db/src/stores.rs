//! Store traits the lifecycle controller depends on.
//!
//! Production code wires in the Postgres repositories from this crate; tests
//! substitute in-memory implementations. Every status transition is expressed
//! as a conditional update: the store only applies the change when the row is
//! still in the expected state, and returns `None` otherwise.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use scribo_core::models::{FileRecord, FileStatus, ProcessingLog, UsageDelta, UserQuota};
use scribo_core::AppError;
use uuid::Uuid;

/// Insert payload for a new file row. Status always starts at UPLOADED.
#[derive(Debug, Clone)]
pub struct NewFile {
    pub user_id: Uuid,
    pub filename: String,
    pub storage_key: String,
    pub content_type: String,
    pub size_bytes: i64,
    /// Requested target language, "auto" to skip translation.
    pub language: String,
}

#[async_trait]
pub trait FileStore: Send + Sync {
    async fn create(&self, file: NewFile) -> Result<FileRecord, AppError>;

    async fn get(&self, id: Uuid) -> Result<Option<FileRecord>, AppError>;

    /// List a user's files newest-first with an optional status filter.
    /// Returns the page of rows and the total count matching the filter.
    async fn list(
        &self,
        user_id: Uuid,
        page: i64,
        limit: i64,
        status: Option<FileStatus>,
    ) -> Result<(Vec<FileRecord>, i64), AppError>;

    async fn delete(&self, id: Uuid) -> Result<(), AppError>;

    /// Total stored files for a user, regardless of status.
    async fn count_for_user(&self, user_id: Uuid) -> Result<i64, AppError>;

    /// Files created by a user at or after `since`.
    async fn count_for_user_since(
        &self,
        user_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<i64, AppError>;

    /// Atomically move UPLOADED or ERROR to PROCESSING. Returns the claimed
    /// row, or `None` when the file is in any other state (lost race, already
    /// running, or completed).
    async fn claim_for_processing(&self, id: Uuid) -> Result<Option<FileRecord>, AppError>;

    /// PROCESSING -> TRANSCRIBED, storing the transcript in the same update.
    async fn set_transcribed(
        &self,
        id: Uuid,
        transcription: &str,
    ) -> Result<Option<FileRecord>, AppError>;

    /// TRANSCRIBED -> SUMMARIZED, storing the summary in the same update.
    async fn set_summarized(&self, id: Uuid, summary: &str)
        -> Result<Option<FileRecord>, AppError>;

    /// SUMMARIZED -> TRANSLATED, storing the translation and the resolved
    /// target language in the same update.
    async fn set_translated(
        &self,
        id: Uuid,
        translation: &str,
        language: &str,
    ) -> Result<Option<FileRecord>, AppError>;

    /// Move any non-terminal state to ERROR. Unconditional on purpose: a
    /// failure can surface from any stage.
    async fn mark_error(&self, id: Uuid) -> Result<(), AppError>;
}

#[async_trait]
pub trait ProcessingLogStore: Send + Sync {
    /// Upsert the 1:1 log row and add the delta to its usage counters.
    async fn record_usage(
        &self,
        file_id: Uuid,
        delta: UsageDelta,
    ) -> Result<ProcessingLog, AppError>;

    /// Upsert the log row and overwrite `last_error`.
    async fn set_last_error(&self, file_id: Uuid, message: &str) -> Result<(), AppError>;

    /// Clear `last_error`, keeping accumulated usage. No-op when no row exists.
    async fn clear_last_error(&self, file_id: Uuid) -> Result<(), AppError>;

    async fn get(&self, file_id: Uuid) -> Result<Option<ProcessingLog>, AppError>;
}

#[async_trait]
pub trait QuotaStore: Send + Sync {
    /// Fetch a user's quota row, falling back to the defaults when absent.
    async fn get_for_user(&self, user_id: Uuid) -> Result<UserQuota, AppError>;
}
