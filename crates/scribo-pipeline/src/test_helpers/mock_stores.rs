//! In-memory store implementations mirroring the conditional-update semantics
//! of the Postgres repositories.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use scribo_core::models::{FileRecord, FileStatus, ProcessingLog, UsageDelta, UserQuota};
use scribo_core::AppError;
use scribo_db::{FileStore, NewFile, ProcessingLogStore, QuotaStore};
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

#[derive(Default)]
pub struct MemoryFileStore {
    files: Mutex<HashMap<Uuid, FileRecord>>,
    /// When set, every store call fails with this message.
    fail_with: Mutex<Option<String>>,
}

impl MemoryFileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_with(&self, message: &str) {
        *self.fail_with.lock().unwrap() = Some(message.to_string());
    }

    pub fn status_of(&self, id: Uuid) -> Option<FileStatus> {
        self.files.lock().unwrap().get(&id).map(|f| f.status)
    }

    pub fn record_of(&self, id: Uuid) -> Option<FileRecord> {
        self.files.lock().unwrap().get(&id).cloned()
    }

    fn check_failure(&self) -> Result<(), AppError> {
        if let Some(msg) = self.fail_with.lock().unwrap().clone() {
            return Err(AppError::Internal(msg));
        }
        Ok(())
    }

    fn update_where<F>(&self, id: Uuid, expected: &[FileStatus], apply: F) -> Option<FileRecord>
    where
        F: FnOnce(&mut FileRecord),
    {
        let mut files = self.files.lock().unwrap();
        let file = files.get_mut(&id)?;
        if !expected.contains(&file.status) {
            return None;
        }
        apply(file);
        file.updated_at = Utc::now();
        Some(file.clone())
    }
}

#[async_trait]
impl FileStore for MemoryFileStore {
    async fn create(&self, file: NewFile) -> Result<FileRecord, AppError> {
        self.check_failure()?;
        let now = Utc::now();
        let record = FileRecord {
            id: Uuid::new_v4(),
            user_id: file.user_id,
            filename: file.filename,
            storage_key: file.storage_key,
            content_type: file.content_type,
            size_bytes: file.size_bytes,
            status: FileStatus::Uploaded,
            transcription: None,
            summary: None,
            translation: None,
            language: file.language,
            created_at: now,
            updated_at: now,
        };
        self.files.lock().unwrap().insert(record.id, record.clone());
        Ok(record)
    }

    async fn get(&self, id: Uuid) -> Result<Option<FileRecord>, AppError> {
        self.check_failure()?;
        Ok(self.files.lock().unwrap().get(&id).cloned())
    }

    async fn list(
        &self,
        user_id: Uuid,
        page: i64,
        limit: i64,
        status: Option<FileStatus>,
    ) -> Result<(Vec<FileRecord>, i64), AppError> {
        self.check_failure()?;
        let files = self.files.lock().unwrap();
        let mut matching: Vec<FileRecord> = files
            .values()
            .filter(|f| f.user_id == user_id && status.map_or(true, |s| f.status == s))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = matching.len() as i64;
        let offset = ((page - 1) * limit) as usize;
        let rows = matching
            .into_iter()
            .skip(offset)
            .take(limit as usize)
            .collect();
        Ok((rows, total))
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        self.check_failure()?;
        self.files.lock().unwrap().remove(&id);
        Ok(())
    }

    async fn count_for_user(&self, user_id: Uuid) -> Result<i64, AppError> {
        self.check_failure()?;
        let files = self.files.lock().unwrap();
        Ok(files.values().filter(|f| f.user_id == user_id).count() as i64)
    }

    async fn count_for_user_since(
        &self,
        user_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<i64, AppError> {
        self.check_failure()?;
        let files = self.files.lock().unwrap();
        Ok(files
            .values()
            .filter(|f| f.user_id == user_id && f.created_at >= since)
            .count() as i64)
    }

    async fn claim_for_processing(&self, id: Uuid) -> Result<Option<FileRecord>, AppError> {
        self.check_failure()?;
        Ok(self.update_where(
            id,
            &[FileStatus::Uploaded, FileStatus::Error],
            |f| f.status = FileStatus::Processing,
        ))
    }

    async fn set_transcribed(
        &self,
        id: Uuid,
        transcription: &str,
    ) -> Result<Option<FileRecord>, AppError> {
        self.check_failure()?;
        Ok(self.update_where(id, &[FileStatus::Processing], |f| {
            f.transcription = Some(transcription.to_string());
            f.status = FileStatus::Transcribed;
        }))
    }

    async fn set_summarized(
        &self,
        id: Uuid,
        summary: &str,
    ) -> Result<Option<FileRecord>, AppError> {
        self.check_failure()?;
        Ok(self.update_where(id, &[FileStatus::Transcribed], |f| {
            f.summary = Some(summary.to_string());
            f.status = FileStatus::Summarized;
        }))
    }

    async fn set_translated(
        &self,
        id: Uuid,
        translation: &str,
        language: &str,
    ) -> Result<Option<FileRecord>, AppError> {
        self.check_failure()?;
        Ok(self.update_where(id, &[FileStatus::Summarized], |f| {
            f.translation = Some(translation.to_string());
            f.language = language.to_string();
            f.status = FileStatus::Translated;
        }))
    }

    async fn mark_error(&self, id: Uuid) -> Result<(), AppError> {
        self.check_failure()?;
        self.update_where(
            id,
            &[
                FileStatus::Uploaded,
                FileStatus::Processing,
                FileStatus::Transcribed,
                FileStatus::Summarized,
                FileStatus::Error,
            ],
            |f| f.status = FileStatus::Error,
        );
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryLogStore {
    logs: Mutex<HashMap<Uuid, ProcessingLog>>,
}

impl MemoryLogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log_of(&self, file_id: Uuid) -> Option<ProcessingLog> {
        self.logs.lock().unwrap().get(&file_id).cloned()
    }
}

#[async_trait]
impl ProcessingLogStore for MemoryLogStore {
    async fn record_usage(
        &self,
        file_id: Uuid,
        delta: UsageDelta,
    ) -> Result<ProcessingLog, AppError> {
        let mut logs = self.logs.lock().unwrap();
        let now = Utc::now();
        let log = logs.entry(file_id).or_insert_with(|| ProcessingLog {
            file_id,
            whisper_duration: 0.0,
            token_count: 0,
            last_error: None,
            created_at: now,
            updated_at: now,
        });
        log.whisper_duration += delta.whisper_duration;
        log.token_count += delta.token_count;
        log.updated_at = now;
        Ok(log.clone())
    }

    async fn set_last_error(&self, file_id: Uuid, message: &str) -> Result<(), AppError> {
        let mut logs = self.logs.lock().unwrap();
        let now = Utc::now();
        let log = logs.entry(file_id).or_insert_with(|| ProcessingLog {
            file_id,
            whisper_duration: 0.0,
            token_count: 0,
            last_error: None,
            created_at: now,
            updated_at: now,
        });
        log.last_error = Some(message.to_string());
        log.updated_at = now;
        Ok(())
    }

    async fn clear_last_error(&self, file_id: Uuid) -> Result<(), AppError> {
        let mut logs = self.logs.lock().unwrap();
        if let Some(log) = logs.get_mut(&file_id) {
            log.last_error = None;
            log.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn get(&self, file_id: Uuid) -> Result<Option<ProcessingLog>, AppError> {
        Ok(self.logs.lock().unwrap().get(&file_id).cloned())
    }
}

#[derive(Default)]
pub struct MemoryQuotaStore {
    quotas: Mutex<HashMap<Uuid, UserQuota>>,
}

impl MemoryQuotaStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, quota: UserQuota) {
        self.quotas.lock().unwrap().insert(quota.user_id, quota);
    }
}

#[async_trait]
impl QuotaStore for MemoryQuotaStore {
    async fn get_for_user(&self, user_id: Uuid) -> Result<UserQuota, AppError> {
        let quotas = self.quotas.lock().unwrap();
        Ok(quotas
            .get(&user_id)
            .cloned()
            .unwrap_or_else(|| UserQuota::default_for(user_id)))
    }
}
