//! The file lifecycle controller.
//!
//! One struct owns every operation that can change a file's status. All
//! collaborators are injected as trait objects, so the controller itself is
//! storage-, database-, and engine-agnostic.

use std::sync::Arc;

use chrono::{DateTime, Local, LocalResult, NaiveTime, TimeZone, Utc};
use scribo_core::models::{
    Caller, FileDetailResponse, FileListQuery, FilePage, FileRecord, FileResponse, ProcessingJob,
    UsageDelta,
};
use scribo_core::AppError;
use scribo_db::{FileStore, NewFile, ProcessingLogStore, QuotaStore};
use scribo_engines::{Summarizer, Transcriber, Translator};
use scribo_storage::{generate_storage_key, Storage};
use uuid::Uuid;

use crate::jobs::JobRegistry;

const MAX_PAGE_SIZE: i64 = 100;

/// Target languages that disable the translation stage.
fn translation_skipped(requested: &str, source_language: &str) -> bool {
    requested == "auto" || requested.eq_ignore_ascii_case(source_language)
}

/// Start of the current calendar day in the server's local timezone,
/// expressed in UTC. Daily upload limits reset at this boundary.
fn local_midnight() -> DateTime<Utc> {
    let naive = Local::now().date_naive().and_time(NaiveTime::MIN);
    match Local.from_local_datetime(&naive) {
        LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => dt.with_timezone(&Utc),
        // Midnight falls into a DST gap; treat the naive time as UTC.
        LocalResult::None => DateTime::from_naive_utc_and_offset(naive, Utc),
    }
}

#[derive(Clone)]
pub struct FileLifecycle {
    files: Arc<dyn FileStore>,
    logs: Arc<dyn ProcessingLogStore>,
    quotas: Arc<dyn QuotaStore>,
    storage: Arc<dyn Storage>,
    transcriber: Arc<dyn Transcriber>,
    summarizer: Arc<dyn Summarizer>,
    translator: Arc<dyn Translator>,
    jobs: JobRegistry,
    source_language: String,
}

impl FileLifecycle {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        files: Arc<dyn FileStore>,
        logs: Arc<dyn ProcessingLogStore>,
        quotas: Arc<dyn QuotaStore>,
        storage: Arc<dyn Storage>,
        transcriber: Arc<dyn Transcriber>,
        summarizer: Arc<dyn Summarizer>,
        translator: Arc<dyn Translator>,
        source_language: String,
    ) -> Self {
        Self {
            files,
            logs,
            quotas,
            storage,
            transcriber,
            summarizer,
            translator,
            jobs: JobRegistry::new(),
            source_language,
        }
    }

    /// Admission check against the caller's quota: total stored files, single
    /// upload size, and uploads since local midnight.
    async fn check_admission(&self, user_id: Uuid, size_bytes: i64) -> Result<(), AppError> {
        let quota = self.quotas.get_for_user(user_id).await?;

        if size_bytes > quota.max_file_size {
            return Err(AppError::PayloadTooLarge(format!(
                "File size {} exceeds the per-file limit of {} bytes",
                size_bytes, quota.max_file_size
            )));
        }

        let stored = self.files.count_for_user(user_id).await?;
        if stored >= quota.max_files {
            return Err(AppError::QuotaExceeded {
                resource: "files",
                used: stored,
                limit: quota.max_files,
            });
        }

        let today = self
            .files
            .count_for_user_since(user_id, local_midnight())
            .await?;
        if today >= quota.daily_file_limit {
            return Err(AppError::QuotaExceeded {
                resource: "daily uploads",
                used: today,
                limit: quota.daily_file_limit,
            });
        }

        Ok(())
    }

    /// Store the uploaded audio and create its file row in UPLOADED state.
    #[tracing::instrument(skip(self, data), fields(user_id = %caller.user_id, filename, size_bytes = data.len()))]
    pub async fn create_file(
        &self,
        caller: Caller,
        filename: &str,
        content_type: &str,
        language: &str,
        data: Vec<u8>,
    ) -> Result<FileResponse, AppError> {
        if filename.trim().is_empty() {
            return Err(AppError::InvalidInput("Filename must not be empty".to_string()));
        }
        if data.is_empty() {
            return Err(AppError::InvalidInput("File is empty".to_string()));
        }

        let size_bytes = data.len() as i64;
        self.check_admission(caller.user_id, size_bytes).await?;

        let storage_key = generate_storage_key(caller.user_id, filename);
        self.storage
            .upload(&storage_key, content_type, data)
            .await
            .map_err(|e| AppError::Storage(e.to_string()))?;

        let created = self
            .files
            .create(NewFile {
                user_id: caller.user_id,
                filename: filename.to_string(),
                storage_key: storage_key.clone(),
                content_type: content_type.to_string(),
                size_bytes,
                language: language.to_string(),
            })
            .await;

        match created {
            Ok(file) => Ok(FileResponse::from(file)),
            Err(e) => {
                // Don't leave an orphaned blob behind the failed insert.
                if let Err(del_err) = self.storage.delete(&storage_key).await {
                    tracing::warn!(
                        key = %storage_key,
                        error = %del_err,
                        "Failed to clean up blob after insert failure"
                    );
                }
                Err(e)
            }
        }
    }

    /// Claim the file for processing and start an asynchronous pipeline run.
    ///
    /// Returns the queued job immediately. Only UPLOADED and ERROR files can
    /// be claimed; anything else is a conflict, including a concurrent caller
    /// who claimed the file first.
    #[tracing::instrument(skip(self), fields(user_id = %caller.user_id, file_id = %file_id))]
    pub async fn trigger_processing(
        &self,
        caller: Caller,
        file_id: Uuid,
    ) -> Result<ProcessingJob, AppError> {
        let file = self
            .files
            .get(file_id)
            .await?
            .ok_or_else(|| AppError::NotFound("File not found".to_string()))?;

        if !caller.may_access(file.user_id) {
            return Err(AppError::Forbidden(
                "You do not have access to this file".to_string(),
            ));
        }

        let claimed = self
            .files
            .claim_for_processing(file_id)
            .await?
            .ok_or_else(|| {
                AppError::Conflict(format!(
                    "File cannot be processed from status {}",
                    file.status
                ))
            })?;

        // A retry starts clean: the previous failure is no longer current.
        self.logs.clear_last_error(file_id).await?;

        let job = self.jobs.enqueue(file_id, claimed.user_id).await;

        let lifecycle = self.clone();
        let job_id = job.id;
        tokio::spawn(async move {
            lifecycle.run_pipeline(job_id, claimed).await;
        });

        Ok(job)
    }

    /// Execute the pipeline for a claimed file and settle the job either way.
    async fn run_pipeline(&self, job_id: Uuid, file: FileRecord) {
        self.jobs.mark_running(job_id).await;
        let file_id = file.id;

        match self.execute_stages(file).await {
            Ok(final_status) => {
                tracing::info!(file_id = %file_id, status = %final_status, "Pipeline run completed");
                self.jobs.mark_completed(job_id).await;
            }
            Err(err) => {
                tracing::error!(file_id = %file_id, error = %err, "Pipeline run failed");
                let message = err.to_string();
                if let Err(db_err) = self.files.mark_error(file_id).await {
                    tracing::error!(file_id = %file_id, error = %db_err, "Failed to mark file as errored");
                }
                if let Err(db_err) = self.logs.set_last_error(file_id, &message).await {
                    tracing::error!(file_id = %file_id, error = %db_err, "Failed to record last error");
                }
                self.jobs.mark_failed(job_id, message).await;
            }
        }
    }

    /// Transcribe, summarize, and (unless skipped) translate. Usage is
    /// recorded after every successful stage, so a later failure never loses
    /// billed work. Returns the final status reached.
    async fn execute_stages(
        &self,
        file: FileRecord,
    ) -> Result<scribo_core::models::FileStatus, AppError> {
        let audio = self
            .storage
            .download(&file.storage_key)
            .await
            .map_err(|e| AppError::StageFailed {
                stage: "download",
                message: e.to_string(),
            })?;

        let transcript = self
            .transcriber
            .transcribe(&file.filename, &file.content_type, audio)
            .await
            .map_err(|e| AppError::StageFailed {
                stage: "transcription",
                message: e.to_string(),
            })?;

        self.logs
            .record_usage(file.id, UsageDelta::transcription(transcript.duration_secs))
            .await?;

        let file = self
            .files
            .set_transcribed(file.id, &transcript.text)
            .await?
            .ok_or_else(|| {
                AppError::Conflict("File status changed during transcription".to_string())
            })?;

        let summary = self
            .summarizer
            .summarize(&transcript.text)
            .await
            .map_err(|e| AppError::StageFailed {
                stage: "summarization",
                message: e.to_string(),
            })?;

        self.logs
            .record_usage(file.id, UsageDelta::tokens(summary.total_tokens))
            .await?;

        let file = self
            .files
            .set_summarized(file.id, &summary.text)
            .await?
            .ok_or_else(|| {
                AppError::Conflict("File status changed during summarization".to_string())
            })?;

        if translation_skipped(&file.language, &self.source_language) {
            return Ok(file.status);
        }

        let translation = self
            .translator
            .translate(&transcript.text, &file.language)
            .await
            .map_err(|e| AppError::StageFailed {
                stage: "translation",
                message: e.to_string(),
            })?;

        self.logs
            .record_usage(file.id, UsageDelta::tokens(translation.total_tokens))
            .await?;

        let file = self
            .files
            .set_translated(file.id, &translation.text, &file.language)
            .await?
            .ok_or_else(|| {
                AppError::Conflict("File status changed during translation".to_string())
            })?;

        Ok(file.status)
    }

    /// Fetch a file with its processing log.
    #[tracing::instrument(skip(self), fields(user_id = %caller.user_id, file_id = %file_id))]
    pub async fn get_file(
        &self,
        caller: Caller,
        file_id: Uuid,
    ) -> Result<FileDetailResponse, AppError> {
        let file = self
            .files
            .get(file_id)
            .await?
            .ok_or_else(|| AppError::NotFound("File not found".to_string()))?;

        if !caller.may_access(file.user_id) {
            return Err(AppError::Forbidden(
                "You do not have access to this file".to_string(),
            ));
        }

        let log = self.logs.get(file_id).await?;

        Ok(FileDetailResponse {
            file: FileResponse::from(file),
            processing_log: log.map(Into::into),
        })
    }

    /// List the caller's files newest-first with pagination and an optional
    /// status filter.
    #[tracing::instrument(skip(self, query), fields(user_id = %caller.user_id))]
    pub async fn list_files(
        &self,
        caller: Caller,
        query: FileListQuery,
    ) -> Result<FilePage, AppError> {
        let page = query.page.unwrap_or(1).max(1);
        let limit = query.limit.unwrap_or(10).clamp(1, MAX_PAGE_SIZE);

        let (rows, total) = self
            .files
            .list(caller.user_id, page, limit, query.status)
            .await?;

        let files = rows.into_iter().map(FileResponse::from).collect();
        Ok(FilePage::new(files, total, page, limit))
    }

    /// Delete a file row and its blob. The blob delete is best-effort: a
    /// storage failure is logged but never blocks removal of the row.
    #[tracing::instrument(skip(self), fields(user_id = %caller.user_id, file_id = %file_id))]
    pub async fn delete_file(&self, caller: Caller, file_id: Uuid) -> Result<(), AppError> {
        let file = self
            .files
            .get(file_id)
            .await?
            .ok_or_else(|| AppError::NotFound("File not found".to_string()))?;

        if !caller.may_access(file.user_id) {
            return Err(AppError::Forbidden(
                "You do not have access to this file".to_string(),
            ));
        }

        if let Err(e) = self.storage.delete(&file.storage_key).await {
            tracing::warn!(
                file_id = %file_id,
                key = %file.storage_key,
                error = %e,
                "Blob delete failed; removing row anyway"
            );
        }

        self.files.delete(file_id).await
    }

    /// Look up a pipeline run by job id.
    #[tracing::instrument(skip(self), fields(user_id = %caller.user_id, job_id = %job_id))]
    pub async fn get_job(&self, caller: Caller, job_id: Uuid) -> Result<ProcessingJob, AppError> {
        let (job, owner) = self
            .jobs
            .get(job_id)
            .await
            .ok_or_else(|| AppError::NotFound("Job not found".to_string()))?;

        if !caller.may_access(owner) {
            return Err(AppError::Forbidden(
                "You do not have access to this job".to_string(),
            ));
        }

        Ok(job)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translation_skip_rules() {
        assert!(translation_skipped("auto", "en"));
        assert!(translation_skipped("en", "en"));
        assert!(translation_skipped("EN", "en"));
        assert!(!translation_skipped("de", "en"));
        assert!(!translation_skipped("fr", "en"));
    }

    #[test]
    fn test_local_midnight_is_today() {
        let midnight = local_midnight();
        assert!(midnight <= Utc::now());
        // Never older than 25h, even across DST shifts.
        assert!(Utc::now() - midnight < chrono::Duration::hours(25));
    }
}
