//! End-to-end tests of the file lifecycle over in-memory collaborators.

use scribo_core::models::{FileListQuery, FileStatus, JobStatus, UserQuota};
use scribo_core::AppError;
use scribo_pipeline::test_helpers::{admin_caller, harness, user_caller, wait_for_job};
use uuid::Uuid;

async fn upload(
    h: &scribo_pipeline::test_helpers::Harness,
    caller: scribo_core::models::Caller,
    language: &str,
) -> scribo_core::models::FileResponse {
    h.lifecycle
        .create_file(caller, "meeting.mp3", "audio/mpeg", language, b"audio-bytes".to_vec())
        .await
        .unwrap()
}

#[tokio::test]
async fn upload_creates_file_in_uploaded_state() {
    let h = harness();
    let caller = user_caller();

    let file = upload(&h, caller, "auto").await;

    assert_eq!(file.status, FileStatus::Uploaded);
    assert_eq!(file.filename, "meeting.mp3");
    assert_eq!(file.size_bytes, 11);
    assert!(file.transcription.is_none());
    assert_eq!(h.storage.blob_count(), 1);
}

#[tokio::test]
async fn upload_rejects_empty_input() {
    let h = harness();
    let caller = user_caller();

    let err = h
        .lifecycle
        .create_file(caller, "  ", "audio/mpeg", "auto", b"x".to_vec())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidInput(_)));

    let err = h
        .lifecycle
        .create_file(caller, "a.mp3", "audio/mpeg", "auto", Vec::new())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidInput(_)));
}

#[tokio::test]
async fn full_pipeline_reaches_translated() {
    let h = harness();
    let caller = user_caller();
    let file = upload(&h, caller, "de").await;

    let job = h.lifecycle.trigger_processing(caller, file.id).await.unwrap();
    let job = wait_for_job(&h.lifecycle, caller, job.id).await;

    assert_eq!(job.status, JobStatus::Completed);
    assert!(job.started_at.is_some());
    assert!(job.finished_at.is_some());

    let record = h.files.record_of(file.id).unwrap();
    assert_eq!(record.status, FileStatus::Translated);
    assert_eq!(record.transcription.as_deref(), Some("hello world"));
    assert_eq!(record.summary.as_deref(), Some("a summary"));
    assert_eq!(record.translation.as_deref(), Some("eine zusammenfassung"));
    assert_eq!(record.language, "de");

    let log = h.logs.log_of(file.id).unwrap();
    assert_eq!(log.whisper_duration, 12.5);
    assert_eq!(log.token_count, 150);
    assert!(log.last_error.is_none());
}

#[tokio::test]
async fn translation_skipped_for_auto_target() {
    let h = harness();
    let caller = user_caller();
    let file = upload(&h, caller, "auto").await;

    let job = h.lifecycle.trigger_processing(caller, file.id).await.unwrap();
    let job = wait_for_job(&h.lifecycle, caller, job.id).await;

    assert_eq!(job.status, JobStatus::Completed);
    let record = h.files.record_of(file.id).unwrap();
    assert_eq!(record.status, FileStatus::Summarized);
    assert!(record.translation.is_none());
    assert_eq!(h.translator.calls(), 0);
}

#[tokio::test]
async fn translation_skipped_when_target_equals_source() {
    let h = harness();
    let caller = user_caller();
    let file = upload(&h, caller, "EN").await;

    let job = h.lifecycle.trigger_processing(caller, file.id).await.unwrap();
    wait_for_job(&h.lifecycle, caller, job.id).await;

    let record = h.files.record_of(file.id).unwrap();
    assert_eq!(record.status, FileStatus::Summarized);
    assert_eq!(h.translator.calls(), 0);
}

#[tokio::test]
async fn transcription_failure_moves_file_to_error() {
    let h = harness();
    let caller = user_caller();
    let file = upload(&h, caller, "de").await;

    h.transcriber.fail_next();
    let job = h.lifecycle.trigger_processing(caller, file.id).await.unwrap();
    let job = wait_for_job(&h.lifecycle, caller, job.id).await;

    assert_eq!(job.status, JobStatus::Failed);
    assert!(job.error.as_deref().unwrap().contains("transcription"));

    let record = h.files.record_of(file.id).unwrap();
    assert_eq!(record.status, FileStatus::Error);

    let log = h.logs.log_of(file.id).unwrap();
    assert!(log.last_error.as_deref().unwrap().contains("transcription"));
    // Nothing billed before the failure.
    assert_eq!(log.whisper_duration, 0.0);
    assert_eq!(log.token_count, 0);
}

#[tokio::test]
async fn summarization_failure_keeps_transcript_and_billed_usage() {
    let h = harness();
    let caller = user_caller();
    let file = upload(&h, caller, "de").await;

    h.summarizer.fail_next();
    let job = h.lifecycle.trigger_processing(caller, file.id).await.unwrap();
    let job = wait_for_job(&h.lifecycle, caller, job.id).await;

    assert_eq!(job.status, JobStatus::Failed);

    let record = h.files.record_of(file.id).unwrap();
    assert_eq!(record.status, FileStatus::Error);
    assert_eq!(record.transcription.as_deref(), Some("hello world"));
    assert!(record.summary.is_none());

    let log = h.logs.log_of(file.id).unwrap();
    assert_eq!(log.whisper_duration, 12.5);
    assert!(log.last_error.is_some());
}

#[tokio::test]
async fn translation_failure_marks_error_and_allows_retry() {
    let h = harness();
    let caller = user_caller();
    let file = upload(&h, caller, "de").await;

    h.translator.fail_next();
    let job = h.lifecycle.trigger_processing(caller, file.id).await.unwrap();
    let job = wait_for_job(&h.lifecycle, caller, job.id).await;

    assert_eq!(job.status, JobStatus::Failed);
    assert!(job.error.as_deref().unwrap().contains("translation"));

    // The summary survives but the file is in ERROR, not stuck at SUMMARIZED.
    let record = h.files.record_of(file.id).unwrap();
    assert_eq!(record.status, FileStatus::Error);
    assert_eq!(record.summary.as_deref(), Some("a summary"));
    assert!(record.translation.is_none());

    let log = h.logs.log_of(file.id).unwrap();
    assert!(log.last_error.as_deref().unwrap().contains("translation"));

    h.translator.succeed();
    let retry = h.lifecycle.trigger_processing(caller, file.id).await.unwrap();
    let retry = wait_for_job(&h.lifecycle, caller, retry.id).await;

    assert_eq!(retry.status, JobStatus::Completed);
    let record = h.files.record_of(file.id).unwrap();
    assert_eq!(record.status, FileStatus::Translated);
    assert_eq!(record.translation.as_deref(), Some("eine zusammenfassung"));

    let log = h.logs.log_of(file.id).unwrap();
    // Both runs billed transcription and summarization; only the retry billed
    // translation.
    assert_eq!(log.whisper_duration, 25.0);
    assert_eq!(log.token_count, 250);
    assert!(log.last_error.is_none());
}

#[tokio::test]
async fn translator_receives_the_transcription() {
    let h = harness();
    let caller = user_caller();
    let file = upload(&h, caller, "de").await;

    let job = h.lifecycle.trigger_processing(caller, file.id).await.unwrap();
    wait_for_job(&h.lifecycle, caller, job.id).await;

    assert_eq!(h.translator.last_input().as_deref(), Some("hello world"));
}

#[tokio::test]
async fn download_failure_moves_file_to_error() {
    let h = harness();
    let caller = user_caller();
    let file = upload(&h, caller, "auto").await;

    h.storage.fail_downloads();
    let job = h.lifecycle.trigger_processing(caller, file.id).await.unwrap();
    let job = wait_for_job(&h.lifecycle, caller, job.id).await;

    assert_eq!(job.status, JobStatus::Failed);
    assert!(job.error.as_deref().unwrap().contains("download"));
    assert_eq!(h.files.status_of(file.id), Some(FileStatus::Error));
    assert_eq!(h.transcriber.calls(), 0);
}

#[tokio::test]
async fn retry_after_error_reruns_and_accumulates_usage() {
    let h = harness();
    let caller = user_caller();
    let file = upload(&h, caller, "de").await;

    h.summarizer.fail_next();
    let job = h.lifecycle.trigger_processing(caller, file.id).await.unwrap();
    wait_for_job(&h.lifecycle, caller, job.id).await;
    assert_eq!(h.files.status_of(file.id), Some(FileStatus::Error));

    h.summarizer.succeed();
    let retry = h.lifecycle.trigger_processing(caller, file.id).await.unwrap();
    let retry = wait_for_job(&h.lifecycle, caller, retry.id).await;

    assert_eq!(retry.status, JobStatus::Completed);
    let record = h.files.record_of(file.id).unwrap();
    assert_eq!(record.status, FileStatus::Translated);

    let log = h.logs.log_of(file.id).unwrap();
    // Transcription ran twice; both runs are billed.
    assert_eq!(log.whisper_duration, 25.0);
    assert_eq!(log.token_count, 150);
    assert!(log.last_error.is_none());
    assert_eq!(h.transcriber.calls(), 2);
}

#[tokio::test]
async fn trigger_while_processing_is_a_conflict() {
    let h = harness();
    let caller = user_caller();
    let file = upload(&h, caller, "auto").await;

    // Simulate a concurrent caller that claimed the file first.
    use scribo_db::FileStore;
    h.files.claim_for_processing(file.id).await.unwrap().unwrap();

    let err = h
        .lifecycle
        .trigger_processing(caller, file.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn trigger_on_completed_file_is_a_conflict() {
    let h = harness();
    let caller = user_caller();
    let file = upload(&h, caller, "auto").await;

    let job = h.lifecycle.trigger_processing(caller, file.id).await.unwrap();
    wait_for_job(&h.lifecycle, caller, job.id).await;
    assert_eq!(h.files.status_of(file.id), Some(FileStatus::Summarized));

    let err = h
        .lifecycle
        .trigger_processing(caller, file.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn trigger_on_missing_file_is_not_found() {
    let h = harness();
    let err = h
        .lifecycle
        .trigger_processing(user_caller(), Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn max_files_quota_rejects_upload() {
    let h = harness();
    let caller = user_caller();
    let mut quota = UserQuota::default_for(caller.user_id);
    quota.max_files = 2;
    quota.daily_file_limit = 100;
    h.quotas.set(quota);

    upload(&h, caller, "auto").await;
    upload(&h, caller, "auto").await;

    let err = h
        .lifecycle
        .create_file(caller, "third.mp3", "audio/mpeg", "auto", b"x".to_vec())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::QuotaExceeded { resource: "files", used: 2, limit: 2 }
    ));
}

#[tokio::test]
async fn daily_limit_rejects_upload() {
    let h = harness();
    let caller = user_caller();
    let mut quota = UserQuota::default_for(caller.user_id);
    quota.max_files = 100;
    quota.daily_file_limit = 1;
    h.quotas.set(quota);

    upload(&h, caller, "auto").await;

    let err = h
        .lifecycle
        .create_file(caller, "second.mp3", "audio/mpeg", "auto", b"x".to_vec())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::QuotaExceeded { resource: "daily uploads", .. }
    ));
}

#[tokio::test]
async fn oversized_upload_rejected() {
    let h = harness();
    let caller = user_caller();
    let mut quota = UserQuota::default_for(caller.user_id);
    quota.max_file_size = 4;
    h.quotas.set(quota);

    let err = h
        .lifecycle
        .create_file(caller, "big.mp3", "audio/mpeg", "auto", b"12345".to_vec())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::PayloadTooLarge(_)));
    assert_eq!(h.storage.blob_count(), 0);
}

#[tokio::test]
async fn failed_insert_cleans_up_blob() {
    let h = harness();
    let caller = user_caller();

    h.files.fail_with("insert rejected");
    let err = h
        .lifecycle
        .create_file(caller, "a.mp3", "audio/mpeg", "auto", b"x".to_vec())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Internal(_)));
    assert_eq!(h.storage.blob_count(), 0);
}

#[tokio::test]
async fn list_paginates_and_filters() {
    let h = harness();
    let caller = user_caller();
    let mut quota = UserQuota::default_for(caller.user_id);
    quota.max_files = 100;
    quota.daily_file_limit = 100;
    h.quotas.set(quota);

    for _ in 0..25 {
        upload(&h, caller, "auto").await;
    }

    let page = h
        .lifecycle
        .list_files(
            caller,
            FileListQuery {
                page: Some(3),
                limit: Some(10),
                status: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(page.files.len(), 5);
    assert_eq!(page.pagination.total, 25);
    assert_eq!(page.pagination.total_pages, 3);
    assert_eq!(page.pagination.page, 3);

    let filtered = h
        .lifecycle
        .list_files(
            caller,
            FileListQuery {
                page: Some(1),
                limit: Some(10),
                status: Some(FileStatus::Processing),
            },
        )
        .await
        .unwrap();
    assert_eq!(filtered.pagination.total, 0);
    assert!(filtered.files.is_empty());

    // Another user sees nothing.
    let other = h
        .lifecycle
        .list_files(user_caller(), FileListQuery::default())
        .await
        .unwrap();
    assert_eq!(other.pagination.total, 0);
}

#[tokio::test]
async fn list_is_newest_first() {
    let h = harness();
    let caller = user_caller();

    let first = upload(&h, caller, "auto").await;
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let second = upload(&h, caller, "auto").await;

    let page = h
        .lifecycle
        .list_files(caller, FileListQuery::default())
        .await
        .unwrap();
    assert_eq!(page.files[0].id, second.id);
    assert_eq!(page.files[1].id, first.id);
}

#[tokio::test]
async fn only_owner_or_admin_may_access() {
    let h = harness();
    let owner = user_caller();
    let file = upload(&h, owner, "auto").await;

    let stranger = user_caller();
    let err = h.lifecycle.get_file(stranger, file.id).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    let err = h
        .lifecycle
        .trigger_processing(stranger, file.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    let err = h.lifecycle.delete_file(stranger, file.id).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    let admin = admin_caller();
    let detail = h.lifecycle.get_file(admin, file.id).await.unwrap();
    assert_eq!(detail.file.id, file.id);
}

#[tokio::test]
async fn get_file_includes_processing_log() {
    let h = harness();
    let caller = user_caller();
    let file = upload(&h, caller, "auto").await;

    let detail = h.lifecycle.get_file(caller, file.id).await.unwrap();
    assert!(detail.processing_log.is_none());

    let job = h.lifecycle.trigger_processing(caller, file.id).await.unwrap();
    wait_for_job(&h.lifecycle, caller, job.id).await;

    let detail = h.lifecycle.get_file(caller, file.id).await.unwrap();
    let log = detail.processing_log.unwrap();
    assert_eq!(log.whisper_duration, 12.5);
    assert_eq!(log.token_count, 100);
}

#[tokio::test]
async fn delete_removes_row_and_blob() {
    let h = harness();
    let caller = user_caller();
    let file = upload(&h, caller, "auto").await;
    assert_eq!(h.storage.blob_count(), 1);

    h.lifecycle.delete_file(caller, file.id).await.unwrap();

    assert_eq!(h.storage.blob_count(), 0);
    assert!(h.files.record_of(file.id).is_none());
}

#[tokio::test]
async fn delete_survives_blob_failure() {
    let h = harness();
    let caller = user_caller();
    let file = upload(&h, caller, "auto").await;

    h.storage.fail_deletes();
    h.lifecycle.delete_file(caller, file.id).await.unwrap();
    assert!(h.files.record_of(file.id).is_none());
}

#[tokio::test]
async fn job_lookup_respects_ownership() {
    let h = harness();
    let caller = user_caller();
    let file = upload(&h, caller, "auto").await;

    let job = h.lifecycle.trigger_processing(caller, file.id).await.unwrap();

    let err = h.lifecycle.get_job(user_caller(), job.id).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    let admin = admin_caller();
    assert!(h.lifecycle.get_job(admin, job.id).await.is_ok());

    let err = h
        .lifecycle
        .get_job(caller, Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    wait_for_job(&h.lifecycle, caller, job.id).await;
}
