//! Processing log repository: accumulating usage upserts for processing_logs.

use async_trait::async_trait;
use scribo_core::models::{ProcessingLog, UsageDelta};
use scribo_core::AppError;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use crate::stores::ProcessingLogStore;

const LOG_COLUMNS: &str =
    "file_id, whisper_duration, token_count, last_error, created_at, updated_at";

/// Repository for the processing_logs table (1:1 with files).
#[derive(Clone)]
pub struct ProcessingLogRepository {
    pool: PgPool,
}

impl ProcessingLogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProcessingLogStore for ProcessingLogRepository {
    #[tracing::instrument(skip(self, delta), fields(db.table = "processing_logs", file_id = %file_id))]
    async fn record_usage(
        &self,
        file_id: Uuid,
        delta: UsageDelta,
    ) -> Result<ProcessingLog, AppError> {
        let row: ProcessingLog = sqlx::query_as::<Postgres, ProcessingLog>(&format!(
            r#"
            INSERT INTO processing_logs (file_id, whisper_duration, token_count)
            VALUES ($1, $2, $3)
            ON CONFLICT (file_id) DO UPDATE SET
                whisper_duration = processing_logs.whisper_duration + EXCLUDED.whisper_duration,
                token_count = processing_logs.token_count + EXCLUDED.token_count,
                updated_at = now()
            RETURNING {LOG_COLUMNS}
            "#,
        ))
        .bind(file_id)
        .bind(delta.whisper_duration)
        .bind(delta.token_count)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    #[tracing::instrument(skip(self, message), fields(db.table = "processing_logs", file_id = %file_id))]
    async fn set_last_error(&self, file_id: Uuid, message: &str) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO processing_logs (file_id, last_error)
            VALUES ($1, $2)
            ON CONFLICT (file_id) DO UPDATE SET
                last_error = EXCLUDED.last_error,
                updated_at = now()
            "#,
        )
        .bind(file_id)
        .bind(message)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(db.table = "processing_logs", file_id = %file_id))]
    async fn clear_last_error(&self, file_id: Uuid) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE processing_logs SET last_error = NULL, updated_at = now() WHERE file_id = $1",
        )
        .bind(file_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(db.table = "processing_logs", file_id = %file_id))]
    async fn get(&self, file_id: Uuid) -> Result<Option<ProcessingLog>, AppError> {
        let row: Option<ProcessingLog> = sqlx::query_as::<Postgres, ProcessingLog>(&format!(
            "SELECT {LOG_COLUMNS} FROM processing_logs WHERE file_id = $1",
        ))
        .bind(file_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }
}
