//! File repository: CRUD and conditional status transitions for the files table.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use scribo_core::models::{FileRecord, FileStatus};
use scribo_core::AppError;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use crate::stores::{FileStore, NewFile};

const FILE_COLUMNS: &str = "id, user_id, filename, storage_key, content_type, size_bytes, \
     status, transcription, summary, translation, language, created_at, updated_at";

/// Repository for the files table.
///
/// All status transitions are single conditional UPDATEs so two concurrent
/// callers can never both win: the losing statement matches zero rows and the
/// caller sees `None`.
#[derive(Clone)]
pub struct FileRepository {
    pool: PgPool,
}

impl FileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FileStore for FileRepository {
    #[tracing::instrument(skip(self, file), fields(db.table = "files", user_id = %file.user_id))]
    async fn create(&self, file: NewFile) -> Result<FileRecord, AppError> {
        let row: FileRecord = sqlx::query_as::<Postgres, FileRecord>(&format!(
            r#"
            INSERT INTO files (user_id, filename, storage_key, content_type, size_bytes, status, language)
            VALUES ($1, $2, $3, $4, $5, 'UPLOADED', $6)
            RETURNING {FILE_COLUMNS}
            "#,
        ))
        .bind(file.user_id)
        .bind(&file.filename)
        .bind(&file.storage_key)
        .bind(&file.content_type)
        .bind(file.size_bytes)
        .bind(&file.language)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    #[tracing::instrument(skip(self), fields(db.table = "files", db.record_id = %id))]
    async fn get(&self, id: Uuid) -> Result<Option<FileRecord>, AppError> {
        let row: Option<FileRecord> = sqlx::query_as::<Postgres, FileRecord>(&format!(
            "SELECT {FILE_COLUMNS} FROM files WHERE id = $1",
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    #[tracing::instrument(skip(self), fields(db.table = "files", user_id = %user_id, page, limit))]
    async fn list(
        &self,
        user_id: Uuid,
        page: i64,
        limit: i64,
        status: Option<FileStatus>,
    ) -> Result<(Vec<FileRecord>, i64), AppError> {
        let offset = (page - 1) * limit;

        let rows: Vec<FileRecord> = sqlx::query_as::<Postgres, FileRecord>(&format!(
            r#"
            SELECT {FILE_COLUMNS} FROM files
            WHERE user_id = $1 AND ($2::text IS NULL OR status = $2)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        ))
        .bind(user_id)
        .bind(status.map(|s| s.to_string()))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar::<Postgres, i64>(
            "SELECT COUNT(*) FROM files WHERE user_id = $1 AND ($2::text IS NULL OR status = $2)",
        )
        .bind(user_id)
        .bind(status.map(|s| s.to_string()))
        .fetch_one(&self.pool)
        .await?;

        Ok((rows, total))
    }

    #[tracing::instrument(skip(self), fields(db.table = "files", db.record_id = %id))]
    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        sqlx::query("DELETE FROM files WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(db.table = "files", user_id = %user_id))]
    async fn count_for_user(&self, user_id: Uuid) -> Result<i64, AppError> {
        let count: i64 =
            sqlx::query_scalar::<Postgres, i64>("SELECT COUNT(*) FROM files WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    #[tracing::instrument(skip(self), fields(db.table = "files", user_id = %user_id, since = %since))]
    async fn count_for_user_since(
        &self,
        user_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar::<Postgres, i64>(
            "SELECT COUNT(*) FROM files WHERE user_id = $1 AND created_at >= $2",
        )
        .bind(user_id)
        .bind(since)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    #[tracing::instrument(skip(self), fields(db.table = "files", db.record_id = %id))]
    async fn claim_for_processing(&self, id: Uuid) -> Result<Option<FileRecord>, AppError> {
        let row: Option<FileRecord> = sqlx::query_as::<Postgres, FileRecord>(&format!(
            r#"
            UPDATE files SET status = 'PROCESSING', updated_at = now()
            WHERE id = $1 AND status IN ('UPLOADED', 'ERROR')
            RETURNING {FILE_COLUMNS}
            "#,
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    #[tracing::instrument(skip(self, transcription), fields(db.table = "files", db.record_id = %id))]
    async fn set_transcribed(
        &self,
        id: Uuid,
        transcription: &str,
    ) -> Result<Option<FileRecord>, AppError> {
        let row: Option<FileRecord> = sqlx::query_as::<Postgres, FileRecord>(&format!(
            r#"
            UPDATE files SET transcription = $2, status = 'TRANSCRIBED', updated_at = now()
            WHERE id = $1 AND status = 'PROCESSING'
            RETURNING {FILE_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(transcription)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    #[tracing::instrument(skip(self, summary), fields(db.table = "files", db.record_id = %id))]
    async fn set_summarized(
        &self,
        id: Uuid,
        summary: &str,
    ) -> Result<Option<FileRecord>, AppError> {
        let row: Option<FileRecord> = sqlx::query_as::<Postgres, FileRecord>(&format!(
            r#"
            UPDATE files SET summary = $2, status = 'SUMMARIZED', updated_at = now()
            WHERE id = $1 AND status = 'TRANSCRIBED'
            RETURNING {FILE_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(summary)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    #[tracing::instrument(skip(self, translation), fields(db.table = "files", db.record_id = %id, language))]
    async fn set_translated(
        &self,
        id: Uuid,
        translation: &str,
        language: &str,
    ) -> Result<Option<FileRecord>, AppError> {
        let row: Option<FileRecord> = sqlx::query_as::<Postgres, FileRecord>(&format!(
            r#"
            UPDATE files SET translation = $2, language = $3, status = 'TRANSLATED', updated_at = now()
            WHERE id = $1 AND status = 'SUMMARIZED'
            RETURNING {FILE_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(translation)
        .bind(language)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    // A failed translation lands here with the file still at SUMMARIZED, so
    // only TRANSLATED is protected. ERROR keeps the file claimable for retry.
    #[tracing::instrument(skip(self), fields(db.table = "files", db.record_id = %id))]
    async fn mark_error(&self, id: Uuid) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE files SET status = 'ERROR', updated_at = now()
            WHERE id = $1 AND status <> 'TRANSLATED'
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
