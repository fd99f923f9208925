use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Lifecycle status of an uploaded audio file.
///
/// Persisted as UPPERCASE text. Transitions are driven exclusively by the
/// lifecycle controller through conditional updates; see `scribo-pipeline`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[cfg_attr(
    feature = "sqlx",
    derive(sqlx::Type),
    sqlx(type_name = "text", rename_all = "UPPERCASE")
)]
#[serde(rename_all = "UPPERCASE")]
pub enum FileStatus {
    Uploaded,
    Processing,
    Transcribed,
    Summarized,
    Translated,
    Error,
}

impl FileStatus {
    /// A processing run may only be started from these states.
    pub fn can_start_processing(&self) -> bool {
        matches!(self, FileStatus::Uploaded | FileStatus::Error)
    }

    /// Terminal states of a successful pipeline run.
    pub fn is_terminal_success(&self) -> bool {
        matches!(self, FileStatus::Summarized | FileStatus::Translated)
    }
}

impl Display for FileStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            FileStatus::Uploaded => write!(f, "UPLOADED"),
            FileStatus::Processing => write!(f, "PROCESSING"),
            FileStatus::Transcribed => write!(f, "TRANSCRIBED"),
            FileStatus::Summarized => write!(f, "SUMMARIZED"),
            FileStatus::Translated => write!(f, "TRANSLATED"),
            FileStatus::Error => write!(f, "ERROR"),
        }
    }
}

impl FromStr for FileStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "UPLOADED" => Ok(FileStatus::Uploaded),
            "PROCESSING" => Ok(FileStatus::Processing),
            "TRANSCRIBED" => Ok(FileStatus::Transcribed),
            "SUMMARIZED" => Ok(FileStatus::Summarized),
            "TRANSLATED" => Ok(FileStatus::Translated),
            "ERROR" => Ok(FileStatus::Error),
            _ => Err(anyhow::anyhow!("Invalid file status: {}", s)),
        }
    }
}

/// One uploaded audio file and its derived text artifacts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct FileRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub filename: String,
    /// Opaque locator into the blob store; not derived from `filename`.
    pub storage_key: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub status: FileStatus,
    pub transcription: Option<String>,
    pub summary: Option<String>,
    pub translation: Option<String>,
    /// Target language code; "auto" until resolved.
    pub language: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FileResponse {
    pub id: Uuid,
    pub filename: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub status: FileStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcription: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translation: Option<String>,
    pub language: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<FileRecord> for FileResponse {
    fn from(file: FileRecord) -> Self {
        FileResponse {
            id: file.id,
            filename: file.filename,
            content_type: file.content_type,
            size_bytes: file.size_bytes,
            status: file.status,
            transcription: file.transcription,
            summary: file.summary,
            translation: file.translation,
            language: file.language,
            created_at: file.created_at,
            updated_at: file.updated_at,
        }
    }
}

/// Upload payload after multipart extraction, before admission checks.
#[derive(Debug, Validate)]
pub struct UploadRequest {
    #[validate(length(
        min = 1,
        max = 255,
        message = "Filename must be between 1 and 255 characters"
    ))]
    pub filename: String,
    #[validate(length(
        min = 1,
        max = 255,
        message = "Content type must be between 1 and 255 characters"
    ))]
    pub content_type: String,
    /// Target language code, or "auto" to skip translation.
    #[validate(length(
        min = 2,
        max = 16,
        message = "Language must be between 2 and 16 characters"
    ))]
    pub language: String,
    #[validate(length(min = 1, message = "File must not be empty"))]
    pub data: Vec<u8>,
}

/// File plus its processing log, as returned by the get-file operation.
#[derive(Debug, Serialize, ToSchema)]
pub struct FileDetailResponse {
    #[serde(flatten)]
    pub file: FileResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_log: Option<super::processing_log::ProcessingLogResponse>,
}

#[derive(Debug, Deserialize)]
pub struct FileListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub status: Option<FileStatus>,
}

impl Default for FileListQuery {
    fn default() -> Self {
        Self {
            page: Some(1),
            limit: Some(10),
            status: None,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Pagination {
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub total_pages: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FilePage {
    pub files: Vec<FileResponse>,
    pub pagination: Pagination,
}

impl FilePage {
    pub fn new(files: Vec<FileResponse>, total: i64, page: i64, limit: i64) -> Self {
        let total_pages = if limit > 0 {
            (total + limit - 1) / limit
        } else {
            0
        };
        Self {
            files,
            pagination: Pagination {
                total,
                page,
                limit,
                total_pages,
            },
        }
    }
}
