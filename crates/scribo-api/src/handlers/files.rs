//! File endpoints: upload, list, get, delete, and trigger processing.

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use scribo_core::models::{
    FileDetailResponse, FileListQuery, FilePage, FileResponse, ProcessingJob, UploadRequest,
};
use scribo_core::AppError;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::auth::AuthUser;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;

/// Pull the audio part and optional language field out of the multipart body.
async fn read_upload(mut multipart: Multipart) -> Result<UploadRequest, AppError> {
    let mut file: Option<(String, String, Vec<u8>)> = None;
    let mut language = "auto".to_string();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Malformed multipart body: {}", e)))?
    {
        match field.name() {
            Some("file") => {
                let filename = field
                    .file_name()
                    .map(String::from)
                    .ok_or_else(|| AppError::InvalidInput("File part needs a filename".to_string()))?;
                let content_type = field
                    .content_type()
                    .map(String::from)
                    .unwrap_or_else(|| "application/octet-stream".to_string());
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::InvalidInput(format!("Failed to read file: {}", e)))?
                    .to_vec();
                file = Some((filename, content_type, data));
            }
            Some("language") => {
                language = field
                    .text()
                    .await
                    .map_err(|e| AppError::InvalidInput(format!("Failed to read language: {}", e)))?
                    .trim()
                    .to_lowercase();
                if language.is_empty() {
                    language = "auto".to_string();
                }
            }
            _ => {}
        }
    }

    let (filename, content_type, data) =
        file.ok_or_else(|| AppError::InvalidInput("Missing 'file' part".to_string()))?;

    let request = UploadRequest {
        filename,
        content_type,
        language,
        data,
    };
    request.validate()?;

    Ok(request)
}

fn validate_audio_type(
    state: &AppState,
    filename: &str,
    content_type: &str,
) -> Result<(), AppError> {
    let extension = filename
        .rsplit('.')
        .next()
        .map(str::to_lowercase)
        .filter(|ext| ext != filename);

    let extension = extension.ok_or_else(|| {
        AppError::InvalidInput("Filename must have an audio extension".to_string())
    })?;

    if !state
        .config
        .audio_allowed_extensions
        .iter()
        .any(|e| e == &extension)
    {
        return Err(AppError::InvalidInput(format!(
            "Unsupported audio extension: {}",
            extension
        )));
    }

    let normalized = content_type.to_lowercase();
    if !state
        .config
        .audio_allowed_content_types
        .iter()
        .any(|c| c == &normalized)
    {
        return Err(AppError::InvalidInput(format!(
            "Unsupported content type: {}",
            content_type
        )));
    }

    Ok(())
}

#[utoipa::path(
    post,
    path = "/v1/files",
    tag = "files",
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "File uploaded", body = FileResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 402, description = "Quota exceeded", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, multipart), fields(user_id = %user.user_id, operation = "upload_file"))]
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    multipart: Multipart,
) -> Result<(StatusCode, Json<FileResponse>), HttpAppError> {
    let upload = read_upload(multipart).await?;

    validate_audio_type(&state, &upload.filename, &upload.content_type)?;

    if upload.data.len() > state.config.max_audio_size_bytes {
        return Err(HttpAppError(AppError::PayloadTooLarge(format!(
            "File exceeds the server limit of {} bytes",
            state.config.max_audio_size_bytes
        ))));
    }

    let file = state
        .lifecycle
        .create_file(
            user,
            &upload.filename,
            &upload.content_type,
            &upload.language,
            upload.data,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(file)))
}

#[utoipa::path(
    get,
    path = "/v1/files",
    tag = "files",
    params(
        ("page" = Option<i64>, Query, description = "1-based page number"),
        ("limit" = Option<i64>, Query, description = "Page size, max 100"),
        ("status" = Option<String>, Query, description = "Filter by status, e.g. TRANSCRIBED"),
    ),
    responses(
        (status = 200, description = "Page of the caller's files", body = FilePage),
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, query), fields(user_id = %user.user_id, operation = "list_files"))]
pub async fn list_files(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Query(query): Query<FileListQuery>,
) -> Result<Json<FilePage>, HttpAppError> {
    let page = state.lifecycle.list_files(user, query).await?;
    Ok(Json(page))
}

#[utoipa::path(
    get,
    path = "/v1/files/{id}",
    tag = "files",
    params(("id" = Uuid, Path, description = "File id")),
    responses(
        (status = 200, description = "File with its processing log", body = FileDetailResponse),
        (status = 403, description = "Not the owner", body = ErrorResponse),
        (status = 404, description = "File not found", body = ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state), fields(user_id = %user.user_id, file_id = %id, operation = "get_file"))]
pub async fn get_file(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<FileDetailResponse>, HttpAppError> {
    let detail = state.lifecycle.get_file(user, id).await?;
    Ok(Json(detail))
}

#[utoipa::path(
    delete,
    path = "/v1/files/{id}",
    tag = "files",
    params(("id" = Uuid, Path, description = "File id")),
    responses(
        (status = 204, description = "File deleted"),
        (status = 403, description = "Not the owner", body = ErrorResponse),
        (status = 404, description = "File not found", body = ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state), fields(user_id = %user.user_id, file_id = %id, operation = "delete_file"))]
pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, HttpAppError> {
    state.lifecycle.delete_file(user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/v1/files/{id}/process",
    tag = "files",
    params(("id" = Uuid, Path, description = "File id")),
    responses(
        (status = 202, description = "Processing started", body = ProcessingJob),
        (status = 404, description = "File not found", body = ErrorResponse),
        (status = 409, description = "File is not in a processable state", body = ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state), fields(user_id = %user.user_id, file_id = %id, operation = "process_file"))]
pub async fn process_file(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<ProcessingJob>), HttpAppError> {
    let job = state.lifecycle.trigger_processing(user, id).await?;
    Ok((StatusCode::ACCEPTED, Json(job)))
}
