//! Job endpoints: poll an in-flight pipeline run.

use axum::{
    extract::{Path, State},
    Json,
};
use scribo_core::models::ProcessingJob;
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/v1/jobs/{id}",
    tag = "jobs",
    params(("id" = Uuid, Path, description = "Job id")),
    responses(
        (status = 200, description = "Current job state", body = ProcessingJob),
        (status = 404, description = "Job not found", body = ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state), fields(user_id = %user.user_id, job_id = %id, operation = "get_job"))]
pub async fn get_job(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ProcessingJob>, HttpAppError> {
    let job = state.lifecycle.get_job(user, id).await?;
    Ok(Json(job))
}
