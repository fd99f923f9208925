//! OpenAPI document for the HTTP surface.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health::health,
        crate::handlers::files::upload_file,
        crate::handlers::files::list_files,
        crate::handlers::files::get_file,
        crate::handlers::files::delete_file,
        crate::handlers::files::process_file,
        crate::handlers::jobs::get_job,
    ),
    components(schemas(
        scribo_core::models::FileResponse,
        scribo_core::models::FileDetailResponse,
        scribo_core::models::FilePage,
        scribo_core::models::Pagination,
        scribo_core::models::FileStatus,
        scribo_core::models::ProcessingJob,
        scribo_core::models::JobStatus,
        scribo_core::models::ProcessingLogResponse,
        crate::error::ErrorResponse,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "files", description = "Audio file upload and lifecycle"),
        (name = "jobs", description = "Pipeline run polling"),
        (name = "health", description = "Service health"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
