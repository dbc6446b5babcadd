//! OpenAPI document definition.

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "vidconv API",
        description = "Upload-and-transcode job service: request an upload slot, upload directly to object storage, poll job status until the transcode finishes."
    ),
    paths(
        crate::handlers::upload_request::post_upload_request,
        crate::handlers::jobs::get_job,
        crate::handlers::jobs::list_jobs,
        crate::handlers::events::post_object_stored,
        crate::handlers::events::post_transcode_event,
        crate::handlers::health::get_health,
    ),
    components(schemas(
        vidconv_core::models::UploadRequest,
        vidconv_core::models::UploadRequestResponse,
        vidconv_core::models::JobResponse,
        vidconv_core::models::JobSummary,
        vidconv_core::models::JobListResponse,
        vidconv_core::models::JobStatus,
        vidconv_core::models::PaginationInfo,
        vidconv_core::models::ObjectStoredEvent,
        vidconv_core::models::events::ObjectStoredDetail,
        vidconv_core::models::events::ObjectRef,
        vidconv_core::models::TranscodeEvent,
        vidconv_core::models::events::TranscodeEventDetail,
        vidconv_core::models::events::OutputGroupDetail,
        vidconv_core::models::events::OutputDetail,
        crate::error::ErrorResponse,
        crate::handlers::health::HealthResponse,
    )),
    tags(
        (name = "uploads", description = "Upload slot creation"),
        (name = "jobs", description = "Job status queries"),
        (name = "events", description = "Inbound collaborator notifications"),
        (name = "health", description = "Service health")
    )
)]
pub struct ApiDoc;
