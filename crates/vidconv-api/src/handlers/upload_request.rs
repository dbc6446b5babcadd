use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use std::sync::Arc;
use vidconv_core::models::{UploadRequest, UploadRequestResponse};

/// Create a job and return a presigned upload URL
#[utoipa::path(
    post,
    path = "/upload-request",
    tag = "uploads",
    request_body = UploadRequest,
    responses(
        (status = 201, description = "Job created", body = UploadRequestResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, request), fields(operation = "upload_request"))]
pub async fn post_upload_request(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<UploadRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let response = state.lifecycle.create_job(&request).await?;

    tracing::info!(
        job_id = %response.job_id,
        file_name = %request.file_name,
        "Upload request accepted"
    );

    Ok((StatusCode::CREATED, Json(response)))
}
