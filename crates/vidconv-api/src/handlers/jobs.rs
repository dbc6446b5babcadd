use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;
use vidconv_core::models::{JobListQuery, JobListResponse, JobResponse, JobStatus};
use vidconv_core::AppError;

/// Get a job by ID
#[utoipa::path(
    get,
    path = "/jobs/{job_id}",
    tag = "jobs",
    params(("job_id" = String, Path, description = "Job identifier")),
    responses(
        (status = 200, description = "Job found", body = JobResponse),
        (status = 400, description = "Invalid job ID format", body = ErrorResponse),
        (status = 404, description = "Job not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state))]
pub async fn get_job(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<String>,
) -> Result<impl IntoResponse, HttpAppError> {
    // The path segment is taken as a string so a malformed id yields a 400
    // instead of a routing-level rejection.
    let job_id = Uuid::parse_str(&job_id)
        .map_err(|_| AppError::InvalidInput("Invalid job ID format".to_string()))?;

    let job = state
        .lifecycle
        .get_job(job_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Job not found".to_string()))?;

    Ok(Json(JobResponse::from(job)))
}

#[derive(Debug, Deserialize)]
pub struct ListJobsParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub status: Option<String>,
}

/// List jobs ordered by last update
#[utoipa::path(
    get,
    path = "/jobs",
    tag = "jobs",
    params(
        ("limit" = Option<i64>, Query, description = "Page size, between 1 and 1000 (default 50)"),
        ("offset" = Option<i64>, Query, description = "Page offset (default 0)"),
        ("status" = Option<String>, Query, description = "Optional status filter")
    ),
    responses(
        (status = 200, description = "Job listing", body = JobListResponse),
        (status = 400, description = "Invalid query parameters", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state))]
pub async fn list_jobs(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListJobsParams>,
) -> Result<impl IntoResponse, HttpAppError> {
    let limit = params.limit.unwrap_or(50);
    if !(1..=1000).contains(&limit) {
        return Err(HttpAppError::from(AppError::InvalidInput(
            "Limit must be between 1 and 1000".to_string(),
        )));
    }

    let offset = params.offset.unwrap_or(0);
    if offset < 0 {
        return Err(HttpAppError::from(AppError::InvalidInput(
            "Offset must not be negative".to_string(),
        )));
    }

    let status = params
        .status
        .as_deref()
        .map(|s| {
            s.parse::<JobStatus>()
                .map_err(|_| AppError::InvalidInput(format!("Invalid status filter: {}", s)))
        })
        .transpose()?;

    let response = state
        .lifecycle
        .list_jobs(JobListQuery {
            status,
            limit: Some(limit),
            offset: Some(offset),
        })
        .await?;

    Ok(Json::<JobListResponse>(response))
}
