//! Inbound notification endpoints.
//!
//! These are called by delivery infrastructure, not public clients. Both
//! endpoints acknowledge no-op duplicates with 200 so that processed events
//! are not redelivered forever; only malformed payloads (4xx) and transient
//! store/engine failures (5xx) are refused.

use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::services::lifecycle::EventOutcome;
use crate::state::AppState;
use axum::{extract::State, response::IntoResponse, Json};
use std::sync::Arc;
use vidconv_core::models::{ObjectStoredEvent, TranscodeEvent};
use vidconv_core::AppError;
use vidconv_storage::keys::INPUT_PREFIX;

fn ack(message: String) -> impl IntoResponse {
    Json(serde_json::json!({ "message": message }))
}

/// Handle an "object stored" notification from object storage
#[utoipa::path(
    post,
    path = "/events/object-stored",
    tag = "events",
    request_body = ObjectStoredEvent,
    responses(
        (status = 200, description = "Notification processed (or duplicate acknowledged)"),
        (status = 400, description = "Malformed notification", body = ErrorResponse),
        (status = 502, description = "Transcode engine unavailable", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, event))]
pub async fn post_object_stored(
    State(state): State<Arc<AppState>>,
    ValidatedJson(event): ValidatedJson<ObjectStoredEvent>,
) -> Result<impl IntoResponse, HttpAppError> {
    if !event.is_object_created() {
        return Err(HttpAppError::from(AppError::BadRequest(format!(
            "Unexpected event type: {}",
            event.detail_type
        ))));
    }

    let key = &event.detail.object.key;

    // Objects outside the upload prefix (transcode outputs land in the same
    // bucket) are not upload events.
    if !key.starts_with(INPUT_PREFIX) {
        tracing::debug!(key = %key, "Object outside upload prefix, ignoring");
        return Ok(ack(format!("Ignored non-upload object: {}", key)));
    }

    let message = match state.lifecycle.on_object_stored(key).await? {
        EventOutcome::Applied(job) => {
            format!(
                "Job queued: {}, {}",
                job.engine_job_id.as_deref().unwrap_or_default(),
                key
            )
        }
        EventOutcome::Duplicate => format!("Duplicate delivery acknowledged: {}", key),
        EventOutcome::Ignored => format!("Unknown job, dropped: {}", key),
    };

    Ok(ack(message))
}

/// Handle a transcode completion/failure notification from the engine
#[utoipa::path(
    post,
    path = "/events/transcode",
    tag = "events",
    request_body = TranscodeEvent,
    responses(
        (status = 200, description = "Notification processed (or duplicate acknowledged)"),
        (status = 400, description = "Malformed notification", body = ErrorResponse),
        (status = 404, description = "No job matches the engine handle", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, event))]
pub async fn post_transcode_event(
    State(state): State<Arc<AppState>>,
    ValidatedJson(event): ValidatedJson<TranscodeEvent>,
) -> Result<impl IntoResponse, HttpAppError> {
    let outcome = event.detail.outcome()?;
    let engine_job_id = &event.detail.job_id;

    let message = match state
        .lifecycle
        .on_transcode_notification(engine_job_id, outcome)
        .await?
    {
        EventOutcome::Applied(job) => {
            format!("Job {} finished: {}", job.job_id, job.status)
        }
        EventOutcome::Duplicate => {
            format!("Duplicate notification acknowledged: {}", engine_job_id)
        }
        EventOutcome::Ignored => format!("No job for handle, dropped: {}", engine_job_id),
    };

    Ok(ack(message))
}
