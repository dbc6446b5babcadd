//! Lifecycle orchestrator tests.
//!
//! Exercised against the in-memory capability fakes in `helpers`. These cover
//! the delivery-semantics contract: duplicate, out-of-order, and unknown
//! notifications must never corrupt a job's forward-only state machine.

mod helpers;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use helpers::{setup_lifecycle, test_settings, MemoryJobStore, RacingTranscodeEngine};
use uuid::Uuid;
use vidconv_api::services::lifecycle::{EventOutcome, JobLifecycleService};
use vidconv_core::models::{JobStatus, TranscodeOutcome, UploadRequest};
use vidconv_core::AppError;

fn upload_request(file_name: &str) -> UploadRequest {
    UploadRequest {
        file_name: file_name.to_string(),
    }
}

/// Drive a fresh job to QUEUED; returns (job_id, storage_key, engine handle).
async fn queue_job(ctx: &helpers::TestLifecycle, file_name: &str) -> (Uuid, String, String) {
    let created = ctx
        .lifecycle
        .create_job(&upload_request(file_name))
        .await
        .unwrap();
    let key = ctx.storage.issued_keys.lock().unwrap().last().unwrap().clone();
    ctx.lifecycle.on_object_stored(&key).await.unwrap();
    let job = ctx.store.snapshot(created.job_id).unwrap();
    (created.job_id, key, job.engine_job_id.unwrap())
}

#[tokio::test]
async fn test_create_job_is_visible_in_waiting_state() {
    let ctx = setup_lifecycle();

    let response = ctx
        .lifecycle
        .create_job(&upload_request("clip.mp4"))
        .await
        .unwrap();

    assert!(response.upload_url.contains(&response.job_id.to_string()));

    let job = ctx.lifecycle.get_job(response.job_id).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::WaitingForUpload);
    assert_eq!(job.file_name, "clip.mp4");
    assert!(job.input_ref.is_none());
    assert!(job.engine_job_id.is_none());
}

#[tokio::test]
async fn test_create_job_generates_unique_ids() {
    let ctx = setup_lifecycle();

    let a = ctx.lifecycle.create_job(&upload_request("a.mp4")).await.unwrap();
    let b = ctx.lifecycle.create_job(&upload_request("b.mp4")).await.unwrap();

    assert_ne!(a.job_id, b.job_id);
    assert_eq!(ctx.store.job_count(), 2);
}

#[tokio::test]
async fn test_create_job_rejects_empty_file_name() {
    let ctx = setup_lifecycle();

    let err = ctx
        .lifecycle
        .create_job(&upload_request(""))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidInput(_)));
    assert_eq!(ctx.store.job_count(), 0);
}

#[tokio::test]
async fn test_create_job_persists_nothing_when_presign_fails() {
    let ctx = setup_lifecycle();
    ctx.storage.fail.store(true, Ordering::SeqCst);

    let err = ctx
        .lifecycle
        .create_job(&upload_request("clip.mp4"))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Storage(_)));
    assert_eq!(ctx.store.job_count(), 0);
}

#[tokio::test]
async fn test_object_stored_transitions_to_queued() {
    let ctx = setup_lifecycle();
    let (job_id, key, handle) = queue_job(&ctx, "clip.mp4").await;

    let job = ctx.store.snapshot(job_id).unwrap();
    assert_eq!(job.status, JobStatus::Queued);
    assert_eq!(job.input_ref.as_deref(), Some(key.as_str()));
    assert_eq!(job.engine_job_id.as_deref(), Some(handle.as_str()));
    assert_eq!(ctx.engine.submission_count(), 1);
}

#[tokio::test]
async fn test_duplicate_object_stored_submits_exactly_once() {
    let ctx = setup_lifecycle();
    let (job_id, key, handle) = queue_job(&ctx, "clip.mp4").await;

    let outcome = ctx.lifecycle.on_object_stored(&key).await.unwrap();
    assert!(matches!(outcome, EventOutcome::Duplicate));

    // Second delivery must not reach the engine or disturb the record.
    assert_eq!(ctx.engine.submission_count(), 1);
    let job = ctx.store.snapshot(job_id).unwrap();
    assert_eq!(job.status, JobStatus::Queued);
    assert_eq!(job.engine_job_id.as_deref(), Some(handle.as_str()));
}

#[tokio::test]
async fn test_object_stored_malformed_key_rejected_without_mutation() {
    let ctx = setup_lifecycle();
    ctx.lifecycle.create_job(&upload_request("clip.mp4")).await.unwrap();

    let err = ctx
        .lifecycle
        .on_object_stored("input/not-a-uuid/1-clip.mp4")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidInput(_)));
    assert_eq!(ctx.engine.submission_count(), 0);
}

#[tokio::test]
async fn test_object_stored_unknown_job_dropped() {
    let ctx = setup_lifecycle();

    let key = format!("input/{}/1-clip.mp4", Uuid::new_v4());
    let outcome = ctx.lifecycle.on_object_stored(&key).await.unwrap();

    assert!(matches!(outcome, EventOutcome::Ignored));
    assert_eq!(ctx.engine.submission_count(), 0);
}

#[tokio::test]
async fn test_object_stored_engine_failure_leaves_job_waiting() {
    let ctx = setup_lifecycle();
    let created = ctx
        .lifecycle
        .create_job(&upload_request("clip.mp4"))
        .await
        .unwrap();
    let key = ctx.storage.issued_keys.lock().unwrap()[0].clone();

    ctx.engine.fail.store(true, Ordering::SeqCst);
    let err = ctx.lifecycle.on_object_stored(&key).await.unwrap_err();
    assert!(matches!(err, AppError::Transcode(_)));

    // The job stays eligible for redelivery.
    let job = ctx.store.snapshot(created.job_id).unwrap();
    assert_eq!(job.status, JobStatus::WaitingForUpload);

    ctx.engine.fail.store(false, Ordering::SeqCst);
    ctx.lifecycle.on_object_stored(&key).await.unwrap();
    let job = ctx.store.snapshot(created.job_id).unwrap();
    assert_eq!(job.status, JobStatus::Queued);
}

#[tokio::test]
async fn test_queued_race_discards_losing_engine_handle() {
    // An identical delivery commits QUEUED while this handler is mid-submit.
    let store = Arc::new(MemoryJobStore::new());
    let storage = Arc::new(helpers::MockUploadStorage::new());
    let racing_engine = Arc::new(RacingTranscodeEngine::new(store.clone()));
    let lifecycle = JobLifecycleService::new(
        store.clone(),
        storage.clone(),
        racing_engine,
        test_settings(),
    );

    let created = lifecycle.create_job(&upload_request("clip.mp4")).await.unwrap();
    let key = storage.issued_keys.lock().unwrap()[0].clone();

    let outcome = lifecycle.on_object_stored(&key).await.unwrap();
    assert!(matches!(outcome, EventOutcome::Duplicate));

    // The first committed handle wins; the loser's handle is discarded.
    let job = store.snapshot(created.job_id).unwrap();
    assert_eq!(job.status, JobStatus::Queued);
    assert_eq!(job.engine_job_id.as_deref(), Some("mc-winner"));
}

#[tokio::test]
async fn test_success_notification_reaches_succeeded() {
    let ctx = setup_lifecycle();
    let (job_id, _key, handle) = queue_job(&ctx, "clip.mp4").await;

    let outcome = ctx
        .lifecycle
        .on_transcode_notification(
            &handle,
            TranscodeOutcome::Success {
                output_refs: vec![format!("out/{}/clip.mp4", job_id)],
            },
        )
        .await
        .unwrap();
    assert!(matches!(outcome, EventOutcome::Applied(_)));

    let job = ctx.store.snapshot(job_id).unwrap();
    assert_eq!(job.status, JobStatus::Succeeded);
    assert_eq!(
        job.output_ref,
        Some(vec![format!("out/{}/clip.mp4", job_id)])
    );
    assert!(job.error_message.is_none());
}

#[tokio::test]
async fn test_failure_notification_records_formatted_error() {
    let ctx = setup_lifecycle();
    let (job_id, _key, handle) = queue_job(&ctx, "clip.mp4").await;

    ctx.lifecycle
        .on_transcode_notification(
            &handle,
            TranscodeOutcome::Failure {
                error_code: 1040,
                error_message: "decode error".to_string(),
            },
        )
        .await
        .unwrap();

    let job = ctx.store.snapshot(job_id).unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(job.error_message.as_deref(), Some("1040: decode error"));
}

#[tokio::test]
async fn test_duplicate_terminal_notification_is_noop() {
    let ctx = setup_lifecycle();
    let (job_id, _key, handle) = queue_job(&ctx, "clip.mp4").await;

    let failure = TranscodeOutcome::Failure {
        error_code: 1040,
        error_message: "decode error".to_string(),
    };
    ctx.lifecycle
        .on_transcode_notification(&handle, failure.clone())
        .await
        .unwrap();
    let first = ctx.store.snapshot(job_id).unwrap();

    let outcome = ctx
        .lifecycle
        .on_transcode_notification(&handle, failure)
        .await
        .unwrap();
    assert!(matches!(outcome, EventOutcome::Duplicate));

    let second = ctx.store.snapshot(job_id).unwrap();
    assert_eq!(second.status, JobStatus::Failed);
    assert_eq!(second.updated_at, first.updated_at);
}

#[tokio::test]
async fn test_terminal_state_never_regresses() {
    let ctx = setup_lifecycle();
    let (job_id, key, handle) = queue_job(&ctx, "clip.mp4").await;

    ctx.lifecycle
        .on_transcode_notification(
            &handle,
            TranscodeOutcome::Success {
                output_refs: vec!["out/clip.mp4".to_string()],
            },
        )
        .await
        .unwrap();

    // A late failure notification for the same handle must not flip the state.
    let outcome = ctx
        .lifecycle
        .on_transcode_notification(
            &handle,
            TranscodeOutcome::Failure {
                error_code: 1040,
                error_message: "decode error".to_string(),
            },
        )
        .await
        .unwrap();
    assert!(matches!(outcome, EventOutcome::Duplicate));

    // A late upload notification must not either.
    let outcome = ctx.lifecycle.on_object_stored(&key).await.unwrap();
    assert!(matches!(outcome, EventOutcome::Duplicate));

    let job = ctx.store.snapshot(job_id).unwrap();
    assert_eq!(job.status, JobStatus::Succeeded);
    assert_eq!(job.output_ref, Some(vec!["out/clip.mp4".to_string()]));
    assert!(job.error_message.is_none());
    assert_eq!(ctx.engine.submission_count(), 1);
}

#[tokio::test]
async fn test_unknown_handle_surfaces_not_found_without_mutation() {
    let ctx = setup_lifecycle();
    let (job_id, _key, _handle) = queue_job(&ctx, "clip.mp4").await;
    let before = ctx.store.snapshot(job_id).unwrap();

    let err = ctx
        .lifecycle
        .on_transcode_notification(
            "mc-foreign",
            TranscodeOutcome::Success {
                output_refs: vec![],
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let after = ctx.store.snapshot(job_id).unwrap();
    assert_eq!(after.status, before.status);
    assert_eq!(after.updated_at, before.updated_at);
}

#[tokio::test]
async fn test_early_notification_resolves_after_redelivery() {
    let ctx = setup_lifecycle();
    let created = ctx
        .lifecycle
        .create_job(&upload_request("clip.mp4"))
        .await
        .unwrap();
    let key = ctx.storage.issued_keys.lock().unwrap()[0].clone();

    // The engine notifies before the local QUEUED transition commits: the
    // handle is not yet visible, so the first delivery is refused.
    let success = TranscodeOutcome::Success {
        output_refs: vec!["out/clip.mp4".to_string()],
    };
    let err = ctx
        .lifecycle
        .on_transcode_notification("mc-0", success.clone())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    // The queue transition lands, then the notification is redelivered.
    ctx.lifecycle.on_object_stored(&key).await.unwrap();
    let outcome = ctx
        .lifecycle
        .on_transcode_notification("mc-0", success)
        .await
        .unwrap();
    assert!(matches!(outcome, EventOutcome::Applied(_)));

    let job = ctx.store.snapshot(created.job_id).unwrap();
    assert_eq!(job.status, JobStatus::Succeeded);
}

#[tokio::test]
async fn test_store_failure_is_surfaced_not_swallowed() {
    let ctx = setup_lifecycle();
    let (_job_id, _key, handle) = queue_job(&ctx, "clip.mp4").await;

    ctx.store.fail_writes.store(true, Ordering::SeqCst);
    let err = ctx
        .lifecycle
        .on_transcode_notification(
            &handle,
            TranscodeOutcome::Success {
                output_refs: vec!["out/clip.mp4".to_string()],
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Internal(_)));
}
