//! Job lifecycle orchestrator
//!
//! Owns the `WAITING_FOR_UPLOAD → QUEUED → {SUCCEEDED | FAILED}` state
//! machine. Two independent event sources deliver signals at least once, in
//! any order: object storage reports uploads, the transcode engine reports
//! completion or failure. Handlers for the same job may run concurrently in
//! separate process instances, so the only synchronization point is the job
//! store's conditional update; there are no in-process locks.
//!
//! Known limitation: two concurrent upload notifications can both observe
//! `WAITING_FOR_UPLOAD` and both submit to the engine before either commits
//! `QUEUED`. The loser's engine handle is discarded and logged. Closing that
//! window would need an intermediate claim state committed before
//! submission, at the cost of a stuck-claim recovery path.

use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;
use validator::Validate;

use vidconv_core::models::{
    Job, JobListQuery, JobListResponse, JobStatus, JobTransition, PaginationInfo,
    TranscodeOutcome, UploadRequest, UploadRequestResponse,
};
use vidconv_core::AppError;
use vidconv_db::{JobStore, UpdateOutcome};
use vidconv_storage::{keys, UploadStorage};
use vidconv_transcode::TranscodeEngine;

/// Orchestrator tuning, fixed at startup.
#[derive(Clone, Debug)]
pub struct LifecycleSettings {
    /// Presigned upload URL validity window.
    pub presigned_url_expiry: Duration,
    /// Lookup retries when an engine notification arrives before the
    /// `QUEUED` transition has committed.
    pub early_notification_retries: u32,
    /// Delay between those retries.
    pub early_notification_backoff: Duration,
}

impl Default for LifecycleSettings {
    fn default() -> Self {
        Self {
            presigned_url_expiry: Duration::from_secs(3600),
            early_notification_retries: 3,
            early_notification_backoff: Duration::from_millis(200),
        }
    }
}

/// How an inbound notification was absorbed.
#[derive(Debug)]
pub enum EventOutcome {
    /// The job advanced; carries the updated record.
    Applied(Box<Job>),
    /// The job had already advanced past the expected state. Acknowledged so
    /// the delivery system stops redelivering.
    Duplicate,
    /// The notification does not correspond to a job in this deployment.
    /// Acknowledged and dropped.
    Ignored,
}

/// The job lifecycle orchestrator.
///
/// Holds the job store and the two external capabilities behind trait
/// objects; all instances are stateless between invocations.
#[derive(Clone)]
pub struct JobLifecycleService {
    store: Arc<dyn JobStore>,
    storage: Arc<dyn UploadStorage>,
    engine: Arc<dyn TranscodeEngine>,
    settings: LifecycleSettings,
}

impl JobLifecycleService {
    pub fn new(
        store: Arc<dyn JobStore>,
        storage: Arc<dyn UploadStorage>,
        engine: Arc<dyn TranscodeEngine>,
        settings: LifecycleSettings,
    ) -> Self {
        Self {
            store,
            storage,
            engine,
            settings,
        }
    }

    /// Create a job and issue its upload target.
    ///
    /// The upload URL is obtained before the record is persisted: a storage
    /// failure leaves nothing behind, and an insert failure leaves only an
    /// unused presigned URL that expires on its own.
    #[tracing::instrument(skip(self, request), fields(file_name = %request.file_name))]
    pub async fn create_job(
        &self,
        request: &UploadRequest,
    ) -> Result<UploadRequestResponse, AppError> {
        request.validate()?;

        let job_id = Uuid::new_v4();
        let storage_key = keys::generate_input_key(job_id, &request.file_name);

        let upload_url = self
            .storage
            .presigned_put_url(&storage_key, self.settings.presigned_url_expiry)
            .await
            .map_err(|e| AppError::Storage(e.to_string()))?;

        let job = Job::new(job_id, request.file_name.clone());
        self.store.insert(&job).await?;

        tracing::info!(job_id = %job_id, "Upload request created");

        Ok(UploadRequestResponse { job_id, upload_url })
    }

    /// Absorb an "object stored" notification.
    ///
    /// Duplicate deliveries for a job that already left `WAITING_FOR_UPLOAD`
    /// are no-ops and never reach the engine. A conflict on the conditional
    /// update means a concurrent delivery won the race; the engine handle
    /// obtained here is discarded rather than overwriting the recorded one.
    #[tracing::instrument(skip(self))]
    pub async fn on_object_stored(&self, storage_key: &str) -> Result<EventOutcome, AppError> {
        let job_id = keys::parse_job_id_from_key(storage_key).ok_or_else(|| {
            AppError::InvalidInput(format!("Malformed storage key: {}", storage_key))
        })?;

        let Some(job) = self.store.get(job_id).await? else {
            tracing::warn!(
                job_id = %job_id,
                key = %storage_key,
                "Object stored for unknown job, dropping notification"
            );
            return Ok(EventOutcome::Ignored);
        };

        if job.status != JobStatus::WaitingForUpload {
            tracing::debug!(
                job_id = %job_id,
                status = %job.status,
                "Duplicate object-stored notification, already processed"
            );
            return Ok(EventOutcome::Duplicate);
        }

        let engine_job_id = self
            .engine
            .submit(storage_key)
            .await
            .map_err(|e| AppError::Transcode(e.to_string()))?;

        let transition = JobTransition::Queued {
            input_ref: storage_key.to_string(),
            engine_job_id: engine_job_id.clone(),
        };

        match self
            .store
            .conditional_update(job_id, transition.expected_status(), &transition)
            .await?
        {
            UpdateOutcome::Updated(job) => {
                tracing::info!(
                    job_id = %job_id,
                    engine_job_id = %engine_job_id,
                    "Job queued for transcode"
                );
                Ok(EventOutcome::Applied(Box::new(job)))
            }
            UpdateOutcome::Conflict(current) => {
                tracing::warn!(
                    job_id = %job_id,
                    status = %current.status,
                    discarded_engine_job_id = %engine_job_id,
                    "Concurrent delivery already queued this job, discarding engine handle"
                );
                Ok(EventOutcome::Duplicate)
            }
            UpdateOutcome::NotFound => {
                tracing::warn!(job_id = %job_id, "Job disappeared during queue transition");
                Ok(EventOutcome::Ignored)
            }
        }
    }

    /// Absorb a transcode completion/failure notification.
    ///
    /// The engine may notify faster than our own queue transition commits,
    /// so a missing handle is retried a bounded number of times before being
    /// surfaced as `NotFound`; the delivery system's redelivery then
    /// completes the transition once the handle is visible. Terminal jobs
    /// absorb any number of duplicate notifications without change.
    #[tracing::instrument(skip(self, outcome))]
    pub async fn on_transcode_notification(
        &self,
        engine_job_id: &str,
        outcome: TranscodeOutcome,
    ) -> Result<EventOutcome, AppError> {
        let mut attempt = 0;
        let job = loop {
            match self.store.get_by_engine_job_id(engine_job_id).await? {
                Some(job) => break job,
                None if attempt < self.settings.early_notification_retries => {
                    attempt += 1;
                    tracing::debug!(
                        engine_job_id = %engine_job_id,
                        attempt,
                        "No job for engine handle yet, retrying lookup"
                    );
                    tokio::time::sleep(self.settings.early_notification_backoff).await;
                }
                None => {
                    tracing::warn!(
                        engine_job_id = %engine_job_id,
                        "No job matches engine handle after retries"
                    );
                    return Err(AppError::NotFound(format!(
                        "No job for engine handle {}",
                        engine_job_id
                    )));
                }
            }
        };

        if job.status.is_terminal() {
            tracing::debug!(
                job_id = %job.job_id,
                status = %job.status,
                "Duplicate transcode notification for terminal job"
            );
            return Ok(EventOutcome::Duplicate);
        }

        let transition = match outcome {
            TranscodeOutcome::Success { output_refs } => JobTransition::Succeeded { output_refs },
            TranscodeOutcome::Failure {
                error_code,
                error_message,
            } => JobTransition::Failed {
                error_message: TranscodeOutcome::formatted_error(error_code, &error_message),
            },
        };

        match self
            .store
            .conditional_update(job.job_id, transition.expected_status(), &transition)
            .await?
        {
            UpdateOutcome::Updated(job) => {
                tracing::info!(
                    job_id = %job.job_id,
                    status = %job.status,
                    "Job reached terminal state"
                );
                Ok(EventOutcome::Applied(Box::new(job)))
            }
            UpdateOutcome::Conflict(current) => {
                tracing::debug!(
                    job_id = %current.job_id,
                    status = %current.status,
                    "Another notification already finalized this job"
                );
                Ok(EventOutcome::Duplicate)
            }
            UpdateOutcome::NotFound => {
                tracing::warn!(job_id = %job.job_id, "Job disappeared during terminal transition");
                Ok(EventOutcome::Ignored)
            }
        }
    }

    /// Fetch a single job.
    pub async fn get_job(&self, job_id: Uuid) -> Result<Option<Job>, AppError> {
        self.store.get(job_id).await
    }

    /// List jobs with pagination.
    pub async fn list_jobs(&self, query: JobListQuery) -> Result<JobListResponse, AppError> {
        let limit = query.limit.unwrap_or(50);
        let offset = query.offset.unwrap_or(0);

        let (jobs, total) = self.store.list(query).await?;

        Ok(JobListResponse {
            jobs,
            pagination: PaginationInfo::new(total, limit, offset),
        })
    }
}
