use async_trait::async_trait;
use uuid::Uuid;

use vidconv_core::models::{Job, JobListQuery, JobStatus, JobSummary, JobTransition};
use vidconv_core::AppError;

/// Result of a conditional update.
#[derive(Debug)]
pub enum UpdateOutcome {
    /// The expected status matched; the returned record reflects the applied
    /// transition.
    Updated(Job),
    /// Another writer advanced the job first. Carries the current record so
    /// callers can decide whether the conflict is a benign duplicate.
    Conflict(Job),
    /// No record with that id exists.
    NotFound,
}

/// Durable job record storage.
///
/// Implementations must make `conditional_update` atomic: the transition
/// applies only if the stored status still equals `expected` at the moment
/// of the write. This is the sole write primitive after insert; there is no
/// unconditional update.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Persist a fresh record. Fails with `AppError::Conflict` if the job id
    /// already exists.
    async fn insert(&self, job: &Job) -> Result<Job, AppError>;

    /// Fetch a record by job id.
    async fn get(&self, job_id: Uuid) -> Result<Option<Job>, AppError>;

    /// Fetch a record by the engine's job handle (secondary index).
    async fn get_by_engine_job_id(&self, engine_job_id: &str) -> Result<Option<Job>, AppError>;

    /// Atomically apply `transition` if the stored status equals `expected`.
    /// `updated_at` is refreshed by the store on success.
    async fn conditional_update(
        &self,
        job_id: Uuid,
        expected: JobStatus,
        transition: &JobTransition,
    ) -> Result<UpdateOutcome, AppError>;

    /// List records ordered by `updated_at` descending (`job_id` descending
    /// as tie-break), plus the total count for pagination.
    async fn list(&self, query: JobListQuery) -> Result<(Vec<JobSummary>, i64), AppError>;
}
