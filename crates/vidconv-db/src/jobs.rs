use async_trait::async_trait;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use vidconv_core::models::{Job, JobListQuery, JobStatus, JobSummary, JobTransition};
use vidconv_core::AppError;

use crate::store::{JobStore, UpdateOutcome};

const JOB_COLUMNS: &str = r#"
    job_id,
    status,
    file_name,
    input_ref,
    engine_job_id,
    output_ref,
    error_message,
    created_at,
    updated_at
"#;

/// Clamp a client-supplied limit into the accepted `[1, 1000]` window,
/// defaulting to 50.
fn effective_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(50).clamp(1, 1000)
}

fn effective_offset(offset: Option<i64>) -> i64 {
    offset.unwrap_or(0).max(0)
}

/// Postgres-backed job store.
#[derive(Clone)]
pub struct JobRepository {
    pool: PgPool,
}

impl JobRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobStore for JobRepository {
    #[tracing::instrument(skip(self, job), fields(job_id = %job.job_id))]
    async fn insert(&self, job: &Job) -> Result<Job, AppError> {
        let inserted: Job = sqlx::query_as::<Postgres, Job>(&format!(
            r#"
            INSERT INTO jobs (job_id, status, file_name)
            VALUES ($1, $2, $3)
            RETURNING {JOB_COLUMNS}
            "#,
        ))
        .bind(job.job_id)
        .bind(job.status.to_string())
        .bind(&job.file_name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if e.as_database_error()
                .map(|d| d.is_unique_violation())
                .unwrap_or(false)
            {
                AppError::Conflict(format!("Job already exists: {}", job.job_id))
            } else {
                AppError::Database(e)
            }
        })?;

        tracing::info!(job_id = %inserted.job_id, "Job registered");

        Ok(inserted)
    }

    #[tracing::instrument(skip(self))]
    async fn get(&self, job_id: Uuid) -> Result<Option<Job>, AppError> {
        let job = sqlx::query_as::<Postgres, Job>(&format!(
            r#"
            SELECT {JOB_COLUMNS}
            FROM jobs
            WHERE job_id = $1
            "#,
        ))
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(job)
    }

    #[tracing::instrument(skip(self))]
    async fn get_by_engine_job_id(&self, engine_job_id: &str) -> Result<Option<Job>, AppError> {
        let job = sqlx::query_as::<Postgres, Job>(&format!(
            r#"
            SELECT {JOB_COLUMNS}
            FROM jobs
            WHERE engine_job_id = $1
            "#,
        ))
        .bind(engine_job_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(job)
    }

    #[tracing::instrument(skip(self, transition), fields(target = %transition.target_status()))]
    async fn conditional_update(
        &self,
        job_id: Uuid,
        expected: JobStatus,
        transition: &JobTransition,
    ) -> Result<UpdateOutcome, AppError> {
        // One statement per transition variant keeps the touched column set
        // closed and the compare-on-status atomic.
        let updated: Option<Job> = match transition {
            JobTransition::Queued {
                input_ref,
                engine_job_id,
            } => {
                sqlx::query_as::<Postgres, Job>(&format!(
                    r#"
                    UPDATE jobs
                    SET status = $3, input_ref = $4, engine_job_id = $5, updated_at = NOW()
                    WHERE job_id = $1 AND status = $2
                    RETURNING {JOB_COLUMNS}
                    "#,
                ))
                .bind(job_id)
                .bind(expected.to_string())
                .bind(transition.target_status().to_string())
                .bind(input_ref)
                .bind(engine_job_id)
                .fetch_optional(&self.pool)
                .await?
            }
            JobTransition::Succeeded { output_refs } => {
                sqlx::query_as::<Postgres, Job>(&format!(
                    r#"
                    UPDATE jobs
                    SET status = $3, output_ref = $4, updated_at = NOW()
                    WHERE job_id = $1 AND status = $2
                    RETURNING {JOB_COLUMNS}
                    "#,
                ))
                .bind(job_id)
                .bind(expected.to_string())
                .bind(transition.target_status().to_string())
                .bind(output_refs)
                .fetch_optional(&self.pool)
                .await?
            }
            JobTransition::Failed { error_message } => {
                sqlx::query_as::<Postgres, Job>(&format!(
                    r#"
                    UPDATE jobs
                    SET status = $3, error_message = $4, updated_at = NOW()
                    WHERE job_id = $1 AND status = $2
                    RETURNING {JOB_COLUMNS}
                    "#,
                ))
                .bind(job_id)
                .bind(expected.to_string())
                .bind(transition.target_status().to_string())
                .bind(error_message)
                .fetch_optional(&self.pool)
                .await?
            }
        };

        if let Some(job) = updated {
            return Ok(UpdateOutcome::Updated(job));
        }

        // No row matched: either the record is gone or another writer
        // advanced the status first. Re-read to tell the two apart.
        match self.get(job_id).await? {
            Some(current) => {
                tracing::debug!(
                    job_id = %job_id,
                    expected = %expected,
                    current = %current.status,
                    "Conditional update lost the race"
                );
                Ok(UpdateOutcome::Conflict(current))
            }
            None => Ok(UpdateOutcome::NotFound),
        }
    }

    #[tracing::instrument(skip(self))]
    async fn list(&self, query: JobListQuery) -> Result<(Vec<JobSummary>, i64), AppError> {
        let limit = effective_limit(query.limit);
        let offset = effective_offset(query.offset);

        let (rows, total) = match query.status {
            Some(status) => {
                let rows = sqlx::query_as::<Postgres, JobSummary>(
                    r#"
                    SELECT job_id, status, updated_at
                    FROM jobs
                    WHERE status = $1
                    ORDER BY updated_at DESC, job_id DESC
                    LIMIT $2 OFFSET $3
                    "#,
                )
                .bind(status.to_string())
                .bind(limit)
                .bind(offset)
                .fetch_all(&self.pool)
                .await?;

                let total: i64 =
                    sqlx::query_scalar("SELECT COUNT(*) FROM jobs WHERE status = $1")
                        .bind(status.to_string())
                        .fetch_one(&self.pool)
                        .await?;

                (rows, total)
            }
            None => {
                let rows = sqlx::query_as::<Postgres, JobSummary>(
                    r#"
                    SELECT job_id, status, updated_at
                    FROM jobs
                    ORDER BY updated_at DESC, job_id DESC
                    LIMIT $1 OFFSET $2
                    "#,
                )
                .bind(limit)
                .bind(offset)
                .fetch_all(&self.pool)
                .await?;

                let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM jobs")
                    .fetch_one(&self.pool)
                    .await?;

                (rows, total)
            }
        };

        Ok((rows, total))
    }
}
