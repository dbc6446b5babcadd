use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Lifecycle state of a job. Transitions only move forward:
/// `WAITING_FOR_UPLOAD → QUEUED → {SUCCEEDED | FAILED}`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "text"))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    WaitingForUpload,
    Queued,
    Succeeded,
    Failed,
}

impl JobStatus {
    /// Terminal states accept no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Succeeded | JobStatus::Failed)
    }
}

impl Display for JobStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            JobStatus::WaitingForUpload => write!(f, "WAITING_FOR_UPLOAD"),
            JobStatus::Queued => write!(f, "QUEUED"),
            JobStatus::Succeeded => write!(f, "SUCCEEDED"),
            JobStatus::Failed => write!(f, "FAILED"),
        }
    }
}

impl FromStr for JobStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "WAITING_FOR_UPLOAD" => Ok(JobStatus::WaitingForUpload),
            "QUEUED" => Ok(JobStatus::Queued),
            "SUCCEEDED" => Ok(JobStatus::Succeeded),
            "FAILED" => Ok(JobStatus::Failed),
            _ => Err(anyhow::anyhow!("Invalid job status: {}", s)),
        }
    }
}

/// One upload-to-transcode workflow instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub job_id: Uuid,
    pub status: JobStatus,
    /// Original client-supplied file name.
    pub file_name: String,
    /// Storage key of the uploaded object, set when the upload is observed.
    pub input_ref: Option<String>,
    /// Opaque handle returned by the transcode engine. Set at most once.
    pub engine_job_id: Option<String>,
    /// Output locators produced on success.
    pub output_ref: Option<Vec<String>>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// Build a fresh record in the initial state. Timestamps are provisional;
    /// the store is authoritative for persisted values.
    pub fn new(job_id: Uuid, file_name: String) -> Self {
        let now = Utc::now();
        Job {
            job_id,
            status: JobStatus::WaitingForUpload,
            file_name,
            input_ref: None,
            engine_job_id: None,
            output_ref: None,
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(feature = "sqlx")]
impl sqlx::FromRow<'_, sqlx::postgres::PgRow> for Job {
    fn from_row(row: &sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        use sqlx::Row;
        Ok(Job {
            job_id: row.get("job_id"),
            status: row
                .get::<String, _>("status")
                .parse()
                .map_err(|e| sqlx::Error::Decode(format!("Failed to parse status: {}", e).into()))?,
            file_name: row.get("file_name"),
            input_ref: row.get("input_ref"),
            engine_job_id: row.get("engine_job_id"),
            output_ref: row.get::<Option<Vec<String>>, _>("output_ref"),
            error_message: row.get("error_message"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }
}

/// The closed set of state-changing mutations a job record accepts after
/// creation. Every store write after insert carries exactly one of these;
/// there is no generic partial-update path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobTransition {
    /// Upload observed and transcode job submitted.
    Queued {
        input_ref: String,
        engine_job_id: String,
    },
    /// Engine reported success.
    Succeeded { output_refs: Vec<String> },
    /// Engine reported failure.
    Failed { error_message: String },
}

impl JobTransition {
    /// Status this transition moves the job into.
    pub fn target_status(&self) -> JobStatus {
        match self {
            JobTransition::Queued { .. } => JobStatus::Queued,
            JobTransition::Succeeded { .. } => JobStatus::Succeeded,
            JobTransition::Failed { .. } => JobStatus::Failed,
        }
    }

    /// Status the job must hold for this transition to apply.
    pub fn expected_status(&self) -> JobStatus {
        match self {
            JobTransition::Queued { .. } => JobStatus::WaitingForUpload,
            JobTransition::Succeeded { .. } | JobTransition::Failed { .. } => JobStatus::Queued,
        }
    }
}

/// Request body for POST /upload-request
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct UploadRequest {
    /// Original filename
    #[validate(length(
        min = 1,
        max = 255,
        message = "File name must be between 1 and 255 characters"
    ))]
    pub file_name: String,
}

/// Response containing the new job and its presigned upload target
#[derive(Debug, Serialize, ToSchema)]
pub struct UploadRequestResponse {
    pub job_id: Uuid,
    pub upload_url: String,
}

/// Full job view returned by GET /jobs/{job_id}
#[derive(Debug, Serialize, ToSchema)]
pub struct JobResponse {
    pub job_id: Uuid,
    pub status: JobStatus,
    pub file_name: String,
    pub input_ref: Option<String>,
    pub output_ref: Option<Vec<String>>,
    pub engine_job_id: Option<String>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Job> for JobResponse {
    fn from(job: Job) -> Self {
        Self {
            job_id: job.job_id,
            status: job.status,
            file_name: job.file_name,
            input_ref: job.input_ref,
            output_ref: job.output_ref,
            engine_job_id: job.engine_job_id,
            error_message: job.error_message,
            created_at: job.created_at,
            updated_at: job.updated_at,
        }
    }
}

/// Compact row returned by GET /jobs
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct JobSummary {
    pub job_id: Uuid,
    pub status: JobStatus,
    pub updated_at: DateTime<Utc>,
}

impl From<&Job> for JobSummary {
    fn from(job: &Job) -> Self {
        Self {
            job_id: job.job_id,
            status: job.status,
            updated_at: job.updated_at,
        }
    }
}

#[cfg(feature = "sqlx")]
impl sqlx::FromRow<'_, sqlx::postgres::PgRow> for JobSummary {
    fn from_row(row: &sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        use sqlx::Row;
        Ok(JobSummary {
            job_id: row.get("job_id"),
            status: row
                .get::<String, _>("status")
                .parse()
                .map_err(|e| sqlx::Error::Decode(format!("Failed to parse status: {}", e).into()))?,
            updated_at: row.get("updated_at"),
        })
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct JobListQuery {
    pub status: Option<JobStatus>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl Default for JobListQuery {
    fn default() -> Self {
        Self {
            status: None,
            limit: Some(50),
            offset: Some(0),
        }
    }
}

/// Pagination block returned alongside job listings.
#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
pub struct PaginationInfo {
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
    #[serde(rename = "hasMore")]
    pub has_more: bool,
    #[serde(rename = "totalPages")]
    pub total_pages: i64,
    #[serde(rename = "currentPage")]
    pub current_page: i64,
}

impl PaginationInfo {
    pub fn new(total: i64, limit: i64, offset: i64) -> Self {
        Self {
            total,
            limit,
            offset,
            has_more: offset + limit < total,
            total_pages: (total + limit - 1) / limit,
            current_page: offset / limit + 1,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct JobListResponse {
    pub jobs: Vec<JobSummary>,
    pub pagination: PaginationInfo,
}
