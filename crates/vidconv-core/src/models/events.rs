//! Inbound notification payloads.
//!
//! Both event sources deliver EventBridge-shaped envelopes, at least once,
//! with no ordering guarantee. The models here only bind the fields the
//! orchestrator reads; everything else in the envelope is ignored.

use serde::Deserialize;
use utoipa::ToSchema;

use crate::error::AppError;

/// "Object stored" notification emitted by object storage.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ObjectStoredEvent {
    #[serde(default)]
    pub source: String,
    #[serde(rename = "detail-type", default)]
    pub detail_type: String,
    pub detail: ObjectStoredDetail,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ObjectStoredDetail {
    pub object: ObjectRef,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ObjectRef {
    /// Storage key of the created object.
    pub key: String,
}

impl ObjectStoredEvent {
    /// Whether this envelope is an S3 "Object Created" notification.
    pub fn is_object_created(&self) -> bool {
        self.source == "aws.s3" && self.detail_type == "Object Created"
    }
}

/// Transcode engine completion/failure notification.
#[derive(Debug, Deserialize, ToSchema)]
pub struct TranscodeEvent {
    pub detail: TranscodeEventDetail,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TranscodeEventDetail {
    pub job_id: String,
    pub status: String,
    #[serde(default)]
    pub output_group_details: Vec<OutputGroupDetail>,
    #[serde(default)]
    pub error_code: Option<i64>,
    #[serde(default)]
    pub error_message: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OutputGroupDetail {
    #[serde(default)]
    pub output_details: Vec<OutputDetail>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OutputDetail {
    #[serde(default)]
    pub output_file_paths: Vec<String>,
}

/// Outcome extracted from a transcode notification, as consumed by the
/// lifecycle orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscodeOutcome {
    Success { output_refs: Vec<String> },
    Failure { error_code: i64, error_message: String },
}

impl TranscodeOutcome {
    /// The error string persisted on the job for a failure outcome.
    pub fn formatted_error(error_code: i64, error_message: &str) -> String {
        format!("{}: {}", error_code, error_message)
    }
}

impl TranscodeEventDetail {
    /// Map the engine's status string to an outcome. Statuses other than
    /// COMPLETE/ERROR (progress updates and the like) are rejected so the
    /// facade can refuse them without touching the store.
    pub fn outcome(&self) -> Result<TranscodeOutcome, AppError> {
        match self.status.as_str() {
            "COMPLETE" => {
                let output_refs = self
                    .output_group_details
                    .iter()
                    .flat_map(|group| group.output_details.iter())
                    .flat_map(|detail| detail.output_file_paths.iter().cloned())
                    .collect();
                Ok(TranscodeOutcome::Success { output_refs })
            }
            "ERROR" => Ok(TranscodeOutcome::Failure {
                error_code: self.error_code.unwrap_or(0),
                error_message: self.error_message.clone().unwrap_or_default(),
            }),
            other => Err(AppError::BadRequest(format!(
                "Unexpected transcode event status: {}",
                other
            ))),
        }
    }
}
