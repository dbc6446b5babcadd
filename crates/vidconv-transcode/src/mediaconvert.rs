//! MediaConvert-compatible HTTP client.
//!
//! Speaks the MediaConvert CreateJob REST shape (`POST /2017-08-29/jobs`)
//! against a configurable endpoint, which covers both the real service and
//! local mock stacks. The output preset is fixed: 1280x720 H.264 QVBR with
//! stereo AAC in a progressive MP4, written back to the bucket root.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use crate::traits::{TranscodeEngine, TranscodeError, TranscodeResult};

#[derive(Clone)]
pub struct MediaConvertClient {
    endpoint: String,
    role_arn: String,
    bucket: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct CreateJobResponse {
    #[serde(rename = "Job")]
    job: CreatedJob,
}

#[derive(Debug, Deserialize)]
struct CreatedJob {
    #[serde(rename = "Id")]
    id: String,
}

impl MediaConvertClient {
    pub fn new(
        endpoint: String,
        role_arn: String,
        bucket: String,
        timeout: Duration,
    ) -> TranscodeResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TranscodeError::ConfigError(e.to_string()))?;

        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            role_arn,
            bucket,
            client,
        })
    }

    fn jobs_url(&self) -> String {
        format!("{}/2017-08-29/jobs", self.endpoint)
    }

    fn create_job_body(&self, input_ref: &str) -> serde_json::Value {
        json!({
            "Role": self.role_arn,
            "Settings": {
                "Inputs": [
                    {
                        "FileInput": format!("s3://{}/{}", self.bucket, input_ref),
                        "AudioSelectors": {
                            "Audio Selector 1": {
                                "Offset": 0,
                                "DefaultSelection": "DEFAULT",
                                "ProgramSelection": 1
                            }
                        },
                        "VideoSelector": {
                            "ColorSpace": "FOLLOW"
                        }
                    }
                ],
                "OutputGroups": [
                    {
                        "Name": "File Group",
                        "OutputGroupSettings": {
                            "Type": "FILE_GROUP_SETTINGS",
                            "FileGroupSettings": {
                                "Destination": format!("s3://{}/", self.bucket)
                            }
                        },
                        "Outputs": [
                            {
                                "VideoDescription": {
                                    "Width": 1280,
                                    "Height": 720,
                                    "CodecSettings": {
                                        "Codec": "H_264",
                                        "H264Settings": {
                                            "MaxBitrate": 5_000_000,
                                            "RateControlMode": "QVBR",
                                            "SceneChangeDetect": "TRANSITION_DETECTION"
                                        }
                                    }
                                },
                                "AudioDescriptions": [
                                    {
                                        "AudioTypeControl": "FOLLOW_INPUT",
                                        "CodecSettings": {
                                            "Codec": "AAC",
                                            "AacSettings": {
                                                "AudioDescriptionBroadcasterMix": "NORMAL",
                                                "Bitrate": 96_000,
                                                "RateControlMode": "CBR",
                                                "CodecProfile": "LC",
                                                "CodingMode": "CODING_MODE_2_0",
                                                "RawFormat": "NONE",
                                                "SampleRate": 48_000,
                                                "Specification": "MPEG4"
                                            }
                                        },
                                        "AudioSourceName": "Audio Selector 1"
                                    }
                                ],
                                "ContainerSettings": {
                                    "Container": "MP4",
                                    "Mp4Settings": {
                                        "CslgAtom": "INCLUDE",
                                        "FreeSpaceBox": "EXCLUDE",
                                        "MoovPlacement": "PROGRESSIVE_DOWNLOAD"
                                    }
                                }
                            }
                        ]
                    }
                ]
            }
        })
    }
}

#[async_trait]
impl TranscodeEngine for MediaConvertClient {
    async fn submit(&self, input_ref: &str) -> TranscodeResult<String> {
        let body = self.create_job_body(input_ref);

        let response = self
            .client
            .post(self.jobs_url())
            .json(&body)
            .send()
            .await
            .map_err(|e| TranscodeError::SubmitFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            tracing::error!(
                status = %status,
                input_ref = %input_ref,
                "Transcode job submission rejected"
            );
            return Err(TranscodeError::SubmitFailed(format!(
                "engine returned {}: {}",
                status, detail
            )));
        }

        let created: CreateJobResponse = response
            .json()
            .await
            .map_err(|e| TranscodeError::MalformedResponse(e.to_string()))?;

        tracing::info!(
            engine_job_id = %created.job.id,
            input_ref = %input_ref,
            "Transcode job submitted"
        );

        Ok(created.job.id)
    }
}
