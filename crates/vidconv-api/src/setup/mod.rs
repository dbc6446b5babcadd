//! Application setup and initialization
//!
//! This module contains all application initialization logic extracted from
//! main.rs for better organization and testability.

pub mod database;
pub mod routes;
pub mod server;

use crate::services::lifecycle::{JobLifecycleService, LifecycleSettings};
use crate::state::AppState;
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use vidconv_core::Config;
use vidconv_db::{JobRepository, JobStore};
use vidconv_storage::{S3Storage, UploadStorage};
use vidconv_transcode::{MediaConvertClient, TranscodeEngine};

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    // Validate configuration first - fail fast on misconfiguration
    config
        .validate()
        .context("Configuration validation failed")?;

    // Initialize telemetry first
    crate::telemetry::init_telemetry();

    tracing::info!("Configuration loaded and validated successfully");

    // Setup database
    let pool = database::setup_database(&config).await?;
    let store: Arc<dyn JobStore> = Arc::new(JobRepository::new(pool));

    // Setup the upload capability
    let storage: Arc<dyn UploadStorage> = Arc::new(
        S3Storage::new(
            config.s3_bucket().to_string(),
            config.aws_region().to_string(),
            config.aws_endpoint_url().map(String::from),
        )
        .await
        .map_err(|e| anyhow::anyhow!("Failed to initialize upload storage: {}", e))?,
    );

    // Setup the transcode capability
    let engine: Arc<dyn TranscodeEngine> = Arc::new(
        MediaConvertClient::new(
            config.mediaconvert_endpoint().to_string(),
            config.mediaconvert_role_arn().to_string(),
            config.s3_bucket().to_string(),
            Duration::from_secs(config.transcode_submit_timeout_secs()),
        )
        .map_err(|e| anyhow::anyhow!("Failed to initialize transcode client: {}", e))?,
    );

    let lifecycle = JobLifecycleService::new(
        store,
        storage,
        engine,
        LifecycleSettings {
            presigned_url_expiry: Duration::from_secs(config.presigned_url_expiry_secs()),
            early_notification_retries: config.early_notification_retries(),
            early_notification_backoff: Duration::from_millis(
                config.early_notification_backoff_ms(),
            ),
        },
    );

    let state = Arc::new(AppState::new(config.clone(), lifecycle));

    // Setup routes
    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}
