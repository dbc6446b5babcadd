//! Vidconv Core Library
//!
//! This crate provides the domain models, error types, and configuration
//! shared across all vidconv components.

pub mod config;
pub mod error;
pub mod models;

// Re-export commonly used types
pub use config::{BaseConfig, Config, ServiceConfig};
pub use error::{AppError, ErrorMetadata, LogLevel};
