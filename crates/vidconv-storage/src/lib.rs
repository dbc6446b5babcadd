//! Upload storage abstraction and the S3 backend.
//!
//! Storage keys for uploads follow `input/{job_id}/{unix_millis}-{filename}`
//! so that "object stored" notifications can be correlated back to a job
//! from the key alone. See [keys].

pub mod keys;
mod s3;
mod traits;

pub use s3::S3Storage;
pub use traits::{StorageError, StorageResult, UploadStorage};
