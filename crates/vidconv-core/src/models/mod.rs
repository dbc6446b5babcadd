pub mod events;
pub mod job;

pub use events::{ObjectStoredEvent, TranscodeEvent, TranscodeOutcome};
pub use job::{
    Job, JobListQuery, JobListResponse, JobResponse, JobStatus, JobSummary, JobTransition,
    PaginationInfo, UploadRequest, UploadRequestResponse,
};
