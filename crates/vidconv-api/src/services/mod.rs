pub mod lifecycle;

pub use lifecycle::{EventOutcome, JobLifecycleService, LifecycleSettings};
