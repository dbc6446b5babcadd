//! Job Store: the durable record store consumed by the lifecycle
//! orchestrator.
//!
//! The [JobStore] trait is the collaborator contract; [JobRepository] is its
//! Postgres implementation. All writes after insert go through
//! [JobStore::conditional_update], which is the only synchronization point
//! between concurrent event handlers.

mod jobs;
mod store;

pub use jobs::JobRepository;
pub use store::{JobStore, UpdateOutcome};
