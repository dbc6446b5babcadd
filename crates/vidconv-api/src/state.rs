//! Application state.
//!
//! The state is deliberately small: the orchestrator (which owns the store
//! and capability handles behind trait objects), the immutable configuration,
//! and the process start time for the health endpoint.

use std::sync::Arc;
use std::time::Instant;

use crate::services::lifecycle::JobLifecycleService;
use vidconv_core::Config;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub lifecycle: JobLifecycleService,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(config: Config, lifecycle: JobLifecycleService) -> Self {
        Self {
            config,
            lifecycle,
            started_at: Instant::now(),
        }
    }
}

impl axum::extract::FromRef<Arc<AppState>> for JobLifecycleService {
    fn from_ref(state: &Arc<AppState>) -> Self {
        state.lifecycle.clone()
    }
}

fn _assert_app_state_send_sync() {
    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}
    assert_send::<AppState>();
    assert_sync::<AppState>();
}
