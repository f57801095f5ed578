// Application state for HTTP handlers
use crate::application::snapshot::TelemetrySnapshot;
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Clone)]
pub struct AppState {
    pub snapshots: watch::Receiver<Arc<TelemetrySnapshot>>,
    pub recent_default: usize,
}

impl AppState {
    pub fn snapshot(&self) -> Arc<TelemetrySnapshot> {
        self.snapshots.borrow().clone()
    }
}
