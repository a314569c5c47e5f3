use std::sync::Arc;

use crate::activity::ActivityStore;
use crate::flows::JobFlows;

/// Shared application state injected into all route handlers via Axum extractors.
/// Every process-wide handle is built once in `main` and lives here.
#[derive(Clone)]
pub struct AppState {
    pub flows: Arc<JobFlows>,
    pub activity: Arc<dyn ActivityStore>,
}
