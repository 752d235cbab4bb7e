//! API shared state

use std::sync::Arc;

use crate::{health::HealthState, metrics::ExporterMetrics};

/// Shared state passed to all API handlers
///
/// Handlers only read from here; collection writes happen on the scheduler
/// task, so a scrape never triggers an upstream call.
#[derive(Clone)]
pub struct ApiState {
    /// Registry rendered on `/metrics`
    pub metrics: Arc<ExporterMetrics>,

    /// Outcome of the most recent cycles
    pub health: Arc<HealthState>,
}

impl ApiState {
    pub fn new(metrics: Arc<ExporterMetrics>, health: Arc<HealthState>) -> Self {
        Self { metrics, health }
    }
}
