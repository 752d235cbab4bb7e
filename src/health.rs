//! Process-wide health state
//!
//! Written by the scheduler after every cycle, read by the `/health`
//! handler. The lock is only ever held for a copy or a field update.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;

use crate::collector::{CycleError, CycleOutcome};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HealthSnapshot {
    /// The last cycle that reached the API was not rejected
    pub session_valid: bool,

    /// The last cycle finished without aborting
    pub last_success: bool,

    pub cycles_total: u64,
    pub cycles_failed: u64,

    pub last_error: Option<String>,

    /// When the last cycle finished
    pub last_collection: Option<DateTime<Utc>>,
}

impl HealthSnapshot {
    pub fn is_healthy(&self) -> bool {
        self.session_valid && self.last_success
    }

    fn apply(&mut self, outcome: &CycleOutcome, at: DateTime<Utc>) {
        self.cycles_total += 1;
        self.last_collection = Some(at);

        match outcome {
            Ok(_) => {
                self.session_valid = true;
                self.last_success = true;
                self.last_error = None;
            }
            Err(err) => {
                if matches!(err, CycleError::Auth(_)) {
                    self.session_valid = false;
                }
                self.last_success = false;
                self.cycles_failed += 1;
                self.last_error = Some(err.to_string());
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct HealthState {
    inner: RwLock<HealthSnapshot>,
}

impl HealthState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one cycle outcome into the state
    pub async fn record(&self, outcome: &CycleOutcome) {
        self.inner.write().await.apply(outcome, Utc::now());
    }

    pub async fn snapshot(&self) -> HealthSnapshot {
        self.inner.read().await.clone()
    }
}
