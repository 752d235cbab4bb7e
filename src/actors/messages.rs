//! Message types for the scheduler actor

use tokio::sync::oneshot;

use crate::collector::CycleOutcome;

/// Commands that can be sent to a SchedulerActor
#[derive(Debug)]
pub enum SchedulerCommand {
    /// Run a cycle now, outside the interval
    ///
    /// The cycle is recorded like a scheduled one. The interval is not reset.
    CollectNow {
        /// Channel to send the outcome back
        respond_to: oneshot::Sender<CycleOutcome>,
    },

    /// Stop after the current cycle
    ///
    /// No new cycle starts once this has been received.
    Shutdown,
}
