//! SchedulerActor - Drives collection cycles
//!
//! ## Message Flow
//!
//! ```text
//! Timer tick ─┐
//!             ├→ Collector::collect → self-metrics → HealthState::record
//! CollectNow ─┘
//! ```
//!
//! The actor awaits each cycle inline, so cycles never overlap. Commands are
//! polled before the ticker: a pending `Shutdown` wins over a due tick.

use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use chrono::Utc;
use tokio::{
    sync::{mpsc, oneshot},
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};
use tracing::{debug, error, info, instrument, warn};

use crate::{
    collector::{Collector, CycleOutcome},
    health::HealthState,
    metrics::{ExporterMetrics, bool_value},
};

use super::messages::SchedulerCommand;

/// Actor that runs the collector on a fixed interval
pub struct SchedulerActor {
    collector: Collector,

    health: Arc<HealthState>,

    metrics: Arc<ExporterMetrics>,

    /// Command receiver for control messages
    command_rx: mpsc::Receiver<SchedulerCommand>,

    interval: Duration,
}

impl SchedulerActor {
    pub fn new(
        collector: Collector,
        health: Arc<HealthState>,
        metrics: Arc<ExporterMetrics>,
        command_rx: mpsc::Receiver<SchedulerCommand>,
        interval: Duration,
    ) -> Self {
        Self {
            collector,
            health,
            metrics,
            command_rx,
            interval,
        }
    }

    /// Run the actor's main loop
    ///
    /// The first tick fires immediately. Runs until a Shutdown command is
    /// received or every handle has been dropped.
    #[instrument(skip(self), fields(interval = ?self.interval))]
    pub async fn run(mut self) {
        info!("starting scheduler");

        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;

                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(SchedulerCommand::CollectNow { respond_to }) => {
                            debug!("received CollectNow command");
                            let outcome = self.run_cycle().await;
                            let _ = respond_to.send(outcome);
                        }

                        Some(SchedulerCommand::Shutdown) => {
                            debug!("received shutdown command");
                            break;
                        }

                        None => {
                            warn!("command channel closed, shutting down");
                            break;
                        }
                    }
                }

                _ = ticker.tick() => {
                    self.run_cycle().await;
                }
            }
        }

        info!("scheduler stopped");
    }

    /// Run one cycle and record its outcome
    async fn run_cycle(&self) -> CycleOutcome {
        let started = Instant::now();
        let outcome = self.collector.collect().await;
        let elapsed = started.elapsed();

        let exporter = &self.metrics.exporter;
        exporter.scrape_duration_seconds.set(elapsed.as_secs_f64());
        exporter.scrape_success.set(bool_value(outcome.is_ok()));
        exporter
            .last_collection_timestamp
            .set(Utc::now().timestamp_millis() as f64 / 1000.0);
        exporter.collections_total.inc();

        match &outcome {
            Ok(report) => debug!(?elapsed, ?report, "cycle succeeded"),
            Err(err) => {
                error!(?elapsed, "cycle failed: {err}");
                exporter
                    .scrape_errors_total
                    .with_label_values(&[err.kind()])
                    .inc();
            }
        }

        self.health.record(&outcome).await;
        outcome
    }
}

/// Handle for controlling a SchedulerActor
///
/// Cheap to clone; every clone talks to the same actor.
#[derive(Clone)]
pub struct SchedulerHandle {
    sender: mpsc::Sender<SchedulerCommand>,
}

impl SchedulerHandle {
    /// Spawn the scheduler actor
    ///
    /// The returned join handle resolves once the actor has stopped.
    pub fn spawn(
        collector: Collector,
        health: Arc<HealthState>,
        metrics: Arc<ExporterMetrics>,
        interval: Duration,
    ) -> (Self, JoinHandle<()>) {
        let (cmd_tx, cmd_rx) = mpsc::channel(32);

        let actor = SchedulerActor::new(collector, health, metrics, cmd_rx, interval);
        let task = tokio::spawn(actor.run());

        (Self { sender: cmd_tx }, task)
    }

    /// Run a cycle now and wait for its outcome
    ///
    /// Queued behind a cycle that is already running.
    pub async fn collect_now(&self) -> Result<CycleOutcome> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(SchedulerCommand::CollectNow { respond_to: tx })
            .await
            .context("failed to send CollectNow command")?;

        rx.await.context("failed to receive response")
    }

    /// Stop the scheduler once the current cycle is done
    pub async fn shutdown(&self) -> Result<()> {
        self.sender
            .send(SchedulerCommand::Shutdown)
            .await
            .context("failed to send Shutdown command")?;
        Ok(())
    }
}
