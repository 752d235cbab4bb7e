//! Scheduler behaviour over a scripted upstream

use std::{sync::Arc, time::Duration};

use assert_matches::assert_matches;
use eero_exporter::{
    actors::scheduler::SchedulerHandle, collector::CycleError, health::HealthState,
    metrics::ExporterMetrics, upstream::FetchError,
};

use crate::helpers::*;

async fn wait_for_cycles(health: &HealthState, cycles: u64) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while health.snapshot().await.cycles_total < cycles {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("scheduler did not run in time");
}

#[tokio::test]
async fn test_interval_drives_cycles() {
    let upstream = FixtureUpstream::new();
    home_account(&upstream);
    let metrics = Arc::new(ExporterMetrics::new().unwrap());
    let health = Arc::new(HealthState::new());
    let collector = collector_for(upstream.clone(), metrics.clone());

    let (scheduler, task) = SchedulerHandle::spawn(
        collector,
        health.clone(),
        metrics.clone(),
        Duration::from_millis(50),
    );

    wait_for_cycles(&health, 3).await;
    scheduler.shutdown().await.unwrap();
    task.await.unwrap();

    let snapshot = health.snapshot().await;
    assert!(snapshot.is_healthy());
    assert_eq!(
        metrics.exporter.collections_total.get(),
        snapshot.cycles_total
    );
    assert_eq!(metrics.exporter.scrape_success.get(), 1.0);
    assert!(metrics.exporter.last_collection_timestamp.get() > 0.0);
}

#[tokio::test]
async fn test_session_loss_and_recovery() {
    let upstream = FixtureUpstream::new();
    home_account(&upstream);
    let metrics = Arc::new(ExporterMetrics::new().unwrap());
    let health = Arc::new(HealthState::new());
    let collector = collector_for(upstream.clone(), metrics.clone());

    let (scheduler, task) = SchedulerHandle::spawn(
        collector,
        health.clone(),
        metrics.clone(),
        Duration::from_secs(3600),
    );

    // the immediate tick, so no scheduled cycle interleaves below
    wait_for_cycles(&health, 1).await;
    assert_matches!(scheduler.collect_now().await.unwrap(), Ok(_));

    upstream.fail("account", FetchError::Auth("HTTP 401".into()));
    assert_matches!(
        scheduler.collect_now().await.unwrap(),
        Err(CycleError::Auth(_))
    );

    let snapshot = health.snapshot().await;
    assert!(!snapshot.session_valid);
    assert!(!snapshot.last_success);
    assert_eq!(metrics.exporter.scrape_success.get(), 0.0);
    assert_eq!(
        metrics
            .exporter
            .scrape_errors_total
            .with_label_values(&["auth"])
            .get(),
        1
    );

    // series from the good cycle are still there
    assert_eq!(
        metrics
            .network
            .eeros
            .with_label_values(&["n1"])
            .get(),
        1.0
    );

    home_account(&upstream);
    assert_matches!(scheduler.collect_now().await.unwrap(), Ok(_));
    assert!(health.snapshot().await.is_healthy());

    scheduler.shutdown().await.unwrap();
    task.await.unwrap();
}

#[tokio::test]
async fn test_no_cycle_after_shutdown() {
    let upstream = FixtureUpstream::new();
    home_account(&upstream);
    let metrics = Arc::new(ExporterMetrics::new().unwrap());
    let health = Arc::new(HealthState::new());
    let collector = collector_for(upstream.clone(), metrics.clone());

    let (scheduler, task) = SchedulerHandle::spawn(
        collector,
        health.clone(),
        metrics,
        Duration::from_millis(20),
    );

    wait_for_cycles(&health, 1).await;
    scheduler.shutdown().await.unwrap();
    task.await.unwrap();

    let calls = upstream.calls();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(upstream.calls(), calls);
}
