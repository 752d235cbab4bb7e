//! Integration tests for the exposition server
//!
//! These tests verify that:
//! - Health reflects the last cycle and switches between 200 and 503
//! - Readiness is independent of health
//! - Scrapes only read the registry

use std::{net::SocketAddr, sync::Arc};

use axum::http::StatusCode;
use eero_exporter::{
    api::{ApiConfig, ApiState, spawn_api_server},
    collector::CycleError,
    health::HealthState,
    metrics::ExporterMetrics,
};
use serde_json::Value;

use crate::helpers::*;

async fn spawn_test_api(metrics: Arc<ExporterMetrics>, health: Arc<HealthState>) -> SocketAddr {
    let config = ApiConfig {
        bind_addr: "127.0.0.1:0".parse().unwrap(), // Random port
    };

    spawn_api_server(config, ApiState::new(metrics, health))
        .await
        .unwrap()
}

#[tokio::test]
async fn test_health_follows_cycle_outcomes() {
    let metrics = Arc::new(ExporterMetrics::new().unwrap());
    let health = Arc::new(HealthState::new());
    let addr = spawn_test_api(metrics, health.clone()).await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("http://{addr}/health"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    health
        .record(&Err(CycleError::Auth("session rejected".into())))
        .await;
    let response = client
        .get(format!("http://{addr}/healthz"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let json: Value = response.json().await.unwrap();
    assert_eq!(json["status"], "unhealthy");
    assert_eq!(json["session_valid"], false);
    assert_eq!(json["last_collection_success"], false);
    assert_eq!(json["collections_total"], 1);
    assert_eq!(json["collections_failed"], 1);
    assert_eq!(json["last_error"], "session invalid: session rejected");

    // readiness does not depend on the session
    let response = client
        .get(format!("http://{addr}/ready"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json: Value = response.json().await.unwrap();
    assert_eq!(json["status"], "ready");
}

#[tokio::test]
async fn test_scrapes_do_not_touch_upstream() {
    let upstream = FixtureUpstream::new();
    home_account(&upstream);
    let metrics = Arc::new(ExporterMetrics::new().unwrap());
    let health = Arc::new(HealthState::new());
    let collector = collector_for(upstream.clone(), metrics.clone());

    let outcome = collector.collect().await;
    health.record(&outcome).await;
    let calls = upstream.calls();

    let addr = spawn_test_api(metrics, health).await;
    let client = reqwest::Client::new();

    for _ in 0..5 {
        let response = client
            .get(format!("http://{addr}/metrics"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.text().await.unwrap();
        assert!(body.contains("eero_device_signal_dbm{"));
        assert!(body.contains(r#"band="6GHz""#));
    }

    assert_eq!(upstream.calls(), calls);

    let response = client
        .get(format!("http://{addr}/health"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_unknown_path_is_not_found() {
    let metrics = Arc::new(ExporterMetrics::new().unwrap());
    let addr = spawn_test_api(metrics, Arc::new(HealthState::new())).await;

    let response = reqwest::get(format!("http://{addr}/api/v1/servers"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
