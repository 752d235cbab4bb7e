//! Failure scenarios against a mock eero API
//!
//! These tests run the real HTTP transport and verify that:
//! - A rejected session aborts the cycle, whichever way it is reported
//! - Server errors, malformed bodies and timeouts stay inside their pass
//! - A missing session token never reaches the network

use std::{sync::Arc, time::Duration};

use assert_matches::assert_matches;
use eero_exporter::{
    collector::{Collector, CycleError},
    config::FeaturesConfig,
    metrics::ExporterMetrics,
    upstream::{Fetchers, HttpUpstream},
};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::helpers::envelope;

fn collector_against(
    server: &MockServer,
    token: Option<&str>,
    timeout: Duration,
) -> (Collector, Arc<ExporterMetrics>) {
    let upstream =
        HttpUpstream::new(server.uri(), token.map(str::to_string), timeout).unwrap();
    let metrics = Arc::new(ExporterMetrics::new().unwrap());
    let collector = Collector::new(
        Fetchers::new(Arc::new(upstream)),
        metrics.clone(),
        FeaturesConfig::default(),
        1,
    );
    (collector, metrics)
}

async fn mount_json(server: &MockServer, at: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn mount_account(server: &MockServer) {
    mount_json(
        server,
        "/account",
        envelope(json!({"networks": {"count": 1, "data": [{"url": "/2.2/networks/n1"}]}})),
    )
    .await;
}

#[tokio::test]
async fn test_http_401_aborts_cycle() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/account"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&mock_server)
        .await;

    let (collector, metrics) =
        collector_against(&mock_server, Some("stale"), Duration::from_secs(5));

    assert_matches!(collector.collect().await, Err(CycleError::Auth(_)));
    assert_eq!(
        metrics
            .exporter
            .api_requests_total
            .with_label_values(&["networks", "auth"])
            .get(),
        1
    );
}

#[tokio::test]
async fn test_meta_code_401_aborts_cycle() {
    let mock_server = MockServer::start().await;

    mount_json(
        &mock_server,
        "/account",
        json!({"meta": {"code": 401, "error": "error.session.refresh"}, "data": {}}),
    )
    .await;

    let (collector, _) = collector_against(&mock_server, Some("stale"), Duration::from_secs(5));

    assert_matches!(collector.collect().await, Err(CycleError::Auth(_)));
}

#[tokio::test]
async fn test_server_error_stays_in_pass() {
    let mock_server = MockServer::start().await;
    mount_account(&mock_server).await;

    Mock::given(method("GET"))
        .and(path("/networks/n1/eeros"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    mount_json(&mock_server, "/networks/n1", envelope(json!({"name": "Home"}))).await;
    mount_json(
        &mock_server,
        "/networks/n1/devices",
        envelope(json!([{"url": "/2.2/networks/n1/devices/d1", "connected": true}])),
    )
    .await;
    mount_json(&mock_server, "/networks/n1/profiles", envelope(json!([]))).await;

    let (collector, metrics) = collector_against(&mock_server, Some("tok"), Duration::from_secs(5));

    let report = collector.collect().await.unwrap();
    assert_eq!(report.pass_errors, 1);
    assert_eq!(
        metrics
            .network
            .devices
            .with_label_values(&["n1", "connected"])
            .get(),
        1.0
    );
    assert_eq!(
        metrics
            .exporter
            .pass_errors_total
            .with_label_values(&["eeros"])
            .get(),
        1
    );
}

#[tokio::test]
async fn test_malformed_body_stays_in_pass() {
    let mock_server = MockServer::start().await;
    mount_account(&mock_server).await;

    Mock::given(method("GET"))
        .and(path("/networks/n1/devices"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{invalid json"))
        .mount(&mock_server)
        .await;

    let (collector, metrics) = collector_against(&mock_server, Some("tok"), Duration::from_secs(5));

    collector.collect().await.unwrap();
    assert_eq!(
        metrics
            .exporter
            .api_requests_total
            .with_label_values(&["devices", "request"])
            .get(),
        1
    );
}

#[tokio::test]
async fn test_timeout_is_request_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/account"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"networks": []}))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&mock_server)
        .await;

    let (collector, _) = collector_against(&mock_server, Some("tok"), Duration::from_millis(200));

    assert_matches!(collector.collect().await, Err(CycleError::Request(_)));
}

#[tokio::test]
async fn test_missing_token_never_calls_out() {
    let mock_server = MockServer::start().await;
    mount_account(&mock_server).await;

    let (collector, _) = collector_against(&mock_server, None, Duration::from_secs(5));

    assert_matches!(collector.collect().await, Err(CycleError::Auth(_)));
    assert!(mock_server.received_requests().await.unwrap().is_empty());
}
