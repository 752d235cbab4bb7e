//! End-to-end collection cycles over a scripted upstream
//!
//! These tests verify that:
//! - A full cycle fills every core series from enveloped payloads
//! - A failing pass leaves earlier values in place
//! - Entities without a usable id are never exported
//! - An auth failure anywhere ends the cycle
//! - Metadata rows are replaced, not duplicated, when labels change
//! - One network's failed pass does not affect another network

use std::sync::Arc;

use assert_matches::assert_matches;
use eero_exporter::{
    collector::CycleError,
    config::FeaturesConfig,
    metrics::ExporterMetrics,
    upstream::FetchError,
};
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::helpers::*;

#[tokio::test]
async fn test_full_cycle_round_trip() {
    let upstream = FixtureUpstream::new();
    home_account(&upstream);
    let metrics = Arc::new(ExporterMetrics::new().unwrap());
    let collector = collector_for(upstream.clone(), metrics.clone());

    let report = collector.collect().await.unwrap();
    assert_eq!(report.networks, 1);
    assert_eq!(report.pass_errors, 0);

    let net = &metrics.network;
    assert_eq!(net.status.with_label_values(&["n1"]).get(), 1.0);
    assert_eq!(net.speed_mbps.with_label_values(&["n1", "up"]).get(), 20.5);
    assert_eq!(net.eeros.with_label_values(&["n1"]).get(), 1.0);
    assert_eq!(net.devices.with_label_values(&["n1", "total"]).get(), 2.0);
    assert_eq!(net.devices.with_label_values(&["n1", "connected"]).get(), 1.0);
    assert_eq!(net.devices.with_label_values(&["n1", "wireless"]).get(), 1.0);
    assert_eq!(net.profiles.with_label_values(&["n1"]).get(), 1.0);

    let eero = ["n1", "e1", "Office"];
    assert_eq!(metrics.eero.status.with_label_values(&eero).get(), 1.0);
    assert_eq!(metrics.eero.gateway.with_label_values(&eero).get(), 1.0);
    assert_eq!(
        metrics
            .eero
            .port_speed_mbps
            .with_label_values(&["n1", "e1", "Office", "WAN"])
            .get(),
        1000.0
    );
    assert_eq!(
        metrics
            .eero
            .port_carrier
            .with_label_values(&["n1", "e1", "Office", "LAN"])
            .get(),
        0.0
    );

    let laptop = ["n1", "d1", "Laptop"];
    let dev = &metrics.device;
    assert_eq!(dev.signal_dbm.with_label_values(&laptop).get(), -63.0);
    assert_eq!(dev.frequency_mhz.with_label_values(&laptop).get(), 5955.0);
    assert_eq!(
        dev.wifi_band
            .with_label_values(&["n1", "d1", "Laptop", "6GHz"])
            .get(),
        1.0
    );
    assert_eq!(dev.wifi_generation.with_label_values(&laptop).get(), 6.0);
    assert_eq!(
        dev.bitrate_mbps
            .with_label_values(&["n1", "d1", "Laptop", "rx"])
            .get(),
        1500.0
    );
    assert_eq!(
        dev.channel_width_mhz
            .with_label_values(&["n1", "d1", "Laptop", "rx"])
            .get(),
        160.0
    );
    assert_eq!(dev.connected.with_label_values(&["n1", "d2", "printer"]).get(), 0.0);

    assert_eq!(
        metrics
            .profile
            .devices
            .with_label_values(&["n1", "p1", "Kids"])
            .get(),
        1.0
    );
}

#[tokio::test]
async fn test_absent_fields_are_not_exported() {
    let upstream = FixtureUpstream::new();
    home_account(&upstream);
    let metrics = Arc::new(ExporterMetrics::new().unwrap());
    let collector = collector_for(upstream.clone(), metrics.clone());

    collector.collect().await.unwrap();
    let text = metrics.encode().unwrap();

    // the printer has no connectivity block
    assert!(
        series(&text, "eero_device_signal_dbm")
            .iter()
            .all(|line| !line.contains(r#"device_id="d2""#))
    );
    // no eero reports a temperature
    assert!(series(&text, "eero_eero_temperature_celsius").is_empty());
}

#[tokio::test]
async fn test_failed_pass_keeps_previous_values() {
    let upstream = FixtureUpstream::new();
    home_account(&upstream);
    let metrics = Arc::new(ExporterMetrics::new().unwrap());
    let collector = collector_for(upstream.clone(), metrics.clone());

    collector.collect().await.unwrap();

    upstream.fail("networks/n1/devices", FetchError::Request("HTTP 503".into()));
    upstream.respond(
        "networks/n1/eeros",
        envelope(json!([{"url": "/2.2/eeros/e1", "location": "Office", "status": "red"}])),
    );

    let report = collector.collect().await.unwrap();
    assert_eq!(report.pass_errors, 1);

    // eeros pass ran and updated
    assert_eq!(
        metrics
            .eero
            .status
            .with_label_values(&["n1", "e1", "Office"])
            .get(),
        0.0
    );
    // devices pass failed and left everything alone
    assert_eq!(
        metrics
            .device
            .signal_dbm
            .with_label_values(&["n1", "d1", "Laptop"])
            .get(),
        -63.0
    );
    assert_eq!(
        metrics
            .network
            .devices
            .with_label_values(&["n1", "total"])
            .get(),
        2.0
    );
    assert_eq!(
        metrics
            .exporter
            .pass_errors_total
            .with_label_values(&["devices"])
            .get(),
        1
    );
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
async fn test_entities_without_id_are_dropped() {
    let upstream = FixtureUpstream::new();
    upstream.respond(
        "account",
        json!({"networks": [
            {"url": "/2.2/networks/n1"},
            {"name": "no id at all"},
            {"id": "has space"}
        ]}),
    );
    upstream.respond(
        "networks/n1/devices",
        json!({"devices": [
            {"url": "/2.2/networks/n1/devices/d1", "connected": true},
            {"mac": "aa:bb:cc:dd:ee:ff", "connected": true}
        ]}),
    );
    let metrics = Arc::new(ExporterMetrics::new().unwrap());
    let collector = collector_for(upstream.clone(), metrics.clone());

    let report = collector.collect().await.unwrap();
    assert_eq!(report.networks, 1);

    let text = metrics.encode().unwrap();
    assert!(!text.contains("has space"));
    assert_eq!(series(&text, "eero_device_connected").len(), 1);
    assert_eq!(
        metrics
            .network
            .devices
            .with_label_values(&["n1", "total"])
            .get(),
        1.0
    );
}

#[tokio::test]
async fn test_repeated_cycles_are_idempotent() {
    let upstream = FixtureUpstream::new();
    home_account(&upstream);
    let metrics = Arc::new(ExporterMetrics::new().unwrap());
    let collector = collector_for(upstream.clone(), metrics.clone());

    let entity_series = |text: String| -> Vec<String> {
        text.lines()
            .filter(|line| !line.starts_with("eero_exporter_") && !line.starts_with('#'))
            .map(str::to_string)
            .collect()
    };

    collector.collect().await.unwrap();
    let first = entity_series(metrics.encode().unwrap());
    collector.collect().await.unwrap();
    let second = entity_series(metrics.encode().unwrap());

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_auth_failure_aborts_cycle() {
    let upstream = FixtureUpstream::new();
    home_account(&upstream);
    upstream.fail("networks/n1/eeros", FetchError::Auth("HTTP 401".into()));
    let metrics = Arc::new(ExporterMetrics::new().unwrap());
    let collector = collector_for(upstream.clone(), metrics.clone());

    let outcome = collector.collect().await;
    assert_matches!(outcome, Err(CycleError::Auth(_)));

    // nothing after the eeros pass ran
    let text = metrics.encode().unwrap();
    assert!(series(&text, "eero_device_connected").is_empty());
    assert_eq!(
        metrics
            .exporter
            .api_requests_total
            .with_label_values(&["eeros", "auth"])
            .get(),
        1
    );
}

#[tokio::test]
async fn test_networks_failure_is_request_error() {
    let upstream = FixtureUpstream::new();
    upstream.fail("account", FetchError::Request("timed out".into()));
    let metrics = Arc::new(ExporterMetrics::new().unwrap());
    let collector = collector_for(upstream.clone(), metrics);

    assert_matches!(collector.collect().await, Err(CycleError::Request(_)));
    assert_eq!(upstream.calls(), 1);
}

#[tokio::test]
async fn test_disabled_passes_make_no_calls() {
    let upstream = FixtureUpstream::new();
    home_account(&upstream);
    let metrics = Arc::new(ExporterMetrics::new().unwrap());
    let features = FeaturesConfig {
        devices: false,
        profiles: false,
        premium: false,
        ethernet: false,
        thread: false,
        port_forwards: false,
        reservations: false,
        blacklist: false,
        diagnostics: false,
        insights: false,
        sqm: false,
    };
    let collector = collector_with(upstream.clone(), metrics.clone(), features);

    let report = collector.collect().await.unwrap();

    // account, network detail, eeros
    assert_eq!(upstream.calls(), 3);
    assert_eq!(report.feature_errors, 0);

    let text = metrics.encode().unwrap();
    assert!(series(&text, "eero_device_connected").is_empty());
    assert!(series(&text, "eero_eero_ethernet_port_carrier").is_empty());
}

#[tokio::test]
async fn test_premium_passes_gated_on_subscription() {
    let upstream = FixtureUpstream::new();
    home_account(&upstream);
    upstream.respond("networks/n1/premium", envelope(json!({"is_premium": false})));
    let metrics = Arc::new(ExporterMetrics::new().unwrap());
    let collector = collector_for(upstream.clone(), metrics.clone());

    collector.collect().await.unwrap();
    assert_eq!(
        metrics
            .features
            .premium_active
            .with_label_values(&["n1"])
            .get(),
        0.0
    );
    assert_eq!(
        metrics
            .exporter
            .api_requests_total
            .with_label_values(&["activity", "request"])
            .get(),
        0
    );

    upstream.respond("networks/n1/premium", envelope(json!({"is_premium": true})));
    upstream.respond(
        "networks/n1/activity",
        envelope(json!({"upload": 1000, "download": 5000})),
    );
    upstream.respond(
        "networks/n1/backup_network",
        envelope(json!({"enabled": true})),
    );

    collector.collect().await.unwrap();
    assert_eq!(
        metrics
            .features
            .activity_bytes
            .with_label_values(&["n1", "down"])
            .get(),
        5000.0
    );
    assert_eq!(
        metrics
            .features
            .backup_enabled
            .with_label_values(&["n1"])
            .get(),
        1.0
    );
    // unanswered premium endpoints count as feature errors, not pass errors
    assert_eq!(
        metrics
            .exporter
            .feature_errors_total
            .with_label_values(&["backup_status"])
            .get(),
        1
    );
    assert_eq!(
        metrics
            .exporter
            .pass_errors_total
            .with_label_values(&["backup_status"])
            .get(),
        0
    );
}

#[tokio::test]
async fn test_changed_labels_replace_previous_row() {
    let upstream = FixtureUpstream::new();
    home_account(&upstream);
    let metrics = Arc::new(ExporterMetrics::new().unwrap());
    let collector = collector_for(upstream.clone(), metrics.clone());

    collector.collect().await.unwrap();

    upstream.respond(
        "networks/n1",
        envelope(json!({
            "url": "/2.2/networks/n1",
            "name": "Home",
            "isp_name": "Comcast",
            "wan_type": "pppoe"
        })),
    );
    upstream.respond(
        "networks/n1/devices",
        envelope(json!([{
            "url": "/2.2/networks/n1/devices/d1",
            "nickname": "Laptop",
            "connected": true,
            "wireless": true,
            "connectivity": {"signal": "-55 dBm", "frequency": 5180}
        }])),
    );

    collector.collect().await.unwrap();
    let text = metrics.encode().unwrap();

    let bands = series(&text, "eero_device_wifi_band");
    assert_eq!(bands.len(), 1);
    assert!(bands[0].contains(r#"band="5GHz""#));

    let info = series(&text, "eero_network_info");
    assert_eq!(info.len(), 1);
    assert!(info[0].contains(r#"isp="Comcast""#));
    assert!(info[0].contains(r#"wan_type="pppoe""#));
}

#[tokio::test]
async fn test_network_failures_stay_in_their_network() {
    for concurrency in [1, 2] {
        let upstream = FixtureUpstream::new();
        two_network_account(&upstream);
        upstream.fail("networks/n1/devices", FetchError::Request("HTTP 503".into()));
        let metrics = Arc::new(ExporterMetrics::new().unwrap());
        let collector = concurrent_collector(upstream.clone(), metrics.clone(), concurrency);

        let report = collector.collect().await.unwrap();
        assert_eq!(report.networks, 2, "concurrency {concurrency}");
        assert_eq!(report.pass_errors, 1, "concurrency {concurrency}");
        assert_eq!(
            metrics
                .exporter
                .pass_errors_total
                .with_label_values(&["devices"])
                .get(),
            1
        );

        let text = metrics.encode().unwrap();
        // network A still exported its eeros, but no devices
        assert!(
            !series(&text, "eero_device_connected")
                .iter()
                .any(|line| line.contains(r#"network_id="n1""#))
        );
        assert_eq!(
            metrics
                .eero
                .status
                .with_label_values(&["n1", "e1", "Office"])
                .get(),
            1.0
        );

        // network B was collected in full
        assert_eq!(
            metrics
                .eero
                .status
                .with_label_values(&["n2", "e2", "Porch"])
                .get(),
            1.0
        );
        assert_eq!(
            metrics
                .device
                .signal_dbm
                .with_label_values(&["n2", "d3", "Camera"])
                .get(),
            -71.0
        );
        assert_eq!(
            metrics
                .network
                .devices
                .with_label_values(&["n2", "connected"])
                .get(),
            1.0
        );
        assert!(
            series(&text, "eero_network_profiles")
                .contains(&r#"eero_network_profiles{network_id="n2"} 0"#)
        );
    }
}
