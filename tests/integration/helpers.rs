//! Test helpers: a scripted upstream and a fixture account

use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use eero_exporter::{
    collector::Collector,
    config::FeaturesConfig,
    metrics::ExporterMetrics,
    upstream::{FetchError, FetchResult, Fetchers, Upstream},
};
use serde_json::{Value, json};

/// Upstream answering from a path → response table
///
/// Paths without an entry answer with a 404 request error.
#[derive(Default)]
pub struct FixtureUpstream {
    responses: Mutex<HashMap<String, FetchResult<Value>>>,
    calls: AtomicUsize,
}

impl FixtureUpstream {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, path: &str, body: Value) {
        self.set(path, Ok(body));
    }

    pub fn fail(&self, path: &str, err: FetchError) {
        self.set(path, Err(err));
    }

    fn set(&self, path: &str, response: FetchResult<Value>) {
        self.responses
            .lock()
            .unwrap()
            .insert(path.to_string(), response);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Upstream for FixtureUpstream {
    async fn get_json(&self, path: &str) -> FetchResult<Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.responses
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .unwrap_or_else(|| Err(FetchError::Request(format!("{path}: HTTP 404"))))
    }
}

/// Envelope a payload the way the API does
pub fn envelope(data: Value) -> Value {
    json!({"meta": {"code": 200, "server_time": "2024-05-01T12:00:00Z"}, "data": data})
}

/// One network `n1` with one gateway eero, two devices and a profile
pub fn home_account(upstream: &FixtureUpstream) {
    upstream.respond(
        "account",
        envelope(json!({
            "name": "Test User",
            "networks": {"count": 1, "data": [{"url": "/2.2/networks/n1", "name": "Home"}]}
        })),
    );

    upstream.respond(
        "networks/n1",
        envelope(json!({
            "url": "/2.2/networks/n1",
            "name": "Home",
            "status": "connected",
            "isp_name": "Sonic",
            "wan_type": "dhcp",
            "health": {
                "internet": {"status": "connected"},
                "eero_network": {"status": "connected"}
            },
            "speed": {
                "up": {"value": 20.5, "units": "Mbps"},
                "down": {"value": 480, "units": "Mbps"}
            }
        })),
    );

    upstream.respond(
        "networks/n1/eeros",
        envelope(json!([{
            "url": "/2.2/eeros/e1",
            "serial": "GGC1UC0000001",
            "location": "Office",
            "model": "eero Pro 6E",
            "status": "green",
            "gateway": true,
            "connected_clients_count": 2,
            "mesh_quality_bars": 5,
            "led_on": true,
            "ethernet_status": {"statuses": [
                {"port_name": "WAN", "has_carrier": true, "speed": "1G", "is_wan_port": true},
                {"port_name": "LAN", "has_carrier": false}
            ]}
        }])),
    );

    upstream.respond(
        "networks/n1/devices",
        envelope(json!([
            {
                "url": "/2.2/networks/n1/devices/d1",
                "mac": "aa:bb:cc:dd:ee:01",
                "nickname": "Laptop",
                "connected": true,
                "wireless": true,
                "connectivity": {
                    "signal": "-63 dBm",
                    "frequency": 5955,
                    "rx_bitrate": "1.5 Gbps",
                    "rx_rate_info": {"mcs": 11, "nss": 2, "channel_width": "WIDTH_160"}
                }
            },
            {
                "url": "/2.2/networks/n1/devices/d2",
                "mac": "aa:bb:cc:dd:ee:02",
                "hostname": "printer",
                "connected": false,
                "wireless": false
            }
        ])),
    );

    upstream.respond(
        "networks/n1/profiles",
        envelope(json!([{
            "url": "/2.2/networks/n1/profiles/p1",
            "name": "Kids",
            "paused": false,
            "devices": [{"url": "/2.2/networks/n1/devices/d1"}]
        }])),
    );
}

/// `home_account` plus a second network `n2` with one eero and one device
pub fn two_network_account(upstream: &FixtureUpstream) {
    home_account(upstream);

    upstream.respond(
        "account",
        envelope(json!({
            "networks": {"count": 2, "data": [
                {"url": "/2.2/networks/n1", "name": "Home"},
                {"url": "/2.2/networks/n2", "name": "Cabin"}
            ]}
        })),
    );

    upstream.respond(
        "networks/n2",
        envelope(json!({"url": "/2.2/networks/n2", "name": "Cabin", "status": "connected"})),
    );

    upstream.respond(
        "networks/n2/eeros",
        envelope(json!([{"url": "/2.2/eeros/e2", "location": "Porch", "status": "green"}])),
    );

    upstream.respond(
        "networks/n2/devices",
        envelope(json!([{
            "url": "/2.2/networks/n2/devices/d3",
            "nickname": "Camera",
            "connected": true,
            "wireless": true,
            "connectivity": {"signal": "-71 dBm", "frequency": 2437}
        }])),
    );

    upstream.respond("networks/n2/profiles", envelope(json!([])));
}

/// Collector over a fixture upstream with every feature switched on
pub fn collector_for(
    upstream: Arc<FixtureUpstream>,
    metrics: Arc<ExporterMetrics>,
) -> Collector {
    collector_with(upstream, metrics, FeaturesConfig::default())
}

pub fn collector_with(
    upstream: Arc<FixtureUpstream>,
    metrics: Arc<ExporterMetrics>,
    features: FeaturesConfig,
) -> Collector {
    Collector::new(Fetchers::new(upstream), metrics, features, 1)
}

/// Collector walking up to `concurrency` networks at once
pub fn concurrent_collector(
    upstream: Arc<FixtureUpstream>,
    metrics: Arc<ExporterMetrics>,
    concurrency: usize,
) -> Collector {
    Collector::new(
        Fetchers::new(upstream),
        metrics,
        FeaturesConfig::default(),
        concurrency,
    )
}

/// Lines of the exposition text for one metric name
pub fn series<'a>(text: &'a str, name: &str) -> Vec<&'a str> {
    let prefix = format!("{name}{{");
    text.lines()
        .filter(|line| line.starts_with(&prefix) || line.starts_with(&format!("{name} ")))
        .collect()
}
