//! Metric registry
//!
//! [`ExporterMetrics`] owns a private [`Registry`] and every series the
//! exporter publishes. It is created once, shared by `Arc` between the
//! scheduler (single writer) and the HTTP handlers (readers). Each series is
//! an atomic gauge or counter, so a scrape never sees a half-written value.

use std::{
    collections::HashMap,
    sync::{Mutex, PoisonError},
};

use prometheus::{
    Encoder, Gauge, GaugeVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};

const NAMESPACE: &str = "eero";

pub type MetricsResult<T> = Result<T, prometheus::Error>;

fn gauge_vec(
    registry: &Registry,
    name: &str,
    help: &str,
    labels: &[&str],
) -> MetricsResult<GaugeVec> {
    let gauge = GaugeVec::new(Opts::new(name, help).namespace(NAMESPACE), labels)?;
    registry.register(Box::new(gauge.clone()))?;
    Ok(gauge)
}

fn info_vec(
    registry: &Registry,
    name: &str,
    help: &str,
    labels: &[&str],
    key_len: usize,
) -> MetricsResult<InfoVec> {
    Ok(InfoVec {
        gauge: gauge_vec(registry, name, help, labels)?,
        key_len,
        rows: Mutex::new(HashMap::new()),
    })
}

fn gauge(registry: &Registry, name: &str, help: &str) -> MetricsResult<Gauge> {
    let gauge = Gauge::with_opts(Opts::new(name, help).namespace(NAMESPACE))?;
    registry.register(Box::new(gauge.clone()))?;
    Ok(gauge)
}

fn counter_vec(
    registry: &Registry,
    name: &str,
    help: &str,
    labels: &[&str],
) -> MetricsResult<IntCounterVec> {
    let counter = IntCounterVec::new(Opts::new(name, help).namespace(NAMESPACE), labels)?;
    registry.register(Box::new(counter.clone()))?;
    Ok(counter)
}

fn counter(registry: &Registry, name: &str, help: &str) -> MetricsResult<IntCounter> {
    let counter = IntCounter::with_opts(Opts::new(name, help).namespace(NAMESPACE))?;
    registry.register(Box::new(counter.clone()))?;
    Ok(counter)
}

/// Write `value` if there is one; an absent value leaves the series untouched
pub fn set_opt(gauge: &GaugeVec, labels: &[&str], value: Option<f64>) {
    if let Some(value) = value {
        gauge.with_label_values(labels).set(value);
    }
}

/// Write `1`/`0` for a present flag; an absent flag writes nothing
pub fn set_flag(gauge: &GaugeVec, labels: &[&str], value: Option<bool>) {
    set_opt(gauge, labels, value.map(bool_value));
}

pub fn bool_value(value: bool) -> f64 {
    if value { 1.0 } else { 0.0 }
}

/// Gauge family holding one row per entity, always 1
///
/// The first `key_len` labels identify the entity. The remaining labels carry
/// values that change over time (ISP, firmware, band), so writing a new label
/// set for a known entity removes the row it replaces.
pub struct InfoVec {
    gauge: GaugeVec,
    key_len: usize,
    rows: Mutex<HashMap<Vec<String>, Vec<String>>>,
}

impl InfoVec {
    pub fn set(&self, labels: &[&str]) {
        let key = labels
            .iter()
            .take(self.key_len)
            .map(|l| l.to_string())
            .collect();
        let row = labels.iter().map(|l| l.to_string()).collect();

        let mut rows = self.rows.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = rows.insert(key, row) {
            let previous: Vec<&str> = previous.iter().map(String::as_str).collect();
            if previous != labels {
                // a missing row needs no removal
                let _ = self.gauge.remove_label_values(&previous);
            }
        }
        self.gauge.with_label_values(labels).set(1.0);
    }

    pub fn with_label_values(&self, labels: &[&str]) -> Gauge {
        self.gauge.with_label_values(labels)
    }
}

const NET: &[&str] = &["network_id"];
const NET_DIR: &[&str] = &["network_id", "direction"];
const EERO: &[&str] = &["network_id", "eero_id", "location"];
const PORT: &[&str] = &["network_id", "eero_id", "location", "port"];
const DEVICE: &[&str] = &["network_id", "device_id", "name"];
const DEVICE_DIR: &[&str] = &["network_id", "device_id", "name", "direction"];
const PROFILE: &[&str] = &["network_id", "profile_id", "name"];

pub struct NetworkMetrics {
    pub info: InfoVec,
    pub status: GaugeVec,
    pub health: GaugeVec,
    pub feature_enabled: GaugeVec,
    pub speed_mbps: GaugeVec,
    pub speed_test_timestamp: GaugeVec,
    pub eeros: GaugeVec,
    pub devices: GaugeVec,
    pub profiles: GaugeVec,
}

impl NetworkMetrics {
    fn new(r: &Registry) -> MetricsResult<Self> {
        Ok(Self {
            info: info_vec(
                r,
                "network_info",
                "Network metadata, always 1",
                &["network_id", "name", "isp", "wan_type", "public_ip", "gateway_ip"],
                1,
            )?,
            status: gauge_vec(r, "network_status", "1 if the network is online", NET)?,
            health: gauge_vec(
                r,
                "network_health",
                "1 if the health source reports connected",
                &["network_id", "source"],
            )?,
            feature_enabled: gauge_vec(
                r,
                "network_feature_enabled",
                "1 if the network feature is enabled",
                &["network_id", "feature"],
            )?,
            speed_mbps: gauge_vec(
                r,
                "network_speed_mbps",
                "Last speed test result in Mbps",
                NET_DIR,
            )?,
            speed_test_timestamp: gauge_vec(
                r,
                "network_speed_test_timestamp_seconds",
                "Time of the last speed test",
                NET,
            )?,
            eeros: gauge_vec(r, "network_eeros", "Number of eero nodes in the network", NET)?,
            devices: gauge_vec(
                r,
                "network_devices",
                "Number of client devices by state",
                &["network_id", "state"],
            )?,
            profiles: gauge_vec(r, "network_profiles", "Number of profiles in the network", NET)?,
        })
    }
}

pub struct EeroMetrics {
    pub info: InfoVec,
    pub status: GaugeVec,
    pub gateway: GaugeVec,
    pub connected_clients: GaugeVec,
    pub mesh_quality_bars: GaugeVec,
    pub uptime_seconds: GaugeVec,
    pub update_available: GaugeVec,
    pub led_on: GaugeVec,
    pub led_brightness: GaugeVec,
    pub heartbeat_ok: GaugeVec,
    pub wired_backhaul: GaugeVec,
    pub cpu_usage: GaugeVec,
    pub memory_usage: GaugeVec,
    pub temperature: GaugeVec,
    pub port_carrier: GaugeVec,
    pub port_speed_mbps: GaugeVec,
    pub port_wan: GaugeVec,
    pub port_power_saving: GaugeVec,
    pub nightlight_enabled: GaugeVec,
    pub nightlight_brightness: GaugeVec,
    pub nightlight_ambient: GaugeVec,
    pub nightlight_schedule: GaugeVec,
}

impl EeroMetrics {
    fn new(r: &Registry) -> MetricsResult<Self> {
        Ok(Self {
            info: info_vec(
                r,
                "eero_info",
                "eero node metadata, always 1",
                &[
                    "network_id",
                    "eero_id",
                    "serial",
                    "location",
                    "model",
                    "model_number",
                    "mac_address",
                    "ip_address",
                    "os_version",
                ],
                2,
            )?,
            status: gauge_vec(r, "eero_status", "1 if the eero is online", EERO)?,
            gateway: gauge_vec(r, "eero_gateway", "1 if the eero is the gateway", EERO)?,
            connected_clients: gauge_vec(
                r,
                "eero_connected_clients",
                "Clients attached to the eero",
                &["network_id", "eero_id", "location", "type"],
            )?,
            mesh_quality_bars: gauge_vec(r, "eero_mesh_quality_bars", "Mesh quality (0-5)", EERO)?,
            uptime_seconds: gauge_vec(r, "eero_uptime_seconds", "eero uptime", EERO)?,
            update_available: gauge_vec(
                r,
                "eero_update_available",
                "1 if a firmware update is available",
                EERO,
            )?,
            led_on: gauge_vec(r, "eero_led_on", "1 if the status LED is on", EERO)?,
            led_brightness: gauge_vec(r, "eero_led_brightness", "Status LED brightness", EERO)?,
            heartbeat_ok: gauge_vec(
                r,
                "eero_heartbeat_ok",
                "1 if the eero heartbeat is healthy",
                EERO,
            )?,
            wired_backhaul: gauge_vec(
                r,
                "eero_wired_backhaul",
                "1 if the eero uses wired backhaul",
                EERO,
            )?,
            cpu_usage: gauge_vec(r, "eero_cpu_usage_percent", "CPU usage", EERO)?,
            memory_usage: gauge_vec(r, "eero_memory_usage_percent", "Memory usage", EERO)?,
            temperature: gauge_vec(r, "eero_temperature_celsius", "Device temperature", EERO)?,
            port_carrier: gauge_vec(
                r,
                "eero_ethernet_port_carrier",
                "1 if the Ethernet port has carrier",
                PORT,
            )?,
            port_speed_mbps: gauge_vec(
                r,
                "eero_ethernet_port_speed_mbps",
                "Negotiated Ethernet port speed",
                PORT,
            )?,
            port_wan: gauge_vec(
                r,
                "eero_ethernet_port_wan",
                "1 if the port is the WAN port",
                PORT,
            )?,
            port_power_saving: gauge_vec(
                r,
                "eero_ethernet_port_power_saving",
                "1 if the port is in power saving mode",
                PORT,
            )?,
            nightlight_enabled: gauge_vec(
                r,
                "eero_nightlight_enabled",
                "1 if the nightlight is on",
                EERO,
            )?,
            nightlight_brightness: gauge_vec(
                r,
                "eero_nightlight_brightness_percent",
                "Nightlight brightness",
                EERO,
            )?,
            nightlight_ambient: gauge_vec(
                r,
                "eero_nightlight_ambient_light_enabled",
                "1 if ambient light sensing is enabled",
                EERO,
            )?,
            nightlight_schedule: gauge_vec(
                r,
                "eero_nightlight_schedule_enabled",
                "1 if the nightlight schedule is enabled",
                EERO,
            )?,
        })
    }
}

pub struct DeviceMetrics {
    pub info: InfoVec,
    pub connected: GaugeVec,
    pub wireless: GaugeVec,
    pub state: GaugeVec,
    pub signal_dbm: GaugeVec,
    pub signal_avg_dbm: GaugeVec,
    pub score: GaugeVec,
    pub score_bars: GaugeVec,
    pub frequency_mhz: GaugeVec,
    pub wifi_band: InfoVec,
    pub channel: GaugeVec,
    pub wifi_generation: GaugeVec,
    pub bitrate_mbps: GaugeVec,
    pub mcs: GaugeVec,
    pub nss: GaugeVec,
    pub channel_width_mhz: GaugeVec,
    pub usage_bytes: GaugeVec,
    pub last_active: GaugeVec,
    pub first_seen: GaugeVec,
}

impl DeviceMetrics {
    fn new(r: &Registry) -> MetricsResult<Self> {
        Ok(Self {
            info: info_vec(
                r,
                "device_info",
                "Client device metadata, always 1",
                &[
                    "network_id",
                    "device_id",
                    "name",
                    "mac",
                    "manufacturer",
                    "ip",
                    "hostname",
                    "device_type",
                    "source_location",
                ],
                2,
            )?,
            connected: gauge_vec(r, "device_connected", "1 if the device is connected", DEVICE)?,
            wireless: gauge_vec(r, "device_wireless", "1 if the device is on Wi-Fi", DEVICE)?,
            state: gauge_vec(
                r,
                "device_state",
                "1 if the device is in the given state (blocked, paused, guest, ...)",
                &["network_id", "device_id", "name", "state"],
            )?,
            signal_dbm: gauge_vec(r, "device_signal_dbm", "Wi-Fi signal strength", DEVICE)?,
            signal_avg_dbm: gauge_vec(
                r,
                "device_signal_avg_dbm",
                "Rolling average Wi-Fi signal strength",
                DEVICE,
            )?,
            score: gauge_vec(r, "device_connection_score", "Connection quality score", DEVICE)?,
            score_bars: gauge_vec(
                r,
                "device_connection_score_bars",
                "Connection quality bars",
                DEVICE,
            )?,
            frequency_mhz: gauge_vec(r, "device_frequency_mhz", "Wi-Fi frequency", DEVICE)?,
            wifi_band: info_vec(
                r,
                "device_wifi_band",
                "Wi-Fi band the device is on, always 1",
                &["network_id", "device_id", "name", "band"],
                2,
            )?,
            channel: gauge_vec(r, "device_channel", "Wi-Fi channel", DEVICE)?,
            wifi_generation: gauge_vec(
                r,
                "device_wifi_generation",
                "Wi-Fi generation (4, 5, 6, 7)",
                DEVICE,
            )?,
            bitrate_mbps: gauge_vec(r, "device_bitrate_mbps", "Link bitrate", DEVICE_DIR)?,
            mcs: gauge_vec(r, "device_mcs", "Modulation and coding scheme index", DEVICE_DIR)?,
            nss: gauge_vec(r, "device_nss", "Number of spatial streams", DEVICE_DIR)?,
            channel_width_mhz: gauge_vec(
                r,
                "device_channel_width_mhz",
                "Channel width",
                DEVICE_DIR,
            )?,
            usage_bytes: gauge_vec(
                r,
                "device_usage_bytes",
                "Data usage reported for the device",
                DEVICE_DIR,
            )?,
            last_active: gauge_vec(
                r,
                "device_last_active_timestamp_seconds",
                "Time the device was last active",
                DEVICE,
            )?,
            first_seen: gauge_vec(
                r,
                "device_first_seen_timestamp_seconds",
                "Time the device was first seen",
                DEVICE,
            )?,
        })
    }
}

pub struct ProfileMetrics {
    pub paused: GaugeVec,
    pub devices: GaugeVec,
}

impl ProfileMetrics {
    fn new(r: &Registry) -> MetricsResult<Self> {
        Ok(Self {
            paused: gauge_vec(r, "profile_paused", "1 if the profile is paused", PROFILE)?,
            devices: gauge_vec(r, "profile_devices", "Devices assigned to the profile", PROFILE)?,
        })
    }
}

/// Optional and premium feature series
pub struct FeatureMetrics {
    pub sqm_enabled: GaugeVec,
    pub sqm_bandwidth_mbps: GaugeVec,
    pub premium_active: GaugeVec,
    pub backup_enabled: GaugeVec,
    pub backup_in_use: GaugeVec,
    pub activity_bytes: GaugeVec,
    pub activity_category_bytes: GaugeVec,
    pub activity_device_bytes: GaugeVec,
    pub thread_enabled: GaugeVec,
    pub thread_devices: GaugeVec,
    pub thread_border_routers: GaugeVec,
    pub port_forwards: GaugeVec,
    pub port_forwards_enabled: GaugeVec,
    pub reservations: GaugeVec,
    pub blacklisted: GaugeVec,
    pub latency_ms: GaugeVec,
    pub diagnostics_timestamp: GaugeVec,
    pub insights: GaugeVec,
}

impl FeatureMetrics {
    fn new(r: &Registry) -> MetricsResult<Self> {
        Ok(Self {
            sqm_enabled: gauge_vec(r, "sqm_enabled", "1 if Smart Queue Management is on", NET)?,
            sqm_bandwidth_mbps: gauge_vec(r, "sqm_bandwidth_mbps", "SQM bandwidth limit", NET_DIR)?,
            premium_active: gauge_vec(
                r,
                "premium_active",
                "1 if the network has an active subscription",
                NET,
            )?,
            backup_enabled: gauge_vec(
                r,
                "backup_network_enabled",
                "1 if backup internet is configured",
                NET,
            )?,
            backup_in_use: gauge_vec(
                r,
                "backup_network_in_use",
                "1 if the backup connection is in use",
                NET,
            )?,
            activity_bytes: gauge_vec(r, "activity_bytes", "Network activity volume", NET_DIR)?,
            activity_category_bytes: gauge_vec(
                r,
                "activity_category_bytes",
                "Activity volume by category",
                &["network_id", "category"],
            )?,
            activity_device_bytes: gauge_vec(
                r,
                "activity_device_bytes",
                "Activity volume by client",
                DEVICE_DIR,
            )?,
            thread_enabled: gauge_vec(r, "thread_enabled", "1 if Thread is enabled", NET)?,
            thread_devices: gauge_vec(r, "thread_devices", "Thread devices", NET)?,
            thread_border_routers: gauge_vec(
                r,
                "thread_border_routers",
                "Thread border routers",
                NET,
            )?,
            port_forwards: gauge_vec(r, "port_forwards", "Configured port forward rules", NET)?,
            port_forwards_enabled: gauge_vec(
                r,
                "port_forwards_enabled",
                "Enabled port forward rules",
                NET,
            )?,
            reservations: gauge_vec(r, "dhcp_reservations", "DHCP reservations", NET)?,
            blacklisted: gauge_vec(r, "blacklisted_devices", "Blocked devices", NET)?,
            latency_ms: gauge_vec(
                r,
                "diagnostics_latency_ms",
                "Latency measured by the last diagnostics run",
                &["network_id", "target"],
            )?,
            diagnostics_timestamp: gauge_vec(
                r,
                "diagnostics_last_run_timestamp_seconds",
                "Time of the last diagnostics run",
                NET,
            )?,
            insights: gauge_vec(
                r,
                "insights",
                "Open insights by kind (issues, recommendations)",
                &["network_id", "kind"],
            )?,
        })
    }
}

/// Series describing the exporter itself
pub struct ExporterSelfMetrics {
    pub scrape_duration_seconds: Gauge,
    pub scrape_success: Gauge,
    pub last_collection_timestamp: Gauge,
    pub collections_total: IntCounter,
    pub scrape_errors_total: IntCounterVec,
    pub api_requests_total: IntCounterVec,
    pub pass_errors_total: IntCounterVec,
    pub feature_errors_total: IntCounterVec,
}

impl ExporterSelfMetrics {
    fn new(r: &Registry) -> MetricsResult<Self> {
        Ok(Self {
            scrape_duration_seconds: gauge(
                r,
                "exporter_scrape_duration_seconds",
                "Duration of the last collection cycle",
            )?,
            scrape_success: gauge(
                r,
                "exporter_scrape_success",
                "1 if the last collection cycle succeeded",
            )?,
            last_collection_timestamp: gauge(
                r,
                "exporter_last_collection_timestamp_seconds",
                "Time the last collection cycle finished",
            )?,
            collections_total: counter(r, "exporter_collections_total", "Collection cycles run")?,
            scrape_errors_total: counter_vec(
                r,
                "exporter_scrape_errors_total",
                "Failed collection cycles by error type",
                &["error_type"],
            )?,
            api_requests_total: counter_vec(
                r,
                "exporter_api_requests_total",
                "Upstream API requests by endpoint and outcome",
                &["endpoint", "status"],
            )?,
            pass_errors_total: counter_vec(
                r,
                "exporter_pass_errors_total",
                "Failed core collection passes",
                &["pass"],
            )?,
            feature_errors_total: counter_vec(
                r,
                "exporter_feature_errors_total",
                "Failed optional feature fetches",
                &["feature"],
            )?,
        })
    }
}

/// Every series the exporter publishes
pub struct ExporterMetrics {
    registry: Registry,
    pub network: NetworkMetrics,
    pub eero: EeroMetrics,
    pub device: DeviceMetrics,
    pub profile: ProfileMetrics,
    pub features: FeatureMetrics,
    pub exporter: ExporterSelfMetrics,
}

impl ExporterMetrics {
    pub fn new() -> MetricsResult<Self> {
        let registry = Registry::new();

        Ok(Self {
            network: NetworkMetrics::new(&registry)?,
            eero: EeroMetrics::new(&registry)?,
            device: DeviceMetrics::new(&registry)?,
            profile: ProfileMetrics::new(&registry)?,
            features: FeatureMetrics::new(&registry)?,
            exporter: ExporterSelfMetrics::new(&registry)?,
            registry,
        })
    }

    /// Current snapshot in the Prometheus text format
    pub fn encode(&self) -> MetricsResult<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
