//! Table-driven field extraction
//!
//! Most fields the exporter reads have lived under more than one key across
//! API revisions (the ISP name under `isp_name`, `geo_ip.isp` or `isp.name`;
//! a status as a bare string or as `{"status": ...}`). Instead of branching at
//! every call site, each field is a [`Field`]: an ordered list of [`Rule`]s,
//! each a candidate path plus a [`Transform`]. Accessors walk the rules in
//! order and return the first candidate that converts to the requested type.
//!
//! A new fallback location is a new table row.

use serde_json::Value;

use super::normalize::{self, Entity};

/// How the value found at a rule's path is turned into a field value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    /// Use the value as it is
    Raw,
    /// A bare string, or an object with the string under `status`
    Status,
    /// The last path segment of a resource URL (`/2.2/networks/123` → `123`)
    UrlTail,
    /// The length of a list, bare or wrapped
    Len,
}

/// One candidate location for a field
#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub path: &'static [&'static str],
    pub transform: Transform,
}

pub const fn raw(path: &'static [&'static str]) -> Rule {
    Rule {
        path,
        transform: Transform::Raw,
    }
}

pub const fn status(path: &'static [&'static str]) -> Rule {
    Rule {
        path,
        transform: Transform::Status,
    }
}

pub const fn url_tail(path: &'static [&'static str]) -> Rule {
    Rule {
        path,
        transform: Transform::UrlTail,
    }
}

pub const fn len(path: &'static [&'static str]) -> Rule {
    Rule {
        path,
        transform: Transform::Len,
    }
}

impl Rule {
    fn apply(&self, entity: &Entity) -> Option<Value> {
        let found = lookup(entity, self.path)?;

        match self.transform {
            Transform::Raw => Some(found.clone()),
            Transform::Status => match found {
                Value::Object(map) => map.get("status").filter(|v| !v.is_null()).cloned(),
                other => Some(other.clone()),
            },
            Transform::UrlTail => found.as_str().and_then(last_segment).map(Value::from),
            Transform::Len => normalize::nested_list(found).map(|items| Value::from(items.len())),
        }
    }
}

/// A named field and its candidate locations, most preferred first
#[derive(Debug, Clone, Copy)]
pub struct Field {
    pub name: &'static str,
    pub rules: &'static [Rule],
}

impl Field {
    /// First candidate that is present and not `null`, unconverted
    pub fn value(&self, entity: &Entity) -> Option<Value> {
        self.rules.iter().find_map(|rule| rule.apply(entity))
    }

    /// First candidate that is a non-empty string (numbers are rendered)
    pub fn string(&self, entity: &Entity) -> Option<String> {
        self.first(entity, as_string)
    }

    pub fn string_or_unknown(&self, entity: &Entity) -> String {
        self.string(entity).unwrap_or_else(|| UNKNOWN.to_string())
    }

    /// First candidate that is a number or a numeric string
    pub fn number(&self, entity: &Entity) -> Option<f64> {
        self.first(entity, as_number)
    }

    /// First candidate that reads as a boolean
    pub fn boolean(&self, entity: &Entity) -> Option<bool> {
        self.first(entity, as_bool)
    }

    /// First candidate that is an object
    pub fn entity(&self, entity: &Entity) -> Option<Entity> {
        self.first(entity, |value| match value {
            Value::Object(map) => Some(map),
            _ => None,
        })
    }

    /// First candidate that holds a list of objects
    pub fn list(&self, entity: &Entity) -> Option<Vec<Entity>> {
        self.first(entity, |value| {
            normalize::nested_list(&value)?;
            Some(normalize::list(&value, None))
        })
    }

    fn first<T>(&self, entity: &Entity, convert: impl Fn(Value) -> Option<T>) -> Option<T> {
        self.rules
            .iter()
            .filter_map(|rule| rule.apply(entity))
            .find_map(convert)
    }
}

/// Sentinel for string labels with no usable value
pub const UNKNOWN: &str = "unknown";

fn lookup<'a>(entity: &'a Entity, path: &[&str]) -> Option<&'a Value> {
    let (first, rest) = path.split_first()?;
    let start = entity.get(*first)?;
    rest.iter()
        .try_fold(start, |current, key| normalize::unwrap_envelope(current).get(*key))
        .map(normalize::unwrap_envelope)
        .filter(|value| !value.is_null())
}

fn last_segment(url: &str) -> Option<&str> {
    url.trim_end_matches('/')
        .rsplit('/')
        .next()
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
}

fn as_string(value: Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn as_number(value: Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    }
}

fn as_bool(value: Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(b),
        Value::Number(n) => n.as_f64().map(|n| n != 0.0),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" | "enabled" | "active" | "connected" | "online" => Some(true),
            "false" | "no" | "off" | "disabled" | "inactive" | "expired" | "none"
            | "disconnected" | "offline" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Identifier of any entity kind
///
/// The same rule applies to networks, eeros, devices, profiles and feature
/// rows: the last segment of `url`, then `id`, then `resource_id`. An entity
/// without one is not exported.
pub const ID: Field = Field {
    name: "id",
    rules: &[url_tail(&["url"]), raw(&["id"]), raw(&["resource_id"])],
};

pub fn entity_id(entity: &Entity) -> Option<String> {
    ID.string(entity)
        .filter(|id| !id.chars().any(|c| c.is_whitespace() || c.is_control()))
}

/// Online-ish status strings
pub fn is_online(status: &str) -> bool {
    matches!(
        status.trim().to_ascii_lowercase().as_str(),
        "connected" | "online" | "green" | "up"
    )
}

pub mod network {
    use super::*;

    pub const NAME: Field = Field {
        name: "name",
        rules: &[raw(&["name"]), raw(&["nickname"])],
    };
    pub const STATUS: Field = Field {
        name: "status",
        rules: &[status(&["status"]), status(&["connection"])],
    };
    pub const ISP: Field = Field {
        name: "isp",
        rules: &[raw(&["isp_name"]), raw(&["geo_ip", "isp"]), raw(&["isp", "name"]), raw(&["isp"])],
    };
    pub const PUBLIC_IP: Field = Field {
        name: "public_ip",
        rules: &[
            raw(&["public_ip"]),
            raw(&["wan_ip"]),
            raw(&["ip_settings", "public_ip"]),
            raw(&["geo_ip", "ip"]),
        ],
    };
    pub const WAN_TYPE: Field = Field {
        name: "wan_type",
        rules: &[raw(&["wan_type"]), raw(&["connection", "type"]), raw(&["connection", "mode"])],
    };
    pub const GATEWAY_IP: Field = Field {
        name: "gateway_ip",
        rules: &[
            raw(&["gateway_ip"]),
            raw(&["lease", "dhcp", "router"]),
            raw(&["ip_settings", "gateway"]),
        ],
    };
    pub const HEALTH_INTERNET: Field = Field {
        name: "health_internet",
        rules: &[status(&["health", "internet"])],
    };
    pub const HEALTH_EERO_NETWORK: Field = Field {
        name: "health_eero_network",
        rules: &[status(&["health", "eero_network"])],
    };
    pub const SPEED_UP: Field = Field {
        name: "speed_up",
        rules: &[
            raw(&["speed", "up", "value"]),
            raw(&["speed_test", "up", "value"]),
            raw(&["speed", "upload"]),
            raw(&["speed_test", "upload"]),
        ],
    };
    pub const SPEED_DOWN: Field = Field {
        name: "speed_down",
        rules: &[
            raw(&["speed", "down", "value"]),
            raw(&["speed_test", "down", "value"]),
            raw(&["speed", "download"]),
            raw(&["speed_test", "download"]),
        ],
    };
    pub const SPEED_DATE: Field = Field {
        name: "speed_date",
        rules: &[raw(&["speed", "date"]), raw(&["speed_test", "date"])],
    };

    /// Feature flags exported as `eero_network_feature_enabled{feature=...}`
    pub const FEATURES: &[(&str, Field)] = &[
        (
            "wpa3",
            Field {
                name: "wpa3",
                rules: &[raw(&["wpa3"]), raw(&["security", "wpa3"])],
            },
        ),
        (
            "band_steering",
            Field {
                name: "band_steering",
                rules: &[raw(&["band_steering"])],
            },
        ),
        (
            "sqm",
            Field {
                name: "sqm",
                rules: &[raw(&["sqm", "enabled"]), raw(&["sqm"])],
            },
        ),
        (
            "upnp",
            Field {
                name: "upnp",
                rules: &[raw(&["upnp"])],
            },
        ),
        (
            "thread",
            Field {
                name: "thread",
                rules: &[raw(&["thread", "enabled"]), raw(&["thread"])],
            },
        ),
        (
            "ipv6",
            Field {
                name: "ipv6",
                rules: &[raw(&["ipv6_upstream"]), raw(&["ipv6", "enabled"]), raw(&["ipv6"])],
            },
        ),
        (
            "dns_caching",
            Field {
                name: "dns_caching",
                rules: &[raw(&["dns_caching"]), raw(&["dns", "caching"])],
            },
        ),
        (
            "power_saving",
            Field {
                name: "power_saving",
                rules: &[raw(&["power_saving"])],
            },
        ),
        (
            "guest_network",
            Field {
                name: "guest_network",
                rules: &[raw(&["guest_network", "enabled"])],
            },
        ),
        (
            "backup_internet",
            Field {
                name: "backup_internet",
                rules: &[raw(&["backup_internet_enabled"]), raw(&["backup_internet", "enabled"])],
            },
        ),
        (
            "premium",
            Field {
                name: "premium",
                rules: &[raw(&["premium_status"]), raw(&["premium_details", "is_premium"])],
            },
        ),
        (
            "ad_block",
            Field {
                name: "ad_block",
                rules: &[raw(&["ad_block"]), raw(&["premium_dns", "ad_block_settings", "enabled"])],
            },
        ),
        (
            "auto_update",
            Field {
                name: "auto_update",
                rules: &[raw(&["updates", "auto_update_enabled"]), raw(&["auto_update"])],
            },
        ),
    ];
}

pub mod eero {
    use super::*;

    pub const SERIAL: Field = Field {
        name: "serial",
        rules: &[raw(&["serial"])],
    };
    pub const LOCATION: Field = Field {
        name: "location",
        rules: &[raw(&["location"]), raw(&["location", "name"])],
    };
    pub const MODEL: Field = Field {
        name: "model",
        rules: &[raw(&["model"])],
    };
    pub const MODEL_NUMBER: Field = Field {
        name: "model_number",
        rules: &[raw(&["model_number"])],
    };
    pub const MAC: Field = Field {
        name: "mac_address",
        rules: &[raw(&["mac_address"]), raw(&["mac"])],
    };
    pub const IP: Field = Field {
        name: "ip_address",
        rules: &[raw(&["ip_address"]), raw(&["ip"])],
    };
    pub const STATUS: Field = Field {
        name: "status",
        rules: &[status(&["status"]), status(&["state"])],
    };
    pub const GATEWAY: Field = Field {
        name: "gateway",
        rules: &[raw(&["gateway"]), raw(&["is_gateway"])],
    };
    pub const CLIENTS: Field = Field {
        name: "connected_clients",
        rules: &[raw(&["connected_clients_count"]), len(&["connected_clients"])],
    };
    pub const WIRED_CLIENTS: Field = Field {
        name: "connected_wired_clients",
        rules: &[raw(&["connected_wired_clients_count"])],
    };
    pub const WIRELESS_CLIENTS: Field = Field {
        name: "connected_wireless_clients",
        rules: &[raw(&["connected_wireless_clients_count"])],
    };
    pub const MESH_QUALITY: Field = Field {
        name: "mesh_quality_bars",
        rules: &[raw(&["mesh_quality_bars"]), raw(&["mesh_quality"])],
    };
    pub const UPTIME: Field = Field {
        name: "uptime",
        rules: &[raw(&["uptime"]), raw(&["uptime_seconds"])],
    };
    pub const FIRMWARE: Field = Field {
        name: "os_version",
        rules: &[raw(&["os_version"]), raw(&["os"]), raw(&["firmware_version"])],
    };
    pub const UPDATE_AVAILABLE: Field = Field {
        name: "update_available",
        rules: &[raw(&["update_available"]), raw(&["update_status", "update_available"])],
    };
    pub const LED_ON: Field = Field {
        name: "led_on",
        rules: &[raw(&["led_on"])],
    };
    pub const LED_BRIGHTNESS: Field = Field {
        name: "led_brightness",
        rules: &[raw(&["led_brightness"])],
    };
    pub const HEARTBEAT: Field = Field {
        name: "heartbeat_ok",
        rules: &[raw(&["heartbeat_ok"])],
    };
    pub const WIRED: Field = Field {
        name: "wired",
        rules: &[raw(&["wired"])],
    };
    pub const CPU: Field = Field {
        name: "cpu_usage",
        rules: &[raw(&["cpu_usage"]), raw(&["resources", "cpu"])],
    };
    pub const MEMORY: Field = Field {
        name: "memory_usage",
        rules: &[raw(&["memory_usage"]), raw(&["resources", "memory"])],
    };
    pub const TEMPERATURE: Field = Field {
        name: "temperature",
        rules: &[raw(&["temperature"]), raw(&["resources", "temperature"])],
    };
    pub const PORTS: Field = Field {
        name: "ethernet_ports",
        rules: &[raw(&["ethernet_status", "statuses"]), raw(&["ethernet_status"]), raw(&["ports"])],
    };
    pub const NIGHTLIGHT: Field = Field {
        name: "nightlight",
        rules: &[raw(&["nightlight"])],
    };

    pub mod port {
        use super::*;

        pub const NAME: Field = Field {
            name: "port_name",
            rules: &[raw(&["port_name"]), raw(&["name"]), raw(&["interface_number"])],
        };
        pub const CARRIER: Field = Field {
            name: "has_carrier",
            rules: &[raw(&["has_carrier"]), raw(&["carrier"])],
        };
        pub const SPEED: Field = Field {
            name: "speed",
            rules: &[raw(&["speed"]), raw(&["link_speed"])],
        };
        pub const IS_WAN: Field = Field {
            name: "is_wan_port",
            rules: &[raw(&["is_wan_port"]), raw(&["wan"])],
        };
        pub const POWER_SAVING: Field = Field {
            name: "power_saving",
            rules: &[raw(&["power_saving"])],
        };
    }

    pub mod nightlight {
        use super::*;

        pub const ENABLED: Field = Field {
            name: "enabled",
            rules: &[raw(&["enabled"])],
        };
        pub const BRIGHTNESS: Field = Field {
            name: "brightness",
            rules: &[raw(&["brightness_percentage"]), raw(&["brightness"])],
        };
        pub const AMBIENT: Field = Field {
            name: "ambient_light_enabled",
            rules: &[raw(&["ambient_light_enabled"])],
        };
        pub const SCHEDULE: Field = Field {
            name: "schedule",
            rules: &[raw(&["schedule", "enabled"]), raw(&["schedule_enabled"])],
        };
    }
}

pub mod device {
    use super::*;

    pub const MAC: Field = Field {
        name: "mac",
        rules: &[raw(&["mac"]), raw(&["eui64"])],
    };
    /// Display name; callers fall back to the MAC
    pub const NAME: Field = Field {
        name: "name",
        rules: &[raw(&["display_name"]), raw(&["nickname"]), raw(&["hostname"])],
    };
    pub const MANUFACTURER: Field = Field {
        name: "manufacturer",
        rules: &[raw(&["manufacturer"])],
    };
    pub const IP: Field = Field {
        name: "ip",
        rules: &[raw(&["ip"]), raw(&["ipv4"])],
    };
    pub const HOSTNAME: Field = Field {
        name: "hostname",
        rules: &[raw(&["hostname"])],
    };
    pub const DEVICE_TYPE: Field = Field {
        name: "device_type",
        rules: &[raw(&["device_type"]), raw(&["type"])],
    };
    pub const SOURCE_LOCATION: Field = Field {
        name: "source_location",
        rules: &[raw(&["source", "location"]), raw(&["source", "location", "name"])],
    };
    pub const CONNECTED: Field = Field {
        name: "connected",
        rules: &[raw(&["connected"])],
    };
    pub const WIRELESS: Field = Field {
        name: "wireless",
        rules: &[raw(&["wireless"])],
    };
    pub const BLOCKED: Field = Field {
        name: "blocked",
        rules: &[raw(&["blacklisted"]), raw(&["blocked"])],
    };
    pub const PAUSED: Field = Field {
        name: "paused",
        rules: &[raw(&["paused"])],
    };
    pub const GUEST: Field = Field {
        name: "is_guest",
        rules: &[raw(&["is_guest"])],
    };
    pub const PRIVATE: Field = Field {
        name: "is_private",
        rules: &[raw(&["is_private"])],
    };
    pub const PRIORITIZED: Field = Field {
        name: "prioritized",
        rules: &[raw(&["prioritized"]), raw(&["is_prioritized"])],
    };
    pub const CONNECTIVITY: Field = Field {
        name: "connectivity",
        rules: &[raw(&["connectivity"])],
    };
    pub const CHANNEL: Field = Field {
        name: "channel",
        rules: &[raw(&["channel"]), raw(&["connectivity", "channel"])],
    };
    pub const USAGE_UP: Field = Field {
        name: "usage_up",
        rules: &[raw(&["usage", "up"]), raw(&["usage", "upload"]), raw(&["upload_bytes"])],
    };
    pub const USAGE_DOWN: Field = Field {
        name: "usage_down",
        rules: &[raw(&["usage", "down"]), raw(&["usage", "download"]), raw(&["download_bytes"])],
    };
    pub const LAST_ACTIVE: Field = Field {
        name: "last_active",
        rules: &[raw(&["last_active"])],
    };
    pub const FIRST_SEEN: Field = Field {
        name: "first_seen",
        rules: &[raw(&["first_active"]), raw(&["first_seen"])],
    };

    /// Fields inside `connectivity`
    pub mod link {
        use super::*;

        pub const SIGNAL: Field = Field {
            name: "signal",
            rules: &[raw(&["signal"])],
        };
        pub const SIGNAL_AVG: Field = Field {
            name: "signal_avg",
            rules: &[raw(&["signal_avg"])],
        };
        pub const SCORE: Field = Field {
            name: "score",
            rules: &[raw(&["score"])],
        };
        pub const SCORE_BARS: Field = Field {
            name: "score_bars",
            rules: &[raw(&["score_bars"])],
        };
        pub const FREQUENCY: Field = Field {
            name: "frequency",
            rules: &[raw(&["frequency"]), raw(&["rx_rate_info", "frequency"])],
        };
        pub const GENERATION: Field = Field {
            name: "wifi_generation",
            rules: &[raw(&["wifi_generation"]), raw(&["generation"]), raw(&["wifi_standard"])],
        };
        pub const PHY_MODE: Field = Field {
            name: "phy_mode",
            rules: &[
                raw(&["rx_rate_info", "phy_type"]),
                raw(&["tx_rate_info", "phy_type"]),
                raw(&["phy_mode"]),
                raw(&["phy_type"]),
            ],
        };
        pub const RX_BITRATE: Field = Field {
            name: "rx_bitrate",
            rules: &[raw(&["rx_bitrate"]), raw(&["rx_rate_info", "bitrate"])],
        };
        pub const TX_BITRATE: Field = Field {
            name: "tx_bitrate",
            rules: &[raw(&["tx_bitrate"]), raw(&["tx_rate_info", "bitrate"])],
        };
        pub const RX_MCS: Field = Field {
            name: "rx_mcs",
            rules: &[raw(&["rx_rate_info", "mcs"])],
        };
        pub const TX_MCS: Field = Field {
            name: "tx_mcs",
            rules: &[raw(&["tx_rate_info", "mcs"])],
        };
        pub const RX_NSS: Field = Field {
            name: "rx_nss",
            rules: &[raw(&["rx_rate_info", "nss"])],
        };
        pub const TX_NSS: Field = Field {
            name: "tx_nss",
            rules: &[raw(&["tx_rate_info", "nss"])],
        };
        pub const RX_WIDTH: Field = Field {
            name: "rx_channel_width",
            rules: &[raw(&["rx_rate_info", "channel_width"])],
        };
        pub const TX_WIDTH: Field = Field {
            name: "tx_channel_width",
            rules: &[raw(&["tx_rate_info", "channel_width"])],
        };
    }
}

pub mod profile {
    use super::*;

    pub const NAME: Field = Field {
        name: "name",
        rules: &[raw(&["name"])],
    };
    pub const PAUSED: Field = Field {
        name: "paused",
        rules: &[raw(&["paused"])],
    };
    pub const DEVICES: Field = Field {
        name: "devices",
        rules: &[len(&["devices"]), raw(&["device_count"])],
    };
}

/// Optional and premium feature payloads
pub mod feature {
    use super::*;

    pub const SQM_UPLOAD: Field = Field {
        name: "sqm_upload",
        rules: &[raw(&["upload_bandwidth"]), raw(&["upload", "bandwidth"])],
    };
    pub const SQM_DOWNLOAD: Field = Field {
        name: "sqm_download",
        rules: &[raw(&["download_bandwidth"]), raw(&["download", "bandwidth"])],
    };
    pub const ENABLED: Field = Field {
        name: "enabled",
        rules: &[raw(&["enabled"]), raw(&["is_enabled"])],
    };
    pub const PREMIUM: Field = Field {
        name: "premium",
        rules: &[
            raw(&["is_premium"]),
            raw(&["premium"]),
            raw(&["status"]),
            raw(&["premium_status"]),
        ],
    };
    pub const BACKUP_IN_USE: Field = Field {
        name: "backup_in_use",
        rules: &[raw(&["using_backup"]), raw(&["in_use"]), raw(&["is_using_backup"])],
    };
    pub const UPLOAD_BYTES: Field = Field {
        name: "upload",
        rules: &[raw(&["upload"]), raw(&["up"]), raw(&["upload_bytes"])],
    };
    pub const DOWNLOAD_BYTES: Field = Field {
        name: "download",
        rules: &[raw(&["download"]), raw(&["down"]), raw(&["download_bytes"])],
    };
    pub const CATEGORY: Field = Field {
        name: "category",
        rules: &[raw(&["category"]), raw(&["name"])],
    };
    pub const BYTES: Field = Field {
        name: "bytes",
        rules: &[raw(&["bytes"]), raw(&["usage"]), raw(&["total"])],
    };
    pub const THREAD_DEVICES: Field = Field {
        name: "thread_devices",
        rules: &[len(&["devices"]), raw(&["device_count"])],
    };
    pub const THREAD_BORDER_ROUTERS: Field = Field {
        name: "thread_border_routers",
        rules: &[len(&["border_routers"]), raw(&["border_router_count"])],
    };
    pub const LATENCY_SAMPLES: Field = Field {
        name: "latency",
        rules: &[raw(&["latency"]), raw(&["results"]), raw(&["tests"])],
    };
    pub const LATENCY_TARGET: Field = Field {
        name: "target",
        rules: &[raw(&["target"]), raw(&["host"]), raw(&["name"])],
    };
    pub const LATENCY_VALUE: Field = Field {
        name: "latency_ms",
        rules: &[raw(&["latency_ms"]), raw(&["latency"]), raw(&["value"])],
    };
    pub const LAST_RUN: Field = Field {
        name: "last_run",
        rules: &[raw(&["last_run"]), raw(&["completed"]), raw(&["date"])],
    };
    pub const ISSUES: Field = Field {
        name: "issues",
        rules: &[len(&["issues"]), raw(&["issue_count"]), raw(&["issues_count"])],
    };
    pub const RECOMMENDATIONS: Field = Field {
        name: "recommendations",
        rules: &[len(&["recommendations"]), raw(&["recommendation_count"])],
    };
}
