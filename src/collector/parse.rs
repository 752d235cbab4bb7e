//! Parsers for decorated upstream values
//!
//! Radio and link figures arrive either as numbers or as strings with a unit
//! suffix (`"-63 dBm"`, `"866.7 MBit/s"`, `"1G"`, `"WIDTH_80"`). Each unit
//! family has one parser here. Anything that does not parse yields `None`,
//! never a default of zero.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDateTime};
use regex::Regex;
use serde_json::Value;

static QUANTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([-+]?(?:\d+(?:\.\d*)?|\.\d+))\s*([A-Za-z/]*)\s*$").expect("valid regex")
});

static DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").expect("valid regex"));

/// Split `"-63 dBm"` into `(-63.0, "dbm")`; the unit is lowercased
fn quantity(value: &Value) -> Option<(f64, String)> {
    let parsed = match value {
        Value::Number(n) => n.as_f64().map(|n| (n, String::new())),
        Value::String(s) => {
            let caps = QUANTITY.captures(s)?;
            let number = caps[1].parse::<f64>().ok()?;
            Some((number, caps[2].to_ascii_lowercase()))
        }
        _ => None,
    };
    parsed.filter(|(n, _)| n.is_finite())
}

/// Signal strength in dBm
pub fn signal_dbm(value: &Value) -> Option<f64> {
    match quantity(value)? {
        (n, unit) if unit.is_empty() || unit == "dbm" => Some(n),
        _ => None,
    }
}

/// Bit rate or link speed in Mbps (`"1G"` and `"1 GBPS"` are 1000)
pub fn bitrate_mbps(value: &Value) -> Option<f64> {
    let (n, unit) = quantity(value)?;
    let scale = match unit.as_str() {
        "" | "m" | "mb" | "mbps" | "mbit" | "mbit/s" | "mb/s" => 1.0,
        "g" | "gb" | "gbps" | "gbit" | "gbit/s" | "gb/s" => 1000.0,
        "k" | "kb" | "kbps" | "kbit" | "kbit/s" | "kb/s" => 0.001,
        "bps" | "bit/s" | "b/s" => 0.000_001,
        _ => return None,
    };
    Some(n * scale)
}

/// Wi-Fi channel width in MHz from `"WIDTH_80"`, `"80MHz"` or `80`
pub fn channel_width_mhz(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|n| *n > 0.0),
        Value::String(s) => DIGITS
            .find(s)
            .and_then(|m| m.as_str().parse::<f64>().ok())
            .filter(|n| *n > 0.0),
        _ => None,
    }
}

/// Latency in milliseconds; bare numbers are already milliseconds
pub fn latency_ms(value: &Value) -> Option<f64> {
    let (n, unit) = quantity(value)?;
    let scale = match unit.as_str() {
        "" | "ms" => 1.0,
        "s" | "sec" => 1000.0,
        "us" => 0.001,
        _ => return None,
    };
    Some(n * scale)
}

/// Radio frequency in MHz; values below 100 are taken as GHz
pub fn frequency_mhz(value: &Value) -> Option<f64> {
    let (n, unit) = quantity(value)?;
    let mhz = match unit.as_str() {
        "ghz" => n * 1000.0,
        "" | "mhz" if n < 100.0 => n * 1000.0,
        "" | "mhz" => n,
        _ => return None,
    };
    (mhz > 0.0).then_some(mhz)
}

/// Epoch seconds from an RFC 3339 string, a naive UTC timestamp or a number
///
/// Numbers above 10^12 are taken as milliseconds.
pub fn timestamp_seconds(value: &Value) -> Option<f64> {
    let seconds = match value {
        Value::Number(n) => n.as_f64().map(epoch_seconds),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<f64>()
                .ok()
                .map(epoch_seconds)
                .or_else(|| {
                    DateTime::parse_from_rfc3339(s)
                        .ok()
                        .map(|dt| dt.timestamp_millis() as f64 / 1000.0)
                })
                .or_else(|| {
                    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
                        .ok()
                        .map(|dt| dt.and_utc().timestamp_millis() as f64 / 1000.0)
                })
        }
        _ => None,
    };
    seconds.filter(|t| t.is_finite() && *t > 0.0)
}

fn epoch_seconds(n: f64) -> f64 {
    if n > 1e12 { n / 1000.0 } else { n }
}

/// Wi-Fi frequency band
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Band {
    Ghz2_4,
    Ghz5,
    Ghz6,
}

impl Band {
    pub fn from_mhz(mhz: f64) -> Option<Band> {
        match mhz {
            f if (2400.0..=2500.0).contains(&f) => Some(Band::Ghz2_4),
            f if (4900.0..5925.0).contains(&f) => Some(Band::Ghz5),
            f if (5925.0..=7125.0).contains(&f) => Some(Band::Ghz6),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Band::Ghz2_4 => "2.4GHz",
            Band::Ghz5 => "5GHz",
            Band::Ghz6 => "6GHz",
        }
    }
}

/// PHY keyword groups, checked in order; first match wins
const PHY_GENERATIONS: &[(&[&str], u8)] = &[
    (&["EHT", "BE"], 7),
    (&["HE", "AX"], 6),
    (&["VHT", "AC"], 5),
    (&["HT", "N"], 4),
];

/// Wi-Fi generation of a client link
///
/// An explicit generation wins. Otherwise a 6 GHz link is Wi-Fi 6, and last
/// the PHY mode is matched against [`PHY_GENERATIONS`].
pub fn wifi_generation(
    explicit: Option<&Value>,
    band: Option<Band>,
    phy: Option<&str>,
) -> Option<u8> {
    if let Some(generation) = explicit.and_then(explicit_generation) {
        return Some(generation);
    }
    if band == Some(Band::Ghz6) {
        return Some(6);
    }

    let tokens: Vec<String> = phy?
        .split(|c: char| !c.is_ascii_alphanumeric())
        .map(|token| token.trim_matches(|c: char| c.is_ascii_digit()).to_ascii_uppercase())
        .filter(|token| !token.is_empty())
        .collect();

    PHY_GENERATIONS
        .iter()
        .find(|(keywords, _)| tokens.iter().any(|t| keywords.contains(&t.as_str())))
        .map(|(_, generation)| *generation)
}

fn explicit_generation(value: &Value) -> Option<u8> {
    let generation = match value {
        Value::Number(n) => n.as_u64().and_then(|n| u8::try_from(n).ok())?,
        Value::String(s) => {
            let compact: String = s
                .chars()
                .filter(|c| c.is_ascii_alphanumeric() || *c == '.')
                .collect::<String>()
                .to_ascii_lowercase();

            if let Some(rest) = compact.strip_prefix("wifi") {
                DIGITS.find(rest)?.as_str().parse().ok()?
            } else if let Some(suffix) = compact.strip_prefix("802.11") {
                match suffix {
                    "be" => 7,
                    "ax" => 6,
                    "ac" => 5,
                    "n" => 4,
                    _ => return None,
                }
            } else {
                compact.parse().ok()?
            }
        }
        _ => return None,
    };

    (4..=7).contains(&generation).then_some(generation)
}
