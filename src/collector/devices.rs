//! Client device series

use tracing::debug;

use crate::{
    metrics::{ExporterMetrics, set_flag, set_opt},
    upstream::{
        Entity,
        fields::{
            UNKNOWN,
            device::{self as field, link},
            entity_id,
        },
    },
};

use super::{
    display_name,
    parse::{self, Band},
};

pub(super) fn record(metrics: &ExporterMetrics, network_id: &str, devices: &[Entity]) {
    let m = &metrics.device;
    let (mut total, mut connected, mut wireless) = (0usize, 0usize, 0usize);

    for device in devices {
        let Some(device_id) = entity_id(device) else {
            debug!("dropping device without a usable id");
            continue;
        };
        total += 1;

        let mac = field::MAC.string(device);
        let name = display_name(device, field::NAME, mac.clone());
        let labels = [network_id, device_id.as_str(), name.as_str()];

        m.info.set(&[
            network_id,
            &device_id,
            &name,
            mac.as_deref().unwrap_or(UNKNOWN),
            &field::MANUFACTURER.string_or_unknown(device),
            &field::IP.string_or_unknown(device),
            &field::HOSTNAME.string_or_unknown(device),
            &field::DEVICE_TYPE.string_or_unknown(device),
            &field::SOURCE_LOCATION.string_or_unknown(device),
        ]);

        let is_connected = field::CONNECTED.boolean(device);
        let is_wireless = field::WIRELESS.boolean(device);
        connected += usize::from(is_connected == Some(true));
        wireless += usize::from(is_connected == Some(true) && is_wireless == Some(true));

        set_flag(&m.connected, &labels, is_connected);
        set_flag(&m.wireless, &labels, is_wireless);

        for (state, flag) in [
            ("blocked", field::BLOCKED),
            ("paused", field::PAUSED),
            ("guest", field::GUEST),
            ("private", field::PRIVATE),
            ("prioritized", field::PRIORITIZED),
        ] {
            set_flag(
                &m.state,
                &[network_id, &device_id, &name, state],
                flag.boolean(device),
            );
        }

        record_link(metrics, &labels, device);

        for (direction, usage) in [("up", field::USAGE_UP), ("down", field::USAGE_DOWN)] {
            set_opt(
                &m.usage_bytes,
                &[network_id, &device_id, &name, direction],
                usage.number(device),
            );
        }

        set_opt(
            &m.last_active,
            &labels,
            field::LAST_ACTIVE
                .value(device)
                .and_then(|v| parse::timestamp_seconds(&v)),
        );
        set_opt(
            &m.first_seen,
            &labels,
            field::FIRST_SEEN
                .value(device)
                .and_then(|v| parse::timestamp_seconds(&v)),
        );
    }

    let counts = &metrics.network.devices;
    counts.with_label_values(&[network_id, "total"]).set(total as f64);
    counts.with_label_values(&[network_id, "connected"]).set(connected as f64);
    counts.with_label_values(&[network_id, "wireless"]).set(wireless as f64);
}

/// Wireless link detail from the `connectivity` sub-object
fn record_link(metrics: &ExporterMetrics, labels: &[&str; 3], device: &Entity) {
    let m = &metrics.device;
    let Some(conn) = field::CONNECTIVITY.entity(device) else {
        return;
    };
    let [network_id, device_id, name] = *labels;

    set_opt(
        &m.signal_dbm,
        labels,
        link::SIGNAL.value(&conn).and_then(|v| parse::signal_dbm(&v)),
    );
    set_opt(
        &m.signal_avg_dbm,
        labels,
        link::SIGNAL_AVG.value(&conn).and_then(|v| parse::signal_dbm(&v)),
    );
    set_opt(&m.score, labels, link::SCORE.number(&conn));
    set_opt(&m.score_bars, labels, link::SCORE_BARS.number(&conn));
    set_opt(
        &m.channel,
        labels,
        field::CHANNEL.number(device).or_else(|| field::CHANNEL.number(&conn)),
    );

    let frequency = link::FREQUENCY
        .value(&conn)
        .and_then(|v| parse::frequency_mhz(&v));
    set_opt(&m.frequency_mhz, labels, frequency);

    let band = frequency.and_then(Band::from_mhz);
    if let Some(band) = band {
        m.wifi_band.set(&[network_id, device_id, name, band.label()]);
    }

    let generation = parse::wifi_generation(
        link::GENERATION.value(&conn).as_ref(),
        band,
        link::PHY_MODE.string(&conn).as_deref(),
    );
    set_opt(&m.wifi_generation, labels, generation.map(f64::from));

    let directions = [
        ("rx", link::RX_BITRATE, link::RX_MCS, link::RX_NSS, link::RX_WIDTH),
        ("tx", link::TX_BITRATE, link::TX_MCS, link::TX_NSS, link::TX_WIDTH),
    ];
    for (direction, bitrate, mcs, nss, width) in directions {
        let labels = [network_id, device_id, name, direction];

        set_opt(
            &m.bitrate_mbps,
            &labels,
            bitrate.value(&conn).and_then(|v| parse::bitrate_mbps(&v)),
        );
        set_opt(&m.mcs, &labels, mcs.number(&conn));
        set_opt(&m.nss, &labels, nss.number(&conn));
        set_opt(
            &m.channel_width_mhz,
            &labels,
            width.value(&conn).and_then(|v| parse::channel_width_mhz(&v)),
        );
    }
}
