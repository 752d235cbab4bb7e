//! Network-level series

use crate::{
    metrics::{ExporterMetrics, set_flag, set_opt},
    upstream::{
        Entity,
        fields::{self, network as field},
    },
};

use super::parse;

pub(super) fn record(metrics: &ExporterMetrics, network_id: &str, network: &Entity) {
    let m = &metrics.network;

    m.info.set(&[
        network_id,
        &field::NAME.string_or_unknown(network),
        &field::ISP.string_or_unknown(network),
        &field::WAN_TYPE.string_or_unknown(network),
        &field::PUBLIC_IP.string_or_unknown(network),
        &field::GATEWAY_IP.string_or_unknown(network),
    ]);

    set_flag(
        &m.status,
        &[network_id],
        field::STATUS.string(network).map(|s| fields::is_online(&s)),
    );

    for (source, health) in [
        ("internet", field::HEALTH_INTERNET),
        ("eero_network", field::HEALTH_EERO_NETWORK),
    ] {
        set_flag(
            &m.health,
            &[network_id, source],
            health.string(network).map(|s| fields::is_online(&s)),
        );
    }

    for (feature, flag) in field::FEATURES {
        set_flag(&m.feature_enabled, &[network_id, feature], flag.boolean(network));
    }

    for (direction, speed) in [("up", field::SPEED_UP), ("down", field::SPEED_DOWN)] {
        set_opt(
            &m.speed_mbps,
            &[network_id, direction],
            speed.value(network).and_then(|v| parse::bitrate_mbps(&v)),
        );
    }
    set_opt(
        &m.speed_test_timestamp,
        &[network_id],
        field::SPEED_DATE
            .value(network)
            .and_then(|v| parse::timestamp_seconds(&v)),
    );
}
