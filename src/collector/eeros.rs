//! Mesh node series, including Ethernet ports and the nightlight

use tracing::debug;

use crate::{
    metrics::{ExporterMetrics, set_flag, set_opt},
    upstream::{
        Entity,
        fields::{self, eero as field, entity_id},
    },
};

use super::parse;

pub(super) fn record(
    metrics: &ExporterMetrics,
    network_id: &str,
    eeros: &[Entity],
    ethernet: bool,
) {
    let m = &metrics.eero;
    let mut exported = 0usize;

    for eero in eeros {
        let Some(eero_id) = entity_id(eero) else {
            debug!("dropping eero without a usable id");
            continue;
        };
        exported += 1;

        let location = field::LOCATION.string_or_unknown(eero);
        let labels = [network_id, eero_id.as_str(), location.as_str()];

        m.info.set(&[
            network_id,
            &eero_id,
            &field::SERIAL.string_or_unknown(eero),
            &location,
            &field::MODEL.string_or_unknown(eero),
            &field::MODEL_NUMBER.string_or_unknown(eero),
            &field::MAC.string_or_unknown(eero),
            &field::IP.string_or_unknown(eero),
            &field::FIRMWARE.string_or_unknown(eero),
        ]);

        set_flag(
            &m.status,
            &labels,
            field::STATUS.string(eero).map(|s| fields::is_online(&s)),
        );
        set_flag(&m.gateway, &labels, field::GATEWAY.boolean(eero));

        for (kind, clients) in [
            ("total", field::CLIENTS),
            ("wired", field::WIRED_CLIENTS),
            ("wireless", field::WIRELESS_CLIENTS),
        ] {
            set_opt(
                &m.connected_clients,
                &[network_id, &eero_id, &location, kind],
                clients.number(eero),
            );
        }

        set_opt(&m.mesh_quality_bars, &labels, field::MESH_QUALITY.number(eero));
        set_opt(&m.uptime_seconds, &labels, field::UPTIME.number(eero));
        set_flag(&m.update_available, &labels, field::UPDATE_AVAILABLE.boolean(eero));
        set_flag(&m.led_on, &labels, field::LED_ON.boolean(eero));
        set_opt(&m.led_brightness, &labels, field::LED_BRIGHTNESS.number(eero));
        set_flag(&m.heartbeat_ok, &labels, field::HEARTBEAT.boolean(eero));
        set_flag(&m.wired_backhaul, &labels, field::WIRED.boolean(eero));
        set_opt(&m.cpu_usage, &labels, field::CPU.number(eero));
        set_opt(&m.memory_usage, &labels, field::MEMORY.number(eero));
        set_opt(&m.temperature, &labels, field::TEMPERATURE.number(eero));

        if ethernet {
            record_ports(metrics, &labels, eero);
        }

        if let Some(nightlight) = field::NIGHTLIGHT.entity(eero) {
            use fields::eero::nightlight as light;

            set_flag(&m.nightlight_enabled, &labels, light::ENABLED.boolean(&nightlight));
            set_opt(&m.nightlight_brightness, &labels, light::BRIGHTNESS.number(&nightlight));
            set_flag(&m.nightlight_ambient, &labels, light::AMBIENT.boolean(&nightlight));
            set_flag(&m.nightlight_schedule, &labels, light::SCHEDULE.boolean(&nightlight));
        }
    }

    metrics
        .network
        .eeros
        .with_label_values(&[network_id])
        .set(exported as f64);
}

fn record_ports(metrics: &ExporterMetrics, eero_labels: &[&str; 3], eero: &Entity) {
    use fields::eero::port;

    let m = &metrics.eero;
    let Some(ports) = field::PORTS.list(eero) else {
        return;
    };

    for (index, entry) in ports.iter().enumerate() {
        let name = port::NAME
            .string(entry)
            .unwrap_or_else(|| (index + 1).to_string());
        let [network_id, eero_id, location] = *eero_labels;
        let labels = [network_id, eero_id, location, name.as_str()];

        set_flag(&m.port_carrier, &labels, port::CARRIER.boolean(entry));
        set_opt(
            &m.port_speed_mbps,
            &labels,
            port::SPEED.value(entry).and_then(|v| parse::bitrate_mbps(&v)),
        );
        set_flag(&m.port_wan, &labels, port::IS_WAN.boolean(entry));
        set_flag(&m.port_power_saving, &labels, port::POWER_SAVING.boolean(entry));
    }
}
