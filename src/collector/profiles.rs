//! Profile series

use tracing::debug;

use crate::{
    metrics::{ExporterMetrics, set_flag, set_opt},
    upstream::{
        Entity,
        fields::{entity_id, profile as field},
    },
};

use super::display_name;

pub(super) fn record(metrics: &ExporterMetrics, network_id: &str, profiles: &[Entity]) {
    let m = &metrics.profile;
    let mut exported = 0usize;

    for profile in profiles {
        let Some(profile_id) = entity_id(profile) else {
            debug!("dropping profile without a usable id");
            continue;
        };
        exported += 1;

        let name = display_name(profile, field::NAME, None);
        let labels = [network_id, profile_id.as_str(), name.as_str()];

        set_flag(&m.paused, &labels, field::PAUSED.boolean(profile));
        set_opt(&m.devices, &labels, field::DEVICES.number(profile));
    }

    metrics
        .network
        .profiles
        .with_label_values(&[network_id])
        .set(exported as f64);
}
