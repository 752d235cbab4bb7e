//! Optional and premium feature passes
//!
//! Each pass here is switched by its `[features]` flag. The activity and
//! backup passes additionally need an active subscription, which is checked
//! once per network; when the check itself fails they are skipped for this
//! cycle.

use tracing::debug;

use crate::{
    metrics::{FeatureMetrics, set_flag, set_opt},
    upstream::{
        Entity, Resource,
        fields::{device, entity_id, feature as field, network as network_field},
    },
};

use super::{Collector, CycleError, CycleReport, display_name, parse};

pub(super) async fn collect(
    collector: &Collector,
    network_id: &str,
    network: &Entity,
    report: &mut CycleReport,
) -> Result<(), CycleError> {
    let enabled = &collector.features;
    let fetch = &collector.fetchers;
    let m = &collector.metrics.features;

    if enabled.sqm {
        collector
            .run_pass(Resource::Sqm, report, fetch.sqm(network_id), |sqm| {
                record_sqm(m, network_id, &sqm)
            })
            .await?;
    }

    if enabled.thread {
        collector
            .run_pass(Resource::Thread, report, fetch.thread(network_id), |thread| {
                record_thread(m, network_id, &thread)
            })
            .await?;
    }

    if enabled.port_forwards {
        collector
            .run_pass(
                Resource::PortForwards,
                report,
                fetch.port_forwards(network_id),
                |forwards| record_port_forwards(m, network_id, &forwards),
            )
            .await?;
    }

    if enabled.reservations {
        collector
            .run_pass(
                Resource::Reservations,
                report,
                fetch.reservations(network_id),
                |reservations| {
                    m.reservations
                        .with_label_values(&[network_id])
                        .set(reservations.len() as f64)
                },
            )
            .await?;
    }

    if enabled.blacklist {
        collector
            .run_pass(
                Resource::Blacklist,
                report,
                fetch.blacklist(network_id),
                |blocked| {
                    m.blacklisted
                        .with_label_values(&[network_id])
                        .set(blocked.len() as f64)
                },
            )
            .await?;
    }

    if enabled.diagnostics {
        collector
            .run_pass(
                Resource::Diagnostics,
                report,
                fetch.diagnostics(network_id),
                |diagnostics| record_diagnostics(m, network_id, &diagnostics),
            )
            .await?;
    }

    if enabled.insights {
        collector
            .run_pass(Resource::Insights, report, fetch.insights(network_id), |insights| {
                record_insights(m, network_id, &insights)
            })
            .await?;
    }

    if enabled.premium {
        collect_premium(collector, network_id, network, report).await?;
    }

    Ok(())
}

async fn collect_premium(
    collector: &Collector,
    network_id: &str,
    network: &Entity,
    report: &mut CycleReport,
) -> Result<(), CycleError> {
    let fetch = &collector.fetchers;
    let m = &collector.metrics.features;

    let mut reported = None;
    let checked = collector
        .run_pass(
            Resource::PremiumStatus,
            report,
            fetch.premium_status(network_id),
            |status| reported = field::PREMIUM.boolean(&status),
        )
        .await?;
    if !checked {
        debug!("premium check failed, skipping premium passes");
        return Ok(());
    }

    let premium = reported.or_else(|| network_premium_flag(network));
    set_flag(&m.premium_active, &[network_id], premium);
    if premium != Some(true) {
        debug!("no active subscription, skipping premium passes");
        return Ok(());
    }

    collector
        .run_pass(Resource::Activity, report, fetch.activity(network_id), |activity| {
            record_activity(m, network_id, &activity)
        })
        .await?;

    collector
        .run_pass(
            Resource::ActivityCategories,
            report,
            fetch.activity_categories(network_id),
            |categories| record_activity_categories(m, network_id, &categories),
        )
        .await?;

    collector
        .run_pass(
            Resource::ActivityClients,
            report,
            fetch.activity_clients(network_id),
            |clients| record_activity_clients(m, network_id, &clients),
        )
        .await?;

    collector
        .run_pass(
            Resource::BackupNetwork,
            report,
            fetch.backup_network(network_id),
            |backup| set_flag(&m.backup_enabled, &[network_id], field::ENABLED.boolean(&backup)),
        )
        .await?;

    collector
        .run_pass(
            Resource::BackupStatus,
            report,
            fetch.backup_status(network_id),
            |status| {
                set_flag(
                    &m.backup_in_use,
                    &[network_id],
                    field::BACKUP_IN_USE.boolean(&status),
                )
            },
        )
        .await?;

    Ok(())
}

fn network_premium_flag(network: &Entity) -> Option<bool> {
    network_field::FEATURES
        .iter()
        .find(|(name, _)| *name == "premium")
        .and_then(|(_, flag)| flag.boolean(network))
}

fn record_sqm(m: &FeatureMetrics, network_id: &str, sqm: &Entity) {
    set_flag(&m.sqm_enabled, &[network_id], field::ENABLED.boolean(sqm));

    for (direction, bandwidth) in [("up", field::SQM_UPLOAD), ("down", field::SQM_DOWNLOAD)] {
        set_opt(
            &m.sqm_bandwidth_mbps,
            &[network_id, direction],
            bandwidth.value(sqm).and_then(|v| parse::bitrate_mbps(&v)),
        );
    }
}

fn record_thread(m: &FeatureMetrics, network_id: &str, thread: &Entity) {
    set_flag(&m.thread_enabled, &[network_id], field::ENABLED.boolean(thread));
    set_opt(&m.thread_devices, &[network_id], field::THREAD_DEVICES.number(thread));
    set_opt(
        &m.thread_border_routers,
        &[network_id],
        field::THREAD_BORDER_ROUTERS.number(thread),
    );
}

fn record_port_forwards(m: &FeatureMetrics, network_id: &str, forwards: &[Entity]) {
    // rules without an `enabled` field are active
    let enabled = forwards
        .iter()
        .filter(|rule| field::ENABLED.boolean(rule) != Some(false))
        .count();

    m.port_forwards
        .with_label_values(&[network_id])
        .set(forwards.len() as f64);
    m.port_forwards_enabled
        .with_label_values(&[network_id])
        .set(enabled as f64);
}

fn record_diagnostics(m: &FeatureMetrics, network_id: &str, diagnostics: &Entity) {
    let samples: Vec<(String, serde_json::Value)> = match field::LATENCY_SAMPLES.list(diagnostics) {
        Some(rows) => rows
            .iter()
            .filter_map(|row| {
                let target = field::LATENCY_TARGET.string(row)?;
                let value = field::LATENCY_VALUE.value(row)?;
                Some((target, value))
            })
            .collect(),
        // `{"latency": {"google.com": 12.5, ...}}`
        None => field::LATENCY_SAMPLES
            .entity(diagnostics)
            .map(|map| map.into_iter().collect())
            .unwrap_or_default(),
    };

    for (target, value) in samples {
        set_opt(
            &m.latency_ms,
            &[network_id, target.as_str()],
            parse::latency_ms(&value),
        );
    }

    set_opt(
        &m.diagnostics_timestamp,
        &[network_id],
        field::LAST_RUN
            .value(diagnostics)
            .and_then(|v| parse::timestamp_seconds(&v)),
    );
}

fn record_insights(m: &FeatureMetrics, network_id: &str, insights: &Entity) {
    set_opt(
        &m.insights,
        &[network_id, "issues"],
        field::ISSUES.number(insights),
    );
    set_opt(
        &m.insights,
        &[network_id, "recommendations"],
        field::RECOMMENDATIONS.number(insights),
    );
}

fn record_activity(m: &FeatureMetrics, network_id: &str, activity: &Entity) {
    set_opt(
        &m.activity_bytes,
        &[network_id, "up"],
        field::UPLOAD_BYTES.number(activity),
    );
    set_opt(
        &m.activity_bytes,
        &[network_id, "down"],
        field::DOWNLOAD_BYTES.number(activity),
    );
}

fn record_activity_categories(m: &FeatureMetrics, network_id: &str, categories: &[Entity]) {
    for row in categories {
        let Some(category) = field::CATEGORY.string(row) else {
            continue;
        };
        set_opt(
            &m.activity_category_bytes,
            &[network_id, category.as_str()],
            field::BYTES.number(row),
        );
    }
}

fn record_activity_clients(m: &FeatureMetrics, network_id: &str, clients: &[Entity]) {
    for row in clients {
        let Some(device_id) = entity_id(row) else {
            debug!("dropping activity row without a usable id");
            continue;
        };
        let name = display_name(row, device::NAME, device::MAC.string(row));

        for (direction, usage) in [("up", field::UPLOAD_BYTES), ("down", field::DOWNLOAD_BYTES)] {
            set_opt(
                &m.activity_device_bytes,
                &[network_id, device_id.as_str(), name.as_str(), direction],
                usage.number(row),
            );
        }
    }
}
