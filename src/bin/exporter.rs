use std::{path::PathBuf, sync::Arc};

use anyhow::Context;
use clap::Parser;
use eero_exporter::{
    actors::scheduler::SchedulerHandle,
    api::{ApiConfig, ApiState, spawn_api_server},
    collector::Collector,
    config::Config,
    health::HealthState,
    metrics::ExporterMetrics,
    upstream::{Fetchers, HttpUpstream},
};
use tracing::{info, level_filters::LevelFilter, trace, warn};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};

/// Prometheus exporter for eero mesh networks
#[derive(Debug, Clone, Parser)]
#[command(version)]
struct Args {
    /// Config file (default: ~/.config/eero-exporter/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address
    #[arg(long)]
    host: Option<std::net::IpAddr>,

    /// Listen port
    #[arg(short, long)]
    port: Option<u16>,

    /// Seconds between collection cycles
    #[arg(short, long)]
    interval: Option<u64>,

    /// Session file written by the login tool
    #[arg(short, long)]
    session_file: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short, long, default_value = "info")]
    log_level: LevelFilter,

    /// Skip per-device metrics
    #[arg(long)]
    no_devices: bool,

    /// Skip profile metrics
    #[arg(long)]
    no_profiles: bool,
}

impl Args {
    fn apply(&self, config: &mut Config) {
        if let Some(host) = self.host {
            config.server.host = host;
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(interval) = self.interval {
            config.collection.interval_secs = interval;
        }
        if let Some(session_file) = &self.session_file {
            config.upstream.session_file = Some(session_file.clone());
        }
        if self.no_devices {
            config.features.devices = false;
        }
        if self.no_profiles {
            config.features.profiles = false;
        }
    }
}

fn init(level: LevelFilter) {
    let filter = filter::Targets::new().with_targets(vec![
        ("eero_exporter", level),
        ("tower_http", LevelFilter::WARN),
    ]);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .compact()
                .with_ansi(false),
        )
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();
    init(args.log_level);
    trace!("started with args: {args:?}");

    let mut config = Config::load(args.config.as_deref())?;
    config.apply_env();
    args.apply(&mut config);
    config.validate()?;

    let token = config.session_token()?;
    let upstream = HttpUpstream::new(config.upstream.base_url.clone(), token, config.timeout())
        .context("failed to build HTTP client")?;

    let metrics = Arc::new(ExporterMetrics::new().context("failed to register metrics")?);
    let health = Arc::new(HealthState::new());

    let collector = Collector::new(
        Fetchers::new(Arc::new(upstream)),
        metrics.clone(),
        config.features.clone(),
        config.collection.network_concurrency,
    );

    let addr = spawn_api_server(
        ApiConfig {
            bind_addr: config.bind_addr(),
        },
        ApiState::new(metrics.clone(), health.clone()),
    )
    .await
    .with_context(|| format!("failed to bind {}", config.bind_addr()))?;

    info!(
        "eero exporter v{} serving http://{addr}/metrics, collecting every {}s",
        env!("CARGO_PKG_VERSION"),
        config.collection.interval_secs
    );

    let (scheduler, task) = SchedulerHandle::spawn(collector, health, metrics, config.interval());

    shutdown_signal().await;
    info!("shutting down");

    if let Err(e) = scheduler.shutdown().await {
        warn!("{e:#}");
    }
    task.await.context("scheduler task panicked")?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("failed to listen for ctrl-c: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
