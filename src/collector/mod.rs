//! Collection orchestrator
//!
//! One call to [`Collector::collect`] is one cycle:
//!
//! ```text
//! networks ─┬─ network detail → eeros → devices → profiles → optional passes
//!           ├─ ... (up to `network_concurrency` networks at once)
//!           └─ ...
//! ```
//!
//! Every pass is isolated. A pass whose fetch fails with a request error
//! writes nothing this cycle (earlier values stay), is counted against its
//! `pass` label and the walk moves on. A rejected session is different:
//! every further call would fail the same way, so an auth failure anywhere
//! ends the cycle.

mod devices;
mod eeros;
mod features;
mod network;
pub mod parse;
mod profiles;

use std::{fmt, future::Future, sync::Arc};

use futures::{StreamExt, TryStreamExt, stream};
use tracing::{debug, info, instrument, warn};

use crate::{
    config::FeaturesConfig,
    metrics::ExporterMetrics,
    upstream::{
        Entity, FetchError, Fetchers, Resource,
        fields::{self, entity_id},
    },
};

/// Why a cycle was aborted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleError {
    /// The session was rejected; nothing collected this cycle can be trusted
    Auth(String),

    /// The networks list could not be fetched
    Request(String),
}

impl CycleError {
    /// Value of the `error_type` label
    pub fn kind(&self) -> &'static str {
        match self {
            CycleError::Auth(_) => "auth",
            CycleError::Request(_) => "request",
        }
    }
}

impl fmt::Display for CycleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CycleError::Auth(msg) => write!(f, "session invalid: {}", msg),
            CycleError::Request(msg) => write!(f, "collection failed: {}", msg),
        }
    }
}

impl std::error::Error for CycleError {}

impl From<FetchError> for CycleError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Auth(msg) => CycleError::Auth(msg),
            FetchError::Request(msg) => CycleError::Request(msg),
        }
    }
}

/// Summary of a finished cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Networks walked (networks without a usable id are not counted)
    pub networks: usize,

    /// Core passes that failed with a request error
    pub pass_errors: usize,

    /// Optional feature fetches that failed with a request error
    pub feature_errors: usize,
}

impl CycleReport {
    fn merge(mut self, other: CycleReport) -> Self {
        self.networks += other.networks;
        self.pass_errors += other.pass_errors;
        self.feature_errors += other.feature_errors;
        self
    }
}

pub type CycleOutcome = Result<CycleReport, CycleError>;

/// Walks the entity hierarchy and writes the results into [`ExporterMetrics`]
pub struct Collector {
    fetchers: Fetchers,
    metrics: Arc<ExporterMetrics>,
    features: FeaturesConfig,
    network_concurrency: usize,
}

impl Collector {
    pub fn new(
        fetchers: Fetchers,
        metrics: Arc<ExporterMetrics>,
        features: FeaturesConfig,
        network_concurrency: usize,
    ) -> Self {
        Self {
            fetchers,
            metrics,
            features,
            network_concurrency: network_concurrency.max(1),
        }
    }

    /// Run one full cycle
    #[instrument(skip(self))]
    pub async fn collect(&self) -> CycleOutcome {
        let networks = self.fetchers.networks().await;
        self.count_request(Resource::Networks, &networks);
        let networks = networks?;

        if networks.is_empty() {
            warn!("account has no networks");
        }

        let networks: Vec<(String, Entity)> = networks
            .into_iter()
            .filter_map(|network| match entity_id(&network) {
                Some(id) => Some((id, network)),
                None => {
                    debug!("dropping network without a usable id");
                    None
                }
            })
            .collect();

        let report = stream::iter(networks)
            .map(|(id, listed)| self.collect_network(id, listed))
            .buffer_unordered(self.network_concurrency)
            .try_fold(CycleReport::default(), |total, report| async move {
                Ok(total.merge(report))
            })
            .await?;

        info!(
            networks = report.networks,
            pass_errors = report.pass_errors,
            feature_errors = report.feature_errors,
            "collection cycle finished"
        );

        Ok(report)
    }

    #[instrument(skip(self, listed))]
    async fn collect_network(&self, network_id: String, listed: Entity) -> CycleOutcome {
        let mut report = CycleReport {
            networks: 1,
            ..CycleReport::default()
        };

        // the list entry stands in when the detail fetch fails
        let mut network = listed;
        self.run_pass(
            Resource::Network,
            &mut report,
            self.fetchers.network(&network_id),
            |detail| {
                if !detail.is_empty() {
                    network = detail;
                }
            },
        )
        .await?;
        network::record(&self.metrics, &network_id, &network);

        self.run_pass(
            Resource::Eeros,
            &mut report,
            self.fetchers.eeros(&network_id),
            |list| eeros::record(&self.metrics, &network_id, &list, self.features.ethernet),
        )
        .await?;

        if self.features.devices {
            self.run_pass(
                Resource::Devices,
                &mut report,
                self.fetchers.devices(&network_id),
                |list| devices::record(&self.metrics, &network_id, &list),
            )
            .await?;
        }

        if self.features.profiles {
            self.run_pass(
                Resource::Profiles,
                &mut report,
                self.fetchers.profiles(&network_id),
                |list| profiles::record(&self.metrics, &network_id, &list),
            )
            .await?;
        }

        features::collect(self, &network_id, &network, &mut report).await?;

        Ok(report)
    }

    /// Run one isolated pass
    ///
    /// `process` only runs when the fetch succeeds. A request error is
    /// counted and swallowed; an auth error ends the cycle. Returns whether
    /// the pass succeeded.
    pub(crate) async fn run_pass<T, F, P>(
        &self,
        resource: Resource,
        report: &mut CycleReport,
        query: F,
        process: P,
    ) -> Result<bool, CycleError>
    where
        F: Future<Output = Result<T, FetchError>>,
        P: FnOnce(T),
    {
        let result = query.await;
        self.count_request(resource, &result);

        match result {
            Ok(data) => {
                process(data);
                Ok(true)
            }
            Err(err @ FetchError::Auth(_)) => {
                warn!(pass = resource.endpoint(), "{err}");
                Err(err.into())
            }
            Err(err) if is_core(resource) => {
                warn!(pass = resource.endpoint(), "pass failed: {err}");
                report.pass_errors += 1;
                self.metrics
                    .exporter
                    .pass_errors_total
                    .with_label_values(&[resource.endpoint()])
                    .inc();
                Ok(false)
            }
            Err(err) => {
                debug!(feature = resource.endpoint(), "optional fetch failed: {err}");
                report.feature_errors += 1;
                self.metrics
                    .exporter
                    .feature_errors_total
                    .with_label_values(&[resource.endpoint()])
                    .inc();
                Ok(false)
            }
        }
    }

    fn count_request<T>(&self, resource: Resource, result: &Result<T, FetchError>) {
        let status = match result {
            Ok(_) => "success",
            Err(err) => err.kind(),
        };
        self.metrics
            .exporter
            .api_requests_total
            .with_label_values(&[resource.endpoint(), status])
            .inc();
    }
}

/// Core passes count against `pass_errors_total`, the rest against
/// `feature_errors_total`
fn is_core(resource: Resource) -> bool {
    matches!(
        resource,
        Resource::Networks
            | Resource::Network
            | Resource::Eeros
            | Resource::Devices
            | Resource::Profiles
    )
}

/// Label value for an entity's display name
fn display_name(entity: &Entity, field: fields::Field, fallback: Option<String>) -> String {
    field
        .string(entity)
        .or(fallback)
        .unwrap_or_else(|| fields::UNKNOWN.to_string())
}
