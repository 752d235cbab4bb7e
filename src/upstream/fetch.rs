//! One operation per upstream resource
//!
//! Every fetcher performs exactly one call through [`Upstream`], normalizes
//! the body and hands back an [`Entity`] or a `Vec<Entity>`. Nothing is
//! cached between calls.

use std::sync::Arc;

use tracing::{debug, instrument};

use super::{
    client::Upstream,
    error::FetchResult,
    normalize::{self, Entity},
};

/// Every upstream resource the collector reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Networks,
    Network,
    Eeros,
    Devices,
    Profiles,
    Sqm,
    PremiumStatus,
    Activity,
    ActivityCategories,
    ActivityClients,
    BackupNetwork,
    BackupStatus,
    Thread,
    Diagnostics,
    Insights,
    PortForwards,
    Reservations,
    Blacklist,
}

impl Resource {
    pub const ALL: [Resource; 18] = [
        Resource::Networks,
        Resource::Network,
        Resource::Eeros,
        Resource::Devices,
        Resource::Profiles,
        Resource::Sqm,
        Resource::PremiumStatus,
        Resource::Activity,
        Resource::ActivityCategories,
        Resource::ActivityClients,
        Resource::BackupNetwork,
        Resource::BackupStatus,
        Resource::Thread,
        Resource::Diagnostics,
        Resource::Insights,
        Resource::PortForwards,
        Resource::Reservations,
        Resource::Blacklist,
    ];

    /// Value of the `endpoint` label on request metrics
    pub fn endpoint(&self) -> &'static str {
        match self {
            Resource::Networks => "networks",
            Resource::Network => "network",
            Resource::Eeros => "eeros",
            Resource::Devices => "devices",
            Resource::Profiles => "profiles",
            Resource::Sqm => "sqm",
            Resource::PremiumStatus => "premium",
            Resource::Activity => "activity",
            Resource::ActivityCategories => "activity_categories",
            Resource::ActivityClients => "activity_clients",
            Resource::BackupNetwork => "backup_network",
            Resource::BackupStatus => "backup_status",
            Resource::Thread => "thread",
            Resource::Diagnostics => "diagnostics",
            Resource::Insights => "insights",
            Resource::PortForwards => "port_forwards",
            Resource::Reservations => "reservations",
            Resource::Blacklist => "blacklist",
        }
    }

    /// Key the list usually sits under; `None` for single-object resources
    pub fn list_key(&self) -> Option<&'static str> {
        match self {
            Resource::Networks => Some("networks"),
            Resource::Eeros => Some("eeros"),
            Resource::Devices => Some("devices"),
            Resource::Profiles => Some("profiles"),
            Resource::ActivityCategories => Some("categories"),
            Resource::ActivityClients => Some("clients"),
            Resource::PortForwards => Some("forwards"),
            Resource::Reservations => Some("reservations"),
            Resource::Blacklist => Some("blacklist"),
            _ => None,
        }
    }

    /// Path relative to the API root; the networks list ignores `network_id`
    pub fn path(&self, network_id: &str) -> String {
        let base = format!("networks/{network_id}");
        match self {
            Resource::Networks => "account".to_string(),
            Resource::Network => base,
            Resource::Eeros => format!("{base}/eeros"),
            Resource::Devices => format!("{base}/devices"),
            Resource::Profiles => format!("{base}/profiles"),
            Resource::Sqm => format!("{base}/sqm"),
            Resource::PremiumStatus => format!("{base}/premium"),
            Resource::Activity => format!("{base}/activity"),
            Resource::ActivityCategories => format!("{base}/activity/categories"),
            Resource::ActivityClients => format!("{base}/activity/clients"),
            Resource::BackupNetwork => format!("{base}/backup_network"),
            Resource::BackupStatus => format!("{base}/backup_network/status"),
            Resource::Thread => format!("{base}/thread"),
            Resource::Diagnostics => format!("{base}/diagnostics"),
            Resource::Insights => format!("{base}/insights"),
            Resource::PortForwards => format!("{base}/forwards"),
            Resource::Reservations => format!("{base}/reservations"),
            Resource::Blacklist => format!("{base}/blacklist"),
        }
    }
}

/// Entity fetchers over a shared [`Upstream`]
#[derive(Clone)]
pub struct Fetchers {
    upstream: Arc<dyn Upstream>,
}

impl Fetchers {
    pub fn new(upstream: Arc<dyn Upstream>) -> Self {
        Self { upstream }
    }

    #[instrument(skip(self), fields(endpoint = resource.endpoint()))]
    async fn object(&self, resource: Resource, network_id: &str) -> FetchResult<Entity> {
        let raw = self.upstream.get_json(&resource.path(network_id)).await?;
        Ok(normalize::object(&raw))
    }

    #[instrument(skip(self), fields(endpoint = resource.endpoint()))]
    async fn list(&self, resource: Resource, network_id: &str) -> FetchResult<Vec<Entity>> {
        let raw = self.upstream.get_json(&resource.path(network_id)).await?;
        let items = normalize::list(&raw, resource.list_key());
        debug!("{} item(s)", items.len());
        Ok(items)
    }

    pub async fn networks(&self) -> FetchResult<Vec<Entity>> {
        self.list(Resource::Networks, "").await
    }

    pub async fn network(&self, network_id: &str) -> FetchResult<Entity> {
        self.object(Resource::Network, network_id).await
    }

    pub async fn eeros(&self, network_id: &str) -> FetchResult<Vec<Entity>> {
        self.list(Resource::Eeros, network_id).await
    }

    pub async fn devices(&self, network_id: &str) -> FetchResult<Vec<Entity>> {
        self.list(Resource::Devices, network_id).await
    }

    pub async fn profiles(&self, network_id: &str) -> FetchResult<Vec<Entity>> {
        self.list(Resource::Profiles, network_id).await
    }

    pub async fn sqm(&self, network_id: &str) -> FetchResult<Entity> {
        self.object(Resource::Sqm, network_id).await
    }

    pub async fn premium_status(&self, network_id: &str) -> FetchResult<Entity> {
        self.object(Resource::PremiumStatus, network_id).await
    }

    pub async fn activity(&self, network_id: &str) -> FetchResult<Entity> {
        self.object(Resource::Activity, network_id).await
    }

    pub async fn activity_categories(&self, network_id: &str) -> FetchResult<Vec<Entity>> {
        self.list(Resource::ActivityCategories, network_id).await
    }

    pub async fn activity_clients(&self, network_id: &str) -> FetchResult<Vec<Entity>> {
        self.list(Resource::ActivityClients, network_id).await
    }

    pub async fn backup_network(&self, network_id: &str) -> FetchResult<Entity> {
        self.object(Resource::BackupNetwork, network_id).await
    }

    pub async fn backup_status(&self, network_id: &str) -> FetchResult<Entity> {
        self.object(Resource::BackupStatus, network_id).await
    }

    pub async fn thread(&self, network_id: &str) -> FetchResult<Entity> {
        self.object(Resource::Thread, network_id).await
    }

    pub async fn diagnostics(&self, network_id: &str) -> FetchResult<Entity> {
        self.object(Resource::Diagnostics, network_id).await
    }

    pub async fn insights(&self, network_id: &str) -> FetchResult<Entity> {
        self.object(Resource::Insights, network_id).await
    }

    pub async fn port_forwards(&self, network_id: &str) -> FetchResult<Vec<Entity>> {
        self.list(Resource::PortForwards, network_id).await
    }

    pub async fn reservations(&self, network_id: &str) -> FetchResult<Vec<Entity>> {
        self.list(Resource::Reservations, network_id).await
    }

    pub async fn blacklist(&self, network_id: &str) -> FetchResult<Vec<Entity>> {
        self.list(Resource::Blacklist, network_id).await
    }
}
