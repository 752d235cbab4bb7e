//! Exporter configuration
//!
//! Loaded from TOML (`~/.config/eero-exporter/config.toml` unless a path is
//! given), then overridden by environment variables and CLI flags. Every
//! section and key is optional.

use std::{
    net::{IpAddr, SocketAddr},
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::{upstream::DEFAULT_BASE_URL, util};

const CONFIG_DIR: &str = ".config/eero-exporter";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub collection: CollectionConfig,

    #[serde(default)]
    pub features: FeaturesConfig,

    #[serde(default)]
    pub upstream: UpstreamConfig,
}

/// Listen address of the exposition server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "crate::util::get_default_host")]
    pub host: IpAddr,

    #[serde(default = "crate::util::get_default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: util::get_default_host(),
            port: util::get_default_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionConfig {
    /// Seconds between collection cycles (default: 60)
    #[serde(default = "default_interval")]
    pub interval_secs: u64,

    /// Per-request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Networks walked at the same time (default: 1)
    #[serde(default = "default_network_concurrency")]
    pub network_concurrency: usize,
}

fn default_interval() -> u64 {
    60
}

fn default_timeout() -> u64 {
    30
}

fn default_network_concurrency() -> usize {
    1
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval(),
            timeout_secs: default_timeout(),
            network_concurrency: default_network_concurrency(),
        }
    }
}

/// Per-feature switches; everything is on by default
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeaturesConfig {
    pub devices: bool,
    pub profiles: bool,
    pub premium: bool,
    pub ethernet: bool,
    pub thread: bool,
    pub port_forwards: bool,
    pub reservations: bool,
    pub blacklist: bool,
    pub diagnostics: bool,
    pub insights: bool,
    pub sqm: bool,
}

impl Default for FeaturesConfig {
    fn default() -> Self {
        Self {
            devices: true,
            profiles: true,
            premium: true,
            ethernet: true,
            thread: true,
            port_forwards: true,
            reservations: true,
            blacklist: true,
            diagnostics: true,
            insights: true,
            sqm: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Session file written by the login tool
    pub session_file: Option<PathBuf>,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            session_file: None,
        }
    }
}

impl Config {
    /// Load configuration from file, or use defaults if file doesn't exist
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = path.map(|p| p.to_path_buf()).or_else(|| {
            let default_path = default_dir()?.join("config.toml");
            default_path.exists().then_some(default_path)
        });

        let Some(path) = config_path else {
            debug!("no config file found, using defaults");
            return Ok(Self::default());
        };

        trace!("reading config from {}", path.display());
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Apply `EERO_EXPORTER_HOST` / `EERO_EXPORTER_PORT`
    pub fn apply_env(&mut self) {
        if let Some(host) = util::get_host() {
            self.server.host = host;
        }
        if let Some(port) = util::get_port() {
            self.server.port = port;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.collection.interval_secs == 0 {
            bail!("collection.interval_secs must be greater than 0");
        }
        if self.collection.timeout_secs == 0 {
            bail!("collection.timeout_secs must be greater than 0");
        }
        if self.collection.network_concurrency == 0 {
            bail!("collection.network_concurrency must be greater than 0");
        }
        if !self.upstream.base_url.starts_with("http://")
            && !self.upstream.base_url.starts_with("https://")
        {
            bail!("upstream.base_url must be an http(s) URL: {}", self.upstream.base_url);
        }
        if self.collection.timeout_secs > self.collection.interval_secs {
            warn!(
                "request timeout ({}s) exceeds the interval ({}s), cycles may be delayed",
                self.collection.timeout_secs, self.collection.interval_secs
            );
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.server.host, self.server.port)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.collection.interval_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.collection.timeout_secs)
    }

    pub fn session_file(&self) -> Option<PathBuf> {
        match &self.upstream.session_file {
            Some(path) => Some(expand_home(path)),
            None => default_dir().map(|dir| dir.join("session.json")),
        }
    }

    /// Session token from `EERO_SESSION_TOKEN`, else from the session file
    ///
    /// A missing token is not an error here. The first cycle then fails with
    /// an auth error and `/health` reports it.
    pub fn session_token(&self) -> Result<Option<String>> {
        if let Some(token) = util::get_session_token() {
            debug!("using session token from environment");
            return Ok(Some(token));
        }

        let Some(path) = self.session_file() else {
            warn!("no home directory, cannot locate a session file");
            return Ok(None);
        };

        if !path.exists() {
            warn!("session file {} not found, run the login tool first", path.display());
            return Ok(None);
        }

        let token = SessionData::read(&path)?.token();
        if token.is_none() {
            warn!("session file {} holds no token", path.display());
        }
        Ok(token)
    }
}

/// Session file contents; unknown keys are ignored
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SessionData {
    pub session_id: Option<String>,
    pub user_token: Option<String>,
}

impl SessionData {
    pub fn read(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read session file: {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse session file: {}", path.display()))
    }

    /// `session_id`, falling back to `user_token`
    pub fn token(&self) -> Option<String> {
        [&self.session_id, &self.user_token]
            .into_iter()
            .flatten()
            .map(|token| token.trim())
            .find(|token| !token.is_empty())
            .map(str::to_string)
    }
}

fn default_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(CONFIG_DIR))
}

fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), dirs::home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}
