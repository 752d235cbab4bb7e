//! HTTP transport to the eero cloud API
//!
//! The collector never talks to `reqwest` directly. It goes through the
//! [`Upstream`] trait so tests can swap in canned responses.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{
    StatusCode,
    header::{ACCEPT, COOKIE},
};
use serde_json::Value;
use tracing::{instrument, trace};

use super::error::{FetchError, FetchResult};

/// Default API root including the API version
pub const DEFAULT_BASE_URL: &str = "https://api-user.e2ro.com/2.2";

const USER_AGENT: &str = concat!("eero-exporter/", env!("CARGO_PKG_VERSION"));

/// A source of raw JSON documents, addressed by path relative to the API root
#[async_trait]
pub trait Upstream: Send + Sync {
    async fn get_json(&self, path: &str) -> FetchResult<Value>;
}

/// [`Upstream`] backed by the real HTTP API
pub struct HttpUpstream {
    /// HTTP client (reused across requests, carries the per-call timeout)
    client: reqwest::Client,

    base_url: String,

    /// Session token sent as the `s` cookie
    session_token: Option<String>,
}

impl HttpUpstream {
    pub fn new(
        base_url: impl Into<String>,
        session_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            session_token,
        })
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

#[async_trait]
impl Upstream for HttpUpstream {
    #[instrument(skip(self))]
    async fn get_json(&self, path: &str) -> FetchResult<Value> {
        let Some(token) = &self.session_token else {
            return Err(FetchError::Auth("no session token configured".to_string()));
        };

        let url = self.url(path);
        trace!("requesting {url}");

        let response = self
            .client
            .get(&url)
            .header(ACCEPT, "application/json")
            .header(COOKIE, format!("s={token}"))
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(FetchError::Auth(format!("{path}: session rejected ({status})")));
        }
        if !status.is_success() {
            return Err(FetchError::Request(format!("{path}: HTTP {status}")));
        }

        let body = response.text().await?;
        let value: Value = serde_json::from_str(&body)
            .map_err(|e| FetchError::Request(format!("{path}: invalid JSON: {e}")))?;

        // the API sometimes answers 200 and reports the rejection in the envelope
        if value
            .pointer("/meta/code")
            .and_then(Value::as_u64)
            .is_some_and(|code| code == 401)
        {
            return Err(FetchError::Auth(format!("{path}: session rejected (meta.code 401)")));
        }

        trace!("received {} bytes from {path}", body.len());
        Ok(value)
    }
}
