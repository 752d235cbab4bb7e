//! API response types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::health::HealthSnapshot;

/// Overall exporter health as reported by `/health`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Unhealthy => "unhealthy",
        }
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of `GET /health`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub session_valid: bool,
    pub last_collection_success: bool,
    pub collections_total: u64,
    pub collections_failed: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_collection: Option<DateTime<Utc>>,
}

impl From<HealthSnapshot> for HealthResponse {
    fn from(snapshot: HealthSnapshot) -> Self {
        let status = if snapshot.is_healthy() {
            HealthStatus::Healthy
        } else {
            HealthStatus::Unhealthy
        };

        Self {
            status,
            session_valid: snapshot.session_valid,
            last_collection_success: snapshot.last_success,
            collections_total: snapshot.cycles_total,
            collections_failed: snapshot.cycles_failed,
            last_error: snapshot.last_error,
            last_collection: snapshot.last_collection,
        }
    }
}

/// Body of `GET /ready`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReadyResponse {
    pub status: String,
}

impl ReadyResponse {
    pub fn ready() -> Self {
        Self {
            status: "ready".to_string(),
        }
    }
}
