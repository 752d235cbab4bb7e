//! Error types for upstream fetches

use std::fmt;

/// Result type alias for upstream fetches
pub type FetchResult<T> = Result<T, FetchError>;

/// Errors a single upstream call can end in
///
/// Shape problems inside a successfully parsed body are not errors; the
/// normalizer degrades them to empty values instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The session credential was rejected or is missing
    Auth(String),

    /// Network error, timeout, non-2xx status or a body that is not JSON
    Request(String),
}

impl FetchError {
    pub fn is_auth(&self) -> bool {
        matches!(self, FetchError::Auth(_))
    }

    /// Short category name used as a metric label
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Auth(_) => "auth",
            FetchError::Request(_) => "request",
        }
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Auth(msg) => write!(f, "authentication failed: {}", msg),
            FetchError::Request(msg) => write!(f, "request failed: {}", msg),
        }
    }
}

impl std::error::Error for FetchError {}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Request(format!("request timed out: {err}"))
        } else {
            FetchError::Request(err.to_string())
        }
    }
}
