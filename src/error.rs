//! Error types for repowalk
//!
//! Three layers:
//! - `ConfigError`: walker URI and config file problems, raised before any fetch
//! - `FetchError`: produced by a `ContentFetcher`, including the rate-limit variant
//! - `WalkError`: what `RepoWalker::walk_uri` returns, with the failing path attached

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Top-level error returned by a walk.
#[derive(Error, Debug)]
pub enum WalkError {
    /// Invalid walker configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The content fetcher failed for `path`
    #[error("Failed to fetch '{path}': {source}")]
    Fetch {
        path: String,
        #[source]
        source: FetchError,
    },

    /// The caller's file callback failed for `path`
    #[error("Callback failed for '{path}': {source}")]
    Callback {
        path: String,
        #[source]
        source: anyhow::Error,
    },

    /// A concurrent child task ended without reporting a result
    #[error("Walk task for '{path}' failed: {reason}")]
    TaskFailed { path: String, reason: String },
}

impl WalkError {
    /// Path the error is attached to, if any.
    pub fn path(&self) -> Option<&str> {
        match self {
            WalkError::Config(_) => None,
            WalkError::Fetch { path, .. }
            | WalkError::Callback { path, .. }
            | WalkError::TaskFailed { path, .. } => Some(path),
        }
    }

    /// Returns true if this error came from an exhausted rate limit
    pub fn is_rate_limited(&self) -> bool {
        matches!(
            self,
            WalkError::Fetch {
                source: FetchError::RateLimited { .. },
                ..
            }
        )
    }
}

/// Errors produced by a content fetcher.
#[derive(Error, Debug, Clone)]
pub enum FetchError {
    /// The service refused the request until `reset`
    #[error("Rate limit exceeded until {reset}: {message}")]
    RateLimited {
        reset: DateTime<Utc>,
        message: String,
    },

    /// Path does not exist on the requested branch
    #[error("Path not found: '{path}'")]
    NotFound { path: String },

    /// Non-success HTTP status other than 404 / rate limit
    #[error("Unexpected response status {status}: {message}")]
    Status { status: u16, message: String },

    /// Transport-level failure (DNS, TLS, timeout, ...)
    #[error("Request failed: {0}")]
    Request(String),

    /// Response body did not match the contents schema
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// The walk was cancelled between requests of one fetch
    #[error("Fetch cancelled")]
    Cancelled,
}

impl FetchError {
    /// Reset instant carried by a rate-limit error.
    pub fn reset_instant(&self) -> Option<DateTime<Utc>> {
        match self {
            FetchError::RateLimited { reset, .. } => Some(*reset),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            FetchError::Decode(err.to_string())
        } else {
            FetchError::Request(err.to_string())
        }
    }
}

/// Walker URI and configuration file errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// URI could not be parsed at all
    #[error("Invalid walker URI '{uri}': {reason}")]
    InvalidUri { uri: String, reason: String },

    /// Missing the owner (host) component
    #[error("Walker URI is missing the repository owner")]
    MissingOwner,

    /// Path must be exactly one segment naming the repository
    #[error("Invalid repository path '{path}': expected exactly one segment")]
    InvalidRepository { path: String },

    /// `access_token` query parameter absent or empty
    #[error("Missing access token")]
    MissingAccessToken,

    /// Query parameter present but not parsable
    #[error("Invalid value '{value}' for '{name}': {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },

    /// Config file / environment layering failed
    #[error("Failed to load settings: {0}")]
    Settings(#[from] config::ConfigError),

    /// Logging setup failed
    #[error("Logging error: {0}")]
    Logging(String),

    /// HTTP client construction failed
    #[error("Failed to build HTTP client: {0}")]
    Client(String),
}

/// Result type alias for WalkError
pub type Result<T> = std::result::Result<T, WalkError>;
