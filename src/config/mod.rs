//! Configuration
//!
//! Two inputs shape a walker:
//! - the walker URI (`uri`): repository coordinate, credentials, walk options
//! - layered settings (`RepoWalkConfig`): logging, throttle cadence and HTTP
//!   client defaults, merged from defaults, config files and `REPOWALK__*`
//!   environment variables
//!
//! URI options win over settings for the walker they describe.

pub mod facade;
pub mod merge;
pub mod paths;
pub mod sources;
pub mod uri;

use crate::logging::LoggingConfig;
use crate::throttle::RateLimiter;
use serde::{Deserialize, Serialize};

pub use facade::ConfigLoader;
pub use uri::WalkerUri;

/// Root settings document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepoWalkConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub throttle: ThrottleSettings,

    #[serde(default)]
    pub client: ClientSettings,
}

/// Request cadence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThrottleSettings {
    #[serde(default = "default_permits_per_second")]
    pub permits_per_second: f64,
}

fn default_permits_per_second() -> f64 {
    RateLimiter::DEFAULT_PERMITS_PER_SECOND
}

impl Default for ThrottleSettings {
    fn default() -> Self {
        Self {
            permits_per_second: default_permits_per_second(),
        }
    }
}

/// HTTP client defaults for the content API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientSettings {
    /// API base URL
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Per-request timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_endpoint() -> String {
    "https://api.github.com".to_string()
}

fn default_user_agent() -> String {
    format!("repowalk/{}", env!("CARGO_PKG_VERSION"))
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
        }
    }
}
