//! Walker URI parsing
//!
//! ```text
//! walker://{owner}/{repository}?access_token={TOKEN}&branch=main&concurrent=true&wait-on-reset=true
//! ```
//!
//! The scheme is ignored. The host names the owner, the single path segment
//! names the repository, and the query carries credentials and walk options.

use crate::error::ConfigError;
use crate::types::{RepoRef, DEFAULT_BRANCH};
use reqwest::Url;
use std::fmt;

/// Parsed walker URI
#[derive(Clone, PartialEq)]
pub struct WalkerUri {
    pub repo: RepoRef,
    pub access_token: String,
    pub concurrent: bool,
    pub wait_on_reset: bool,
    /// Permits per second; falls back to the config file value
    pub rate: Option<f64>,
    /// Cap on concurrently active walk tasks; unbounded when absent
    pub max_in_flight: Option<usize>,
    /// API base URL override
    pub endpoint: Option<String>,
}

impl WalkerUri {
    pub fn parse(uri: &str) -> Result<Self, ConfigError> {
        let url = Url::parse(uri).map_err(|e| ConfigError::InvalidUri {
            uri: redact(uri),
            reason: e.to_string(),
        })?;

        let owner = url
            .host_str()
            .filter(|host| !host.is_empty())
            .ok_or(ConfigError::MissingOwner)?
            .to_string();

        let path = url.path().trim_start_matches('/');
        let parts: Vec<&str> = path.split('/').collect();
        if parts.len() != 1 || parts[0].is_empty() {
            return Err(ConfigError::InvalidRepository {
                path: path.to_string(),
            });
        }
        let repo_name = parts[0].to_string();

        let query = |name: &str| -> Option<String> {
            url.query_pairs()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.into_owned())
                .filter(|value| !value.is_empty())
        };

        let access_token = query("access_token").ok_or(ConfigError::MissingAccessToken)?;
        let branch = query("branch").unwrap_or_else(|| DEFAULT_BRANCH.to_string());

        let concurrent = match query("concurrent") {
            Some(value) => parse_bool("concurrent", &value)?,
            None => false,
        };
        let wait_on_reset = match query("wait-on-reset") {
            Some(value) => parse_bool("wait-on-reset", &value)?,
            None => false,
        };

        let rate = query("rate")
            .map(|value| {
                value
                    .parse::<f64>()
                    .ok()
                    .filter(|rate| rate.is_finite() && *rate > 0.0)
                    .ok_or_else(|| ConfigError::InvalidParameter {
                        name: "rate".to_string(),
                        value,
                        reason: "expected a positive number of permits per second".to_string(),
                    })
            })
            .transpose()?;

        let max_in_flight = query("max_in_flight")
            .map(|value| {
                value
                    .parse::<usize>()
                    .ok()
                    .filter(|n| *n > 0)
                    .ok_or_else(|| ConfigError::InvalidParameter {
                        name: "max_in_flight".to_string(),
                        value,
                        reason: "expected a positive integer".to_string(),
                    })
            })
            .transpose()?;

        Ok(Self {
            repo: RepoRef::new(owner, repo_name).with_branch(branch),
            access_token,
            concurrent,
            wait_on_reset,
            rate,
            max_in_flight,
            endpoint: query("endpoint"),
        })
    }
}

impl fmt::Debug for WalkerUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalkerUri")
            .field("repo", &self.repo)
            .field("access_token", &"<redacted>")
            .field("concurrent", &self.concurrent)
            .field("wait_on_reset", &self.wait_on_reset)
            .field("rate", &self.rate)
            .field("max_in_flight", &self.max_in_flight)
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

/// Boolean spellings accepted for walker options.
pub fn parse_bool(name: &str, value: &str) -> Result<bool, ConfigError> {
    match value {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
        _ => Err(ConfigError::InvalidParameter {
            name: name.to_string(),
            value: value.to_string(),
            reason: "expected a boolean".to_string(),
        }),
    }
}

/// Keep tokens out of error messages
fn redact(uri: &str) -> String {
    match uri.find("access_token=") {
        Some(start) => {
            let value_start = start + "access_token=".len();
            let value_end = uri[value_start..]
                .find('&')
                .map(|i| value_start + i)
                .unwrap_or(uri.len());
            format!("{}<redacted>{}", &uri[..value_start], &uri[value_end..])
        }
        None => uri.to_string(),
    }
}
