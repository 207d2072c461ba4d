//! ConfigLoader facade delegating to merge service.

use super::merge::service::MergeService;
use super::RepoWalkConfig;
use crate::error::ConfigError;
use std::path::Path;

/// Configuration loader facade.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load settings from the global config file and environment.
    pub fn load() -> Result<RepoWalkConfig, ConfigError> {
        MergeService::load(None)
    }

    /// Load settings with an explicit config file layered over the global one.
    pub fn load_with_file(path: &Path) -> Result<RepoWalkConfig, ConfigError> {
        MergeService::load(Some(path))
    }

    /// Create default configuration.
    pub fn default() -> RepoWalkConfig {
        RepoWalkConfig::default()
    }
}
