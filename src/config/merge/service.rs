//! MergeService: orchestrates sources, applies precedence, deserializes to RepoWalkConfig.

use crate::config::sources::{environment, global_file};
use crate::config::RepoWalkConfig;
use crate::error::ConfigError;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, File};
use std::path::Path;

/// Merge service for config composition.
pub struct MergeService;

impl MergeService {
    /// Load config from standard sources.
    /// Precedence: defaults (lowest) -> global file -> explicit file -> environment (highest).
    pub fn load(explicit_file: Option<&Path>) -> Result<RepoWalkConfig, ConfigError> {
        let builder = Self::builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = match explicit_file {
            Some(path) => builder.add_source(File::from(path).required(true)),
            None => builder,
        };
        let builder = environment::add_to_builder(builder)?;

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }

    /// Load config from an in-memory TOML document, without files or environment.
    #[cfg(test)]
    pub(crate) fn load_from_str(toml: &str) -> Result<RepoWalkConfig, ConfigError> {
        let config = Self::builder_with_defaults()?
            .add_source(File::from_str(toml, config::FileFormat::Toml))
            .build()?;
        Ok(config.try_deserialize()?)
    }

    fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        let defaults = Config::try_from(&RepoWalkConfig::default())?;
        Ok(Config::builder().add_source(defaults))
    }
}
