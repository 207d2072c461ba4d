//! Environment variable source: REPOWALK__ prefix with __ separator

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::ConfigError;
use config::Environment;

/// Prefix for settings overrides, e.g. `REPOWALK__THROTTLE__PERMITS_PER_SECOND=2`
pub const ENV_PREFIX: &str = "REPOWALK";

/// Add environment variable overlay to builder.
/// Uses REPOWALK prefix and __ as separator for nested keys.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .try_parsing(true),
    );
    Ok(builder)
}
