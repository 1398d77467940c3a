//! Configuration loading
//!
//! Layers, lowest precedence first:
//! 1. Built-in defaults for the detected environment (`AppConfig::from_env`)
//! 2. Optional `config.<environment>` file (toml, yaml or json)
//! 3. `LOGIN_GUARD__*` environment variables, e.g.
//!    `LOGIN_GUARD__RATE_LIMIT__MAX_ATTEMPTS=10`

use config::{Config, ConfigError, Environment as EnvSource, File};
use lg_shared::AppConfig;
use tracing::debug;

pub const ENV_PREFIX: &str = "LOGIN_GUARD";

pub fn load_config() -> Result<AppConfig, ConfigError> {
    let defaults = AppConfig::from_env();
    let config_file = defaults.environment.config_file().to_string();

    let config: AppConfig = Config::builder()
        .add_source(Config::try_from(&defaults)?)
        .add_source(File::with_name(&config_file).required(false))
        .add_source(
            EnvSource::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?
        .try_deserialize()?;

    debug!(
        environment = %config.environment,
        config_file = %config_file,
        "Configuration loaded"
    );
    Ok(config)
}
