use std::path::Path;

use config::{Config, ConfigError, Environment, File};
use isoreq::ClientConfig;

/// Prefix of environment variables that override the config file
pub const ENV_PREFIX: &str = "ISOREQ";

/// Load the client config
///
/// Sources, lowest priority first: built-in defaults, the config file when
/// given, then `ISOREQ_*` environment variables.
pub fn load(config_file: Option<&Path>) -> Result<ClientConfig, ConfigError> {
    let defaults = ClientConfig::default();
    let mut builder = Config::builder().add_source(Config::try_from(&defaults)?);

    if let Some(path) = config_file {
        builder = builder.add_source(File::from(path));
    }

    let config = builder
        .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
        .build()?;

    config.try_deserialize()
}
