use crate::error::ConfigError;
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod logging;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use logging::init_tracing;
pub use settings::{Config, DbConfig, DbOverrides, LoggingConfig};

/// Prefix for environment overrides, e.g. `DISCOTECA__DATABASE__HOST`.
pub const ENV_PREFIX: &str = "DISCOTECA";

/// Loads the application configuration from `config.toml` and the environment.
///
/// Both sources are optional: with neither present the built-in defaults are used.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(Path::new("config.toml"), ENV_PREFIX)
}

/// Loads the configuration from an explicit file and environment prefix.
///
/// Environment variables take precedence over the file. Nested keys are
/// separated by a double underscore (`<PREFIX>__DATABASE__PORT=5433`).
pub fn load_config_from(file: &Path, env_prefix: &str) -> Result<Config, ConfigError> {
    let builder = config::Config::builder()
        // A missing file is fine, the defaults cover every field.
        .add_source(config::File::from(file).required(false))
        .add_source(
            config::Environment::with_prefix(env_prefix)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    // Attempt to deserialize the entire configuration into our `Config` struct
    let config = builder.try_deserialize::<Config>()?;
    config.database.validate()?;

    Ok(config)
}
