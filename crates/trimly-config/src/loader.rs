//! Configuration loader with layered sources.

use crate::{AppConfig, DEFAULT_JWT_SECRET};
use config::{Config, ConfigError, Environment, File};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use trimly_core::{TrimlyError, TrimlyResult, SLOT_INTERVAL_RANGE};

/// Environment variable prefix for overrides, e.g. `TRIMLY__SERVER__PORT`.
pub const ENV_PREFIX: &str = "TRIMLY";

/// Loads configuration from files and the environment.
///
/// Sources are applied in order, later ones winning:
/// 1. `{dir}/default.toml`
/// 2. `{dir}/{environment}.toml`
/// 3. `{dir}/local.toml` (not committed to version control)
/// 4. Environment variables with the `TRIMLY__` prefix and `__` separator
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config_dir: PathBuf,
    env_prefix: String,
}

impl ConfigLoader {
    /// Creates a loader reading from `config_dir`.
    pub fn new(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
            env_prefix: ENV_PREFIX.to_string(),
        }
    }

    /// Loader for the default location (`./config`).
    #[must_use]
    pub fn from_default_location() -> Self {
        Self::new("./config")
    }

    /// Uses a different environment variable prefix.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Loads and validates the configuration.
    pub fn load(&self) -> TrimlyResult<AppConfig> {
        // Load .env file if present
        if let Err(e) = dotenvy::dotenv() {
            debug!("No .env file found or error loading it: {}", e);
        }

        let environment = std::env::var(format!("{}_ENVIRONMENT", self.env_prefix))
            .unwrap_or_else(|_| "development".to_string());
        info!("Loading configuration for environment: {}", environment);

        let mut builder = Config::builder();
        for name in ["default", environment.as_str(), "local"] {
            let path = self.config_dir.join(format!("{name}.toml"));
            if Path::new(&path).exists() {
                debug!("Loading config from: {}", path.display());
                builder = builder.add_source(File::from(path).required(false));
            }
        }

        builder = builder.add_source(
            Environment::with_prefix(&self.env_prefix)
                .prefix_separator("__")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("server.cors_origins")
                .try_parsing(true),
        );

        let config = builder.build().map_err(config_error_to_trimly_error)?;
        let app_config: AppConfig = config
            .try_deserialize()
            .map_err(config_error_to_trimly_error)?;

        validate_config(&app_config)?;
        Ok(app_config)
    }
}

/// Rejects configurations the server cannot run with.
pub fn validate_config(config: &AppConfig) -> TrimlyResult<()> {
    if config.app.is_production() && config.security.jwt_secret == DEFAULT_JWT_SECRET {
        warn!("Using default JWT secret in production! This is a security risk.");
    }

    if config.database.url.trim().is_empty() {
        return Err(TrimlyError::Configuration("Database URL is required".to_string()));
    }

    if !SLOT_INTERVAL_RANGE.contains(&config.booking.default_slot_interval_minutes) {
        return Err(TrimlyError::Configuration(
            "booking.default_slot_interval_minutes must be between 5 and 120".to_string(),
        ));
    }

    if !(4..=8).contains(&config.otp.code_length) {
        return Err(TrimlyError::Configuration(
            "otp.code_length must be between 4 and 8".to_string(),
        ));
    }

    if config.otp.max_attempts < 1 || config.otp.max_requests == 0 || config.otp.ttl_secs <= 0 {
        return Err(TrimlyError::Configuration(
            "otp limits must be positive".to_string(),
        ));
    }

    Ok(())
}

fn config_error_to_trimly_error(err: ConfigError) -> TrimlyError {
    TrimlyError::Configuration(err.to_string())
}
