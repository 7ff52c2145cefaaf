//! Configuration Loader
//!
//! Environment-aware loading built on the `config` crate:
//! 0. Loads a `.env` file if present (via dotenvy)
//! 1. Starts from serde defaults on every section
//! 2. Merges the base TOML file (`ITEMFLOW_CONFIG_PATH`, else `config/itemflow.toml`)
//! 3. Merges the sibling environment file, e.g. `config/itemflow.production.toml`
//! 4. Applies `ITEMFLOW__<SECTION>__<KEY>` environment variables
//! 5. Validates the result

use config::{Config, Environment, File, FileFormat};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::error::{ConfigResult, ConfigurationError};
use super::ItemflowConfig;

const DEFAULT_CONFIG_PATH: &str = "config/itemflow.toml";
const ENV_PREFIX: &str = "ITEMFLOW";
const ENV_SEPARATOR: &str = "__";

/// Zero-state utility struct providing static configuration loading functions
#[derive(Debug)]
pub struct ConfigLoader;

impl ConfigLoader {
    /// Detect environment from ITEMFLOW_ENV or default to "development"
    pub fn detect_environment() -> String {
        std::env::var("ITEMFLOW_ENV").unwrap_or_else(|_| "development".to_string())
    }

    /// Load configuration for the detected environment.
    ///
    /// A missing base file is not an error here; defaults and environment
    /// variables are enough to run.
    pub fn load() -> ConfigResult<ItemflowConfig> {
        dotenvy::dotenv().ok();
        Self::load_for_environment(&Self::detect_environment())
    }

    /// Same as [`ConfigLoader::load`] with an explicit environment name
    pub fn load_for_environment(environment: &str) -> ConfigResult<ItemflowConfig> {
        let (base_path, required) = match std::env::var("ITEMFLOW_CONFIG_PATH") {
            Ok(path) => (PathBuf::from(path), true),
            Err(_) => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
        };

        Self::build(&base_path, required, environment)
    }

    /// Load configuration from an explicit base file, which must exist
    pub fn load_from_file(path: impl AsRef<Path>, environment: &str) -> ConfigResult<ItemflowConfig> {
        Self::build(path.as_ref(), true, environment)
    }

    fn build(base_path: &Path, required: bool, environment: &str) -> ConfigResult<ItemflowConfig> {
        let env_path = Self::environment_file_path(base_path, environment);

        debug!(
            base = %base_path.display(),
            overlay = %env_path.display(),
            environment = %environment,
            "Loading configuration"
        );

        let settings = Config::builder()
            .add_source(
                File::new(&base_path.to_string_lossy(), FileFormat::Toml).required(required),
            )
            .add_source(File::new(&env_path.to_string_lossy(), FileFormat::Toml).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator(ENV_SEPARATOR)
                    .separator(ENV_SEPARATOR)
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| {
                ConfigurationError::load_failed(base_path.display().to_string(), e.to_string())
            })?;

        let mut config: ItemflowConfig = settings.try_deserialize().map_err(|e| {
            ConfigurationError::load_failed(base_path.display().to_string(), e.to_string())
        })?;

        if config.environment.is_none() {
            config.environment = Some(environment.to_string());
        }

        config.validate()?;

        info!(
            environment = %environment,
            bind_address = %config.server.bind_address,
            worker_slots = config.worker_pool.max_concurrent_items,
            storage_backend = ?config.storage.backend,
            "Configuration loaded successfully"
        );

        Ok(config)
    }

    /// `config/itemflow.toml` + `test` -> `config/itemflow.test.toml`
    fn environment_file_path(base_path: &Path, environment: &str) -> PathBuf {
        let stem = base_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "itemflow".to_string());
        base_path.with_file_name(format!("{stem}.{environment}.toml"))
    }
}
