//! # Itemflow Configuration System
//!
//! Layered configuration: built-in defaults, an optional base TOML file, an
//! optional per-environment TOML file, then `ITEMFLOW__*` environment
//! variables. Every field has a default so an empty configuration is valid.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use itemflow_core::config::ConfigLoader;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ConfigLoader::load()?;
//! println!("worker slots: {}", config.worker_pool.max_concurrent_items);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod loader;

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use error::{ConfigResult, ConfigurationError};
pub use loader::ConfigLoader;

/// Root configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemflowConfig {
    pub environment: Option<String>,
    pub server: ServerConfig,
    pub worker_pool: WorkerPoolConfig,
    pub processing: ProcessingConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

impl ItemflowConfig {
    /// Reject settings the runtime cannot honour
    pub fn validate(&self) -> ConfigResult<()> {
        if self.worker_pool.max_concurrent_items == 0 {
            return Err(ConfigurationError::invalid_value(
                "worker_pool.max_concurrent_items",
                "must be at least 1",
            ));
        }

        if self.server.bind_address.trim().is_empty() {
            return Err(ConfigurationError::invalid_value(
                "server.bind_address",
                "must not be empty",
            ));
        }

        if self.storage.backend == StorageBackend::Postgres {
            let has_url = self
                .storage
                .database_url
                .as_deref()
                .is_some_and(|url| !url.trim().is_empty());
            if !has_url {
                return Err(ConfigurationError::invalid_value(
                    "storage.database_url",
                    "required when storage.backend = \"postgres\"",
                ));
            }
            if self.storage.max_connections == 0 {
                return Err(ConfigurationError::invalid_value(
                    "storage.max_connections",
                    "must be at least 1",
                ));
            }
        }

        Ok(())
    }
}

/// HTTP server settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
    pub request_timeout_ms: u64,
}

impl ServerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            request_timeout_ms: 30000,
        }
    }
}

/// Bounded worker pool settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerPoolConfig {
    /// Number of execution slots shared by every batch
    pub max_concurrent_items: usize,
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        Self {
            max_concurrent_items: 10,
        }
    }
}

/// Per-item processing settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Simulated I/O cost paid by each item before it touches storage
    pub item_latency_ms: u64,
}

impl ProcessingConfig {
    pub fn item_latency(&self) -> Duration {
        Duration::from_millis(self.item_latency_ms)
    }
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            item_latency_ms: 100,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Memory,
    Postgres,
}

/// Storage backend selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub database_url: Option<String>,
    pub max_connections: u32,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
            database_url: None,
            max_connections: 10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Logging settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive; falls back to an environment-specific default
    pub level: Option<String>,
    pub format: LogFormat,
}
