// packages/proxy/src/utils/config.rs
//! Engine configuration
//!
//! Loaded from an optional `sentra-proxy.{toml,yaml,json}` file in the working
//! directory, then overridden by `SENTRA_PROXY__*` environment variables
//! (e.g. `SENTRA_PROXY__LOGGING__LEVEL=debug`).

use crate::utils::errors::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Default configuration file stem
pub const CONFIG_FILE: &str = "sentra-proxy";

/// Environment variable prefix
pub const ENV_PREFIX: &str = "SENTRA_PROXY";

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Logging setup
    pub logging: LoggingConfig,

    /// Interceptor registration
    pub interception: InterceptionConfig,

    /// Invocation recording
    pub recording: RecordingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive (`RUST_LOG` takes precedence)
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Interception configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InterceptionConfig {
    /// Priority for bindings that do not set one
    pub default_priority: i32,

    /// Declarative interceptor bindings
    pub bindings: Vec<BindingConfig>,
}

impl Default for InterceptionConfig {
    fn default() -> Self {
        Self {
            default_priority: 100,
            bindings: Vec::new(),
        }
    }
}

/// Binds a named interceptor to named target types
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BindingConfig {
    /// Interceptor name, resolved against the caller's catalog
    pub interceptor: String,

    /// Target type names
    #[serde(default)]
    pub targets: Vec<String>,

    /// Priority (lower runs first)
    #[serde(default)]
    pub priority: Option<i32>,
}

/// Recording configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordingConfig {
    /// Capacity of the invocation event queue
    pub queue_capacity: usize,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 65_536,
        }
    }
}

impl ProxyConfig {
    /// Load configuration from the default file and environment
    pub fn load() -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(CONFIG_FILE).required(false))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;

        let loaded: Self = settings.try_deserialize()?;
        debug!("Loaded proxy configuration: {:?}", loaded);
        Ok(loaded)
    }

    /// Load configuration from an explicit file, then environment
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;

        let loaded: Self = settings.try_deserialize()?;
        debug!("Loaded proxy configuration from {:?}", path.as_ref());
        Ok(loaded)
    }
}
