// packages/proxy/src/utils/mod.rs
//! Common utilities: error types and configuration

pub mod config;
pub mod errors;

pub use config::{BindingConfig, InterceptionConfig, LoggingConfig, ProxyConfig, RecordingConfig};
pub use errors::{Fault, ProxyError, Result};
