// packages/proxy/src/utils/errors.rs
//! Error types for the proxy engine
//!
//! Two layers:
//!
//! - [`ProxyError`]: engine-level failures (configuration, unsupported targets,
//!   invocation faults raised by the engine itself).
//! - [`Fault`]: what travels through an invocation. Targets and interceptors
//!   fail with a `Fault`, which wraps any error in an `Arc` so the caller receives
//!   the very same instance that was raised.

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Engine error type
#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Unsupported target: no proxy engine supports {0}")]
    UnsupportedTarget(String),

    #[error("Null target: no instance available behind proxy for {0}")]
    NullTarget(String),

    #[error("Invocation error: {method} returned null but declares a primitive return type")]
    NullPrimitiveReturn { method: String },

    #[error("Unknown method: {method} is not exposed by {proxy}")]
    UnknownMethod { method: String, proxy: String },

    #[error("Argument mismatch: {method} expects {expected} argument(s), got {actual}")]
    ArgumentMismatch {
        method: String,
        expected: usize,
        actual: usize,
    },

    #[error("Deadline exceeded: {method} took {elapsed_ms}ms (limit {limit_ms}ms)")]
    DeadlineExceeded {
        method: String,
        elapsed_ms: u128,
        limit_ms: u128,
    },

    #[error("Export failed: {0}")]
    ExportFailed(String),

    #[error("Observability error: {0}")]
    ObservabilityError(String),
}

impl From<config::ConfigError> for ProxyError {
    fn from(e: config::ConfigError) -> Self {
        ProxyError::ConfigError(e.to_string())
    }
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, ProxyError>;

/// An error raised during an invocation.
///
/// Cloning a `Fault` shares the underlying error; [`Fault::same_as`] tells
/// whether two faults are the same raised instance.
#[derive(Clone)]
pub struct Fault(Arc<dyn StdError + Send + Sync + 'static>);

impl Fault {
    /// Wrap an error
    pub fn new<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self(Arc::new(error))
    }

    /// Fault carrying only a message
    pub fn msg(message: impl Into<String>) -> Self {
        Self::new(MessageFault(message.into()))
    }

    /// Borrow the wrapped error as a concrete type
    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: StdError + 'static,
    {
        self.0.downcast_ref::<E>()
    }

    /// Check the concrete type of the wrapped error
    pub fn is<E>(&self) -> bool
    where
        E: StdError + 'static,
    {
        self.0.is::<E>()
    }

    /// Engine error, if this fault was raised by the engine
    pub fn as_proxy_error(&self) -> Option<&ProxyError> {
        self.downcast_ref::<ProxyError>()
    }

    /// Whether both faults share the same raised error
    pub fn same_as(&self, other: &Fault) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Borrow the wrapped error
    pub fn inner(&self) -> &(dyn StdError + Send + Sync + 'static) {
        self.0.as_ref()
    }
}

impl fmt::Debug for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Fault").field(&self.0).finish()
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl StdError for Fault {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.0.source()
    }
}

impl From<ProxyError> for Fault {
    fn from(e: ProxyError) -> Self {
        Fault::new(e)
    }
}

#[derive(Error, Debug)]
#[error("{0}")]
struct MessageFault(String);
