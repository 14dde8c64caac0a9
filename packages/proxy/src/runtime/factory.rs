// packages/proxy/src/runtime/factory.rs
//! Engine selection
//!
//! [`ProxyFactory`] holds the available engines in preference order and picks
//! one per definition. A definition's engine hint wins when that engine
//! supports it.

use crate::definition::proxy_definition::ProxyDefinition;
use crate::runtime::engine::{CapabilityEngine, ProxyEngine};
use crate::runtime::surrogate::Proxy;
use crate::utils::errors::{ProxyError, Result};
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

pub struct ProxyFactory {
    engines: Vec<Arc<dyn ProxyEngine>>,
}

impl ProxyFactory {
    /// Factory with the capability engine
    pub fn new() -> Self {
        Self {
            engines: vec![Arc::new(CapabilityEngine)],
        }
    }

    /// Factory with no engines
    pub fn empty() -> Self {
        Self { engines: Vec::new() }
    }

    /// Add an engine after the existing ones
    pub fn with_engine(mut self, engine: Arc<dyn ProxyEngine>) -> Self {
        self.engines.push(engine);
        self
    }

    pub fn engine_names(&self) -> Vec<&str> {
        self.engines.iter().map(|e| e.name()).collect()
    }

    /// Engine that will build `definition`
    pub fn select(&self, definition: &ProxyDefinition) -> Result<Arc<dyn ProxyEngine>> {
        if let Some(hint) = definition.engine_hint() {
            match self.engines.iter().find(|e| e.name() == hint) {
                Some(engine) if engine.supports(definition) => return Ok(Arc::clone(engine)),
                Some(_) => warn!(
                    "Engine {} does not support {}, falling back",
                    hint,
                    definition.target_type().name()
                ),
                None => warn!("Unknown engine hint {}, falling back", hint),
            }
        }

        self.engines
            .iter()
            .find(|e| e.supports(definition))
            .cloned()
            .ok_or_else(|| ProxyError::UnsupportedTarget(definition.target_type().name().to_string()))
    }

    /// Build a proxy for `definition`
    pub fn create(&self, definition: ProxyDefinition) -> Result<Proxy> {
        self.create_shared(Arc::new(definition))
    }

    /// Build a proxy for an already shared definition
    pub fn create_shared(&self, definition: Arc<ProxyDefinition>) -> Result<Proxy> {
        let engine = self.select(&definition)?;
        info!(
            "Creating proxy for {} with {} engine",
            definition.target_type().name(),
            engine.name()
        );
        engine.create_proxy(definition)
    }
}

impl Default for ProxyFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ProxyFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyFactory")
            .field("engines", &self.engine_names())
            .finish()
    }
}
