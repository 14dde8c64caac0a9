// packages/proxy/src/runtime/engine.rs
//! Proxy engines
//!
//! An engine turns a [`ProxyDefinition`] into a [`Proxy`]. Only the
//! capability-based engine exists today; the trait leaves room for engines
//! that can proxy concrete types.

use crate::definition::proxy_definition::ProxyDefinition;
use crate::model::descriptor::{TypeDescriptor, TypeRef};
use crate::runtime::dispatcher::Dispatcher;
use crate::runtime::surrogate::Proxy;
use crate::utils::errors::{ProxyError, Result};
use once_cell::sync::Lazy;
use std::sync::Arc;
use tracing::debug;

/// Name of the capability injected when a proxy would expose nothing
pub const MARKER_CAPABILITY: &str = "ProxyMarker";

static MARKER: Lazy<TypeRef> = Lazy::new(|| TypeDescriptor::capability(MARKER_CAPABILITY).build());

/// Strategy for building surrogates
pub trait ProxyEngine: Send + Sync {
    fn name(&self) -> &str;

    /// Whether this engine can build a proxy for `definition`
    fn supports(&self, definition: &ProxyDefinition) -> bool;

    fn create_proxy(&self, definition: Arc<ProxyDefinition>) -> Result<Proxy>;
}

/// Builds proxies that expose capabilities only
#[derive(Debug, Clone, Copy, Default)]
pub struct CapabilityEngine;

impl CapabilityEngine {
    pub const NAME: &'static str = "capability";

    /// Target capabilities, then extra capabilities, then mixin capabilities,
    /// without duplicates. Falls back to the marker capability.
    pub fn capability_set(definition: &ProxyDefinition) -> Vec<TypeRef> {
        let mut out: Vec<TypeRef> = Vec::new();
        let candidates = definition
            .target_type()
            .capabilities()
            .into_iter()
            .chain(definition.extra_capabilities().iter().cloned())
            .chain(definition.mixins().capabilities().iter().cloned());

        for capability in candidates {
            if !out.iter().any(|c| c.name() == capability.name()) {
                out.push(capability);
            }
        }

        if out.is_empty() {
            debug!(
                "No capabilities for {}, injecting {}",
                definition.target_type().name(),
                MARKER_CAPABILITY
            );
            out.push(Arc::clone(&MARKER));
        }

        out
    }
}

impl ProxyEngine for CapabilityEngine {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn supports(&self, definition: &ProxyDefinition) -> bool {
        definition.target_type().is_capability() || !definition.extra_capabilities().is_empty()
    }

    fn create_proxy(&self, definition: Arc<ProxyDefinition>) -> Result<Proxy> {
        if !self.supports(&definition) {
            return Err(ProxyError::UnsupportedTarget(
                definition.target_type().name().to_string(),
            ));
        }

        let capabilities = Self::capability_set(&definition);
        debug!(
            "Creating {} proxy for {} exposing {:?}",
            Self::NAME,
            definition.target_type().name(),
            capabilities.iter().map(|c| c.name()).collect::<Vec<_>>()
        );

        let dispatcher = Dispatcher::new(Self::NAME, definition);
        Ok(Proxy::new(dispatcher, capabilities))
    }
}
