// packages/proxy/src/definition/proxy_definition.rs
//! Proxy definitions
//!
//! A [`ProxyDefinition`] is the frozen description of one proxy. It is built
//! once through [`ProxyDefinitionBuilder`] and then shared read-only by the
//! engine, the dispatcher and every call.

use crate::definition::mixins::Mixins;
use crate::definition::policy::InterceptionPolicy;
use crate::interception::interceptor::Interceptor;
use crate::interception::registry::InterceptorRegistry;
use crate::model::descriptor::TypeRef;
use crate::model::target::TargetRef;
use crate::runtime::instance_provider::{InstanceProvider, SingletonProvider};
use crate::utils::errors::{ProxyError, Result};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Immutable description of one proxy
pub struct ProxyDefinition {
    target_type: TypeRef,
    instance_provider: Arc<dyn InstanceProvider>,
    interceptors: Vec<Arc<dyn Interceptor>>,
    extra_capabilities: Vec<TypeRef>,
    mixins: Mixins,
    policy: InterceptionPolicy,
    engine_hint: Option<String>,
}

impl ProxyDefinition {
    pub fn builder() -> ProxyDefinitionBuilder {
        ProxyDefinitionBuilder::default()
    }

    pub fn target_type(&self) -> &TypeRef {
        &self.target_type
    }

    pub fn instance_provider(&self) -> &Arc<dyn InstanceProvider> {
        &self.instance_provider
    }

    /// Interceptors, outermost first
    pub fn interceptors(&self) -> &[Arc<dyn Interceptor>] {
        &self.interceptors
    }

    pub fn extra_capabilities(&self) -> &[TypeRef] {
        &self.extra_capabilities
    }

    pub fn mixins(&self) -> &Mixins {
        &self.mixins
    }

    pub fn policy(&self) -> &InterceptionPolicy {
        &self.policy
    }

    /// Preferred engine name, if any
    pub fn engine_hint(&self) -> Option<&str> {
        self.engine_hint.as_deref()
    }
}

impl fmt::Debug for ProxyDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyDefinition")
            .field("target_type", &self.target_type.name())
            .field("instance_provider", &self.instance_provider.strategy())
            .field(
                "interceptors",
                &self.interceptors.iter().map(|i| i.name()).collect::<Vec<_>>(),
            )
            .field(
                "extra_capabilities",
                &self.extra_capabilities.iter().map(|t| t.name()).collect::<Vec<_>>(),
            )
            .field("mixins", &self.mixins)
            .field("policy", &self.policy)
            .field("engine_hint", &self.engine_hint)
            .finish()
    }
}

/// Accumulates the parts of a [`ProxyDefinition`]
#[derive(Default)]
pub struct ProxyDefinitionBuilder {
    target_type: Option<TypeRef>,
    instance_provider: Option<Arc<dyn InstanceProvider>>,
    interceptors: Vec<Arc<dyn Interceptor>>,
    extra_capabilities: Vec<TypeRef>,
    mixins: Mixins,
    policy: InterceptionPolicy,
    engine_hint: Option<String>,
}

impl ProxyDefinitionBuilder {
    pub fn target_type(mut self, ty: &TypeRef) -> Self {
        self.target_type = Some(Arc::clone(ty));
        self
    }

    /// Append an interceptor (innermost so far)
    pub fn interceptor(mut self, interceptor: Arc<dyn Interceptor>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    pub fn interceptors<I>(mut self, interceptors: I) -> Self
    where
        I: IntoIterator<Item = Arc<dyn Interceptor>>,
    {
        self.interceptors.extend(interceptors);
        self
    }

    /// Append the registry's selection for the target type.
    ///
    /// The target type must be set first; otherwise nothing is appended.
    pub fn interceptors_from(self, registry: &InterceptorRegistry) -> Self {
        let selected = match &self.target_type {
            Some(ty) => registry.select(ty),
            None => {
                debug!("interceptors_from called before target_type, nothing selected");
                Vec::new()
            }
        };
        self.interceptors(selected)
    }

    /// Expose an additional capability; duplicates are ignored
    pub fn extra_capability(mut self, capability: &TypeRef) -> Self {
        if !self
            .extra_capabilities
            .iter()
            .any(|c| c.name() == capability.name())
        {
            self.extra_capabilities.push(Arc::clone(capability));
        }
        self
    }

    pub fn mixins(mut self, mixins: Mixins) -> Self {
        self.mixins = mixins;
        self
    }

    pub fn policy(mut self, policy: InterceptionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn instance_provider(mut self, provider: Arc<dyn InstanceProvider>) -> Self {
        self.instance_provider = Some(provider);
        self
    }

    /// Shorthand for a singleton provider of `target`
    pub fn singleton(self, target: TargetRef) -> Self {
        self.instance_provider(Arc::new(SingletonProvider::new(target)))
    }

    /// Prefer the engine with this name
    pub fn engine_hint(mut self, engine: impl Into<String>) -> Self {
        self.engine_hint = Some(engine.into());
        self
    }

    /// Freeze the definition.
    ///
    /// Only the target type is required. Without an instance provider the
    /// proxy resolves to no instance and calls fail with
    /// [`ProxyError::NullTarget`] when they reach the target.
    pub fn build(self) -> Result<ProxyDefinition> {
        let target_type = self
            .target_type
            .ok_or_else(|| ProxyError::ConfigError("Proxy definition requires a target type".into()))?;

        let instance_provider = self
            .instance_provider
            .unwrap_or_else(|| Arc::new(SingletonProvider::empty()));

        debug!(
            "Built proxy definition for {} ({} interceptor(s), {} provider)",
            target_type.name(),
            self.interceptors.len(),
            instance_provider.strategy()
        );

        Ok(ProxyDefinition {
            target_type,
            instance_provider,
            interceptors: self.interceptors,
            extra_capabilities: self.extra_capabilities,
            mixins: self.mixins,
            policy: self.policy,
            engine_hint: self.engine_hint,
        })
    }
}
