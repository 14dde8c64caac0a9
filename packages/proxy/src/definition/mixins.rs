// packages/proxy/src/definition/mixins.rs
//! Capability overrides
//!
//! A mixin replaces the primary target for every method of one capability.
//! The map is built once and never mutated; delegates are shared, not copied.

use crate::model::descriptor::TypeRef;
use crate::model::target::TargetRef;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Immutable capability → delegate map
#[derive(Clone, Default)]
pub struct Mixins {
    delegates: Arc<HashMap<String, TargetRef>>,
    capabilities: Arc<Vec<TypeRef>>,
}

impl Mixins {
    /// No mixins
    pub fn empty() -> Self {
        Self::default()
    }

    /// Register `instance` for every capability it satisfies
    pub fn from_instance(instance: TargetRef) -> Self {
        let capabilities = instance.type_descriptor().capabilities();
        let mut builder = Self::builder();
        for capability in &capabilities {
            builder = builder.with(capability, Arc::clone(&instance));
        }
        builder.build()
    }

    pub fn builder() -> MixinsBuilder {
        MixinsBuilder::default()
    }

    /// Delegate serving `capability`, if any
    pub fn implementation_for(&self, capability: &str) -> Option<TargetRef> {
        self.delegates.get(capability).cloned()
    }

    /// Capabilities with a registered delegate, in registration order
    pub fn capabilities(&self) -> &[TypeRef] {
        &self.capabilities
    }

    pub fn len(&self) -> usize {
        self.delegates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.delegates.is_empty()
    }
}

impl fmt::Debug for Mixins {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.capabilities.iter().map(|c| c.name()))
            .finish()
    }
}

/// Builder for [`Mixins`]
#[derive(Default)]
pub struct MixinsBuilder {
    delegates: HashMap<String, TargetRef>,
    capabilities: Vec<TypeRef>,
}

impl MixinsBuilder {
    /// Serve `capability` with `delegate`; a later registration replaces an
    /// earlier one for the same capability
    pub fn with(mut self, capability: &TypeRef, delegate: TargetRef) -> Self {
        debug!("Registering mixin for capability {}", capability.name());
        if self
            .delegates
            .insert(capability.name().to_string(), delegate)
            .is_none()
        {
            self.capabilities.push(Arc::clone(capability));
        }
        self
    }

    pub fn build(self) -> Mixins {
        Mixins {
            delegates: Arc::new(self.delegates),
            capabilities: Arc::new(self.capabilities),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::descriptor::TypeDescriptor;
    use crate::model::target::FnTarget;
    use crate::model::value::Value;

    #[test]
    fn test_from_instance_registers_all_capabilities() {
        let audited = TypeDescriptor::capability("Audited").build();
        let tagged = TypeDescriptor::capability("Tagged").build();
        let impl_ty = TypeDescriptor::concrete("AuditTrail")
            .extends(&audited)
            .extends(&tagged)
            .build();

        let mixins = Mixins::from_instance(FnTarget::new(&impl_ty).into_ref());
        assert_eq!(mixins.len(), 2);
        assert!(mixins.implementation_for("Audited").is_some());
        assert!(mixins.implementation_for("Tagged").is_some());
        assert!(mixins.implementation_for("AuditTrail").is_none());
    }

    #[test]
    fn test_empty() {
        let mixins = Mixins::empty();
        assert!(mixins.is_empty());
        assert!(mixins.implementation_for("Anything").is_none());
    }

    #[test]
    fn test_later_registration_wins() {
        let cap = TypeDescriptor::capability("Clock").build();
        let first = FnTarget::new(&cap).on("now", |_| Ok(Value::from(1))).into_ref();
        let second = FnTarget::new(&cap).on("now", |_| Ok(Value::from(2))).into_ref();

        let mixins = Mixins::builder().with(&cap, first).with(&cap, second).build();
        assert_eq!(mixins.len(), 1);
        assert_eq!(mixins.capabilities().len(), 1);

        let now = crate::model::MethodDescriptor::new("now");
        let delegate = mixins.implementation_for("Clock").unwrap();
        assert_eq!(delegate.call(&now, &[]).unwrap(), Value::from(2));
    }
}
