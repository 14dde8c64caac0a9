// packages/proxy/src/model/target.rs
//! Objects that can receive proxied calls

use crate::model::descriptor::{MethodDescriptor, TypeRef};
use crate::model::value::Value;
use crate::utils::errors::{Fault, ProxyError};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Shared target reference
pub type TargetRef = Arc<dyn Target>;

/// An object whose methods can be called dynamically.
///
/// The terminal step of every proxied call lands in [`Target::call`], either
/// on the primary instance or on a mixin delegate.
pub trait Target: Send + Sync + 'static {
    /// Runtime type of this object
    fn type_descriptor(&self) -> TypeRef;

    /// Invoke `method` with `args`
    fn call(&self, method: &MethodDescriptor, args: &[Value]) -> Result<Value, Fault>;
}

type Handler = Arc<dyn Fn(&[Value]) -> Result<Value, Fault> + Send + Sync>;

/// Closure-backed target
///
/// Handlers are looked up by method name. Calling a method without a handler
/// fails with [`ProxyError::UnknownMethod`].
#[derive(Clone)]
pub struct FnTarget {
    ty: TypeRef,
    handlers: HashMap<String, Handler>,
}

impl FnTarget {
    pub fn new(ty: &TypeRef) -> Self {
        Self {
            ty: Arc::clone(ty),
            handlers: HashMap::new(),
        }
    }

    /// Register the handler for `method`
    pub fn on<F>(mut self, method: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, Fault> + Send + Sync + 'static,
    {
        self.handlers.insert(method.into(), Arc::new(handler));
        self
    }

    /// Finish as a shared target
    pub fn into_ref(self) -> TargetRef {
        Arc::new(self)
    }
}

impl Target for FnTarget {
    fn type_descriptor(&self) -> TypeRef {
        Arc::clone(&self.ty)
    }

    fn call(&self, method: &MethodDescriptor, args: &[Value]) -> Result<Value, Fault> {
        match self.handlers.get(method.name()) {
            Some(handler) => handler(args),
            None => Err(ProxyError::UnknownMethod {
                method: method.qualified_name(),
                proxy: self.ty.name().to_string(),
            }
            .into()),
        }
    }
}

impl fmt::Debug for FnTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut methods: Vec<_> = self.handlers.keys().collect();
        methods.sort();
        f.debug_struct("FnTarget")
            .field("type", &self.ty.name())
            .field("methods", &methods)
            .finish()
    }
}
