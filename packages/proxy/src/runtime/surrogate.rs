// packages/proxy/src/runtime/surrogate.rs
//! Proxy surrogate
//!
//! [`Proxy`] is the object callers hold instead of the real target. It
//! exposes a fixed capability set and forwards every call to its
//! [`Dispatcher`]. Clones share identity.

use crate::definition::proxy_definition::ProxyDefinition;
use crate::model::descriptor::{MethodDescriptor, MethodRef, ObjectMethod, TypeRef};
use crate::model::target::Target;
use crate::model::value::{ObjectRef, Value};
use crate::runtime::dispatcher::Dispatcher;
use crate::utils::errors::{Fault, ProxyError};
use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

struct ProxyInner {
    dispatcher: Dispatcher,
    capabilities: Vec<TypeRef>,
    /// Names of exposed capabilities and all their ancestors
    exposed: HashSet<String>,
}

/// Generated stand-in for a target
#[derive(Clone)]
pub struct Proxy {
    inner: Arc<ProxyInner>,
}

impl Proxy {
    pub(crate) fn new(dispatcher: Dispatcher, capabilities: Vec<TypeRef>) -> Self {
        let exposed = capabilities
            .iter()
            .flat_map(|c| {
                std::iter::once(c.name().to_string())
                    .chain(c.ancestors().into_iter().map(|a| a.name().to_string()))
            })
            .collect();

        Self {
            inner: Arc::new(ProxyInner {
                dispatcher,
                capabilities,
                exposed,
            }),
        }
    }

    /// Call `method` with `args`.
    ///
    /// Identity operations are always accepted. Any other method must be
    /// declared by an exposed capability and receive exactly its declared
    /// number of arguments.
    pub fn invoke(&self, method: &MethodRef, args: &[Value]) -> Result<Value, Fault> {
        if ObjectMethod::classify(method).is_none() {
            if !self.inner.exposed.contains(method.declaring()) {
                return Err(self.unknown(method.qualified_name()));
            }
            if method.param_count() != args.len() {
                return Err(ProxyError::ArgumentMismatch {
                    method: method.qualified_name(),
                    expected: method.param_count(),
                    actual: args.len(),
                }
                .into());
            }
        }

        self.inner.dispatcher.dispatch(&self.as_object_ref(), method, args)
    }

    /// Call a method by name
    pub fn call(&self, name: &str, args: &[Value]) -> Result<Value, Fault> {
        let method = self.resolve(name, args.len())?;
        self.invoke(&method, args)
    }

    fn resolve(&self, name: &str, arity: usize) -> Result<MethodRef, Fault> {
        if let Some(method) = self.inner.capabilities.iter().find_map(|c| c.method(name)) {
            return Ok(method);
        }

        ObjectMethod::classify(&MethodDescriptor::new(name).arity(arity))
            .map(ObjectMethod::descriptor)
            .ok_or_else(|| self.unknown(name.to_string()))
    }

    fn unknown(&self, method: String) -> Fault {
        ProxyError::UnknownMethod {
            method,
            proxy: self.inner.dispatcher.label(),
        }
        .into()
    }

    /// Exposed capabilities
    pub fn capabilities(&self) -> &[TypeRef] {
        &self.inner.capabilities
    }

    /// Whether the proxy can be used as `capability`
    pub fn implements(&self, capability: &str) -> bool {
        self.inner.exposed.contains(capability)
    }

    pub fn engine_name(&self) -> &str {
        self.inner.dispatcher.engine_name()
    }

    pub fn definition(&self) -> &Arc<ProxyDefinition> {
        self.inner.dispatcher.definition()
    }

    /// Identity hash; stable for the lifetime of the proxy and shared by clones
    pub fn identity_hash(&self) -> i64 {
        self.identity(ObjectMethod::Hash, &[]).as_int().unwrap_or_default()
    }

    fn identity(&self, op: ObjectMethod, args: &[Value]) -> Value {
        self.inner.dispatcher.identity(op, &self.as_object_ref(), args)
    }

    /// The proxy as a value, e.g. as the argument of `equals`
    pub fn as_object(&self) -> Value {
        Value::Object(self.as_object_ref())
    }

    fn as_object_ref(&self) -> ObjectRef {
        Arc::clone(&self.inner) as ObjectRef
    }
}

impl Target for Proxy {
    fn type_descriptor(&self) -> TypeRef {
        Arc::clone(self.definition().target_type())
    }

    fn call(&self, method: &MethodDescriptor, args: &[Value]) -> Result<Value, Fault> {
        let method = self
            .inner
            .capabilities
            .iter()
            .find_map(|c| c.method(method.name()))
            .unwrap_or_else(|| Arc::new(method.clone()));
        self.invoke(&method, args)
    }
}

impl fmt::Display for Proxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = self.identity(ObjectMethod::ToString, &[]);
        f.write_str(label.as_str().unwrap_or_default())
    }
}

impl fmt::Debug for Proxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Proxy")
            .field("label", &self.inner.dispatcher.label())
            .field(
                "capabilities",
                &self.inner.capabilities.iter().map(|c| c.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl PartialEq for Proxy {
    fn eq(&self, other: &Self) -> bool {
        self.identity(ObjectMethod::Equals, &[other.as_object()])
            .as_bool()
            .unwrap_or(false)
    }
}

impl Eq for Proxy {}

impl Hash for Proxy {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identity_hash().hash(state);
    }
}
