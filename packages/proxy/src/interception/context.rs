// packages/proxy/src/interception/context.rs
//! Per-call invocation context
//!
//! One context is created for every proxied call and dropped when the call
//! returns. Metadata is fixed at construction; the attribute map lets
//! interceptors of the same call cooperate (e.g. a timing interceptor stores
//! the elapsed time for a recording interceptor further out).

use crate::model::descriptor::{MethodDescriptor, MethodRef};
use crate::model::target::TargetRef;
use crate::model::value::{ObjectRef, Value};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::fmt;
use std::time::{Duration, Instant};
use ulid::Ulid;

/// Call metadata plus a concurrent attribute bag
pub struct InvocationContext {
    call_id: Ulid,
    nano_start: Instant,
    wall_start: DateTime<Utc>,
    proxy: Option<ObjectRef>,
    target: Option<TargetRef>,
    method: MethodRef,
    arguments: Vec<Value>,
    attributes: DashMap<String, Value>,
}

impl InvocationContext {
    /// Create a context; `args` is copied
    pub fn new(
        proxy: Option<ObjectRef>,
        target: Option<TargetRef>,
        method: MethodRef,
        args: &[Value],
    ) -> Self {
        Self {
            call_id: Ulid::new(),
            nano_start: Instant::now(),
            wall_start: Utc::now(),
            proxy,
            target,
            method,
            arguments: args.to_vec(),
            attributes: DashMap::new(),
        }
    }

    /// Unique identifier of this call
    pub fn call_id(&self) -> Ulid {
        self.call_id
    }

    /// Monotonic start time
    pub fn nano_start(&self) -> Instant {
        self.nano_start
    }

    /// Wall-clock start time
    pub fn wall_start(&self) -> DateTime<Utc> {
        self.wall_start
    }

    /// Time since the call started
    pub fn elapsed(&self) -> Duration {
        self.nano_start.elapsed()
    }

    /// Surrogate the call was made on
    pub fn proxy(&self) -> Option<&ObjectRef> {
        self.proxy.as_ref()
    }

    /// Instance the provider returned for this call
    pub fn target(&self) -> Option<&TargetRef> {
        self.target.as_ref()
    }

    pub fn method(&self) -> &MethodDescriptor {
        &self.method
    }

    pub fn method_ref(&self) -> &MethodRef {
        &self.method
    }

    pub fn arguments(&self) -> &[Value] {
        &self.arguments
    }

    pub fn attribute(&self, key: &str) -> Option<Value> {
        self.attributes.get(key).map(|v| v.value().clone())
    }

    /// Set an attribute, returning the previous value
    pub fn set_attribute(&self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.attributes.insert(key.into(), value.into())
    }

    pub fn remove_attribute(&self, key: &str) -> Option<Value> {
        self.attributes.remove(key).map(|(_, v)| v)
    }

    pub fn has_attribute(&self, key: &str) -> bool {
        self.attributes.contains_key(key)
    }

    /// Attribute names, sorted
    pub fn attribute_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.attributes.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }
}

impl fmt::Debug for InvocationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InvocationContext")
            .field("call_id", &self.call_id.to_string())
            .field("method", &self.method.qualified_name())
            .field("arguments", &self.arguments)
            .field("wall_start", &self.wall_start)
            .finish()
    }
}
