// packages/proxy/src/runtime/instance_provider.rs
//! Instance lifecycle strategies
//!
//! An [`InstanceProvider`] yields the concrete object behind a proxy for each
//! call:
//!
//! ```text
//! SingletonProvider     ── same instance, every call, every thread
//! PrototypeProvider     ── factory() on every call
//! ThreadScopedProvider  ── factory() once per thread, cached until remove()
//! ```

use crate::model::target::TargetRef;
use crate::utils::errors::Fault;
use dashmap::DashMap;
use std::fmt;
use std::sync::Arc;
use std::thread::{self, ThreadId};
use tracing::{debug, trace};

/// Factory producing fresh instances
pub type InstanceFactory = Arc<dyn Fn() -> Result<TargetRef, Fault> + Send + Sync>;

/// Strategy yielding the instance behind a proxy
pub trait InstanceProvider: Send + Sync {
    /// Current instance; `None` when the provider has nothing to offer
    fn get(&self) -> Result<Option<TargetRef>, Fault>;

    /// Short strategy name for logs
    fn strategy(&self) -> &'static str;
}

/// Always returns the same instance
#[derive(Clone, Default)]
pub struct SingletonProvider {
    instance: Option<TargetRef>,
}

impl SingletonProvider {
    pub fn new(instance: TargetRef) -> Self {
        Self {
            instance: Some(instance),
        }
    }

    /// Provider without an instance; calls through it fail at the terminal step
    pub fn empty() -> Self {
        Self { instance: None }
    }
}

impl InstanceProvider for SingletonProvider {
    fn get(&self) -> Result<Option<TargetRef>, Fault> {
        Ok(self.instance.clone())
    }

    fn strategy(&self) -> &'static str {
        "singleton"
    }
}

impl fmt::Debug for SingletonProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SingletonProvider")
            .field("present", &self.instance.is_some())
            .finish()
    }
}

/// Creates a new instance on every call
#[derive(Clone)]
pub struct PrototypeProvider {
    factory: InstanceFactory,
}

impl PrototypeProvider {
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn() -> Result<TargetRef, Fault> + Send + Sync + 'static,
    {
        Self {
            factory: Arc::new(factory),
        }
    }
}

impl InstanceProvider for PrototypeProvider {
    fn get(&self) -> Result<Option<TargetRef>, Fault> {
        trace!("Creating prototype instance");
        (self.factory)().map(Some)
    }

    fn strategy(&self) -> &'static str {
        "prototype"
    }
}

/// Creates one instance per calling thread
///
/// Cached instances live until [`ThreadScopedProvider::remove`] is called on the
/// owning thread. There is no automatic expiry, so pooled threads keep their
/// instance for as long as the provider lives.
pub struct ThreadScopedProvider {
    factory: InstanceFactory,
    instances: DashMap<ThreadId, TargetRef>,
}

impl ThreadScopedProvider {
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn() -> Result<TargetRef, Fault> + Send + Sync + 'static,
    {
        Self {
            factory: Arc::new(factory),
            instances: DashMap::new(),
        }
    }

    /// Drop the calling thread's cached instance
    pub fn remove(&self) -> Option<TargetRef> {
        let id = thread::current().id();
        let removed = self.instances.remove(&id).map(|(_, instance)| instance);
        if removed.is_some() {
            debug!("Cleared thread-scoped instance for {:?}", id);
        }
        removed
    }

    /// Number of threads currently holding an instance
    pub fn cached_count(&self) -> usize {
        self.instances.len()
    }
}

impl InstanceProvider for ThreadScopedProvider {
    fn get(&self) -> Result<Option<TargetRef>, Fault> {
        let id = thread::current().id();

        // Release the shard guard before running the factory.
        if let Some(existing) = self.instances.get(&id).map(|entry| Arc::clone(entry.value())) {
            return Ok(Some(existing));
        }

        debug!("Creating thread-scoped instance for {:?}", id);
        let instance = (self.factory)()?;
        self.instances.insert(id, Arc::clone(&instance));
        Ok(Some(instance))
    }

    fn strategy(&self) -> &'static str {
        "thread"
    }
}

impl fmt::Debug for ThreadScopedProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThreadScopedProvider")
            .field("cached", &self.instances.len())
            .finish()
    }
}
