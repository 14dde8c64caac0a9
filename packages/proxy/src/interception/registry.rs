// packages/proxy/src/interception/registry.rs
//! Interceptor registry
//!
//! Keeps `(interceptor, matcher, order)` entries sorted by order ascending.
//! Lower orders run first (outermost); equal orders keep registration order.

use crate::interception::interceptor::Interceptor;
use crate::interception::matcher::InterceptorMatcher;
use crate::model::descriptor::{TypeDescriptor, TypeRef};
use parking_lot::RwLock;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// Registration entry
#[derive(Clone)]
pub struct RegistryEntry {
    /// The interceptor
    pub interceptor: Arc<dyn Interceptor>,

    /// Types the interceptor applies to
    pub matcher: InterceptorMatcher,

    /// Position in the chain (lower = outermost)
    pub order: i32,

    /// Registration sequence, breaks ties between equal orders
    pub sequence: u64,
}

impl fmt::Debug for RegistryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryEntry")
            .field("interceptor", &self.interceptor.name())
            .field("matcher", &self.matcher)
            .field("order", &self.order)
            .field("sequence", &self.sequence)
            .finish()
    }
}

/// Ordered interceptor registry
pub struct InterceptorRegistry {
    entries: RwLock<Vec<RegistryEntry>>,
    sequence: AtomicU64,
}

impl InterceptorRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            sequence: AtomicU64::new(0),
        }
    }

    /// Register an interceptor
    pub fn register(
        &self,
        interceptor: Arc<dyn Interceptor>,
        matcher: InterceptorMatcher,
        order: i32,
    ) {
        info!(
            "Registering interceptor {} (order {}) for {:?}",
            interceptor.name(),
            order,
            matcher
        );

        let mut entries = self.entries.write();
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst);
        entries.push(RegistryEntry {
            interceptor,
            matcher,
            order,
            sequence,
        });
        entries.sort_by_key(|e| (e.order, e.sequence));
    }

    /// Register an interceptor for a set of target types
    pub fn register_for_types<I>(&self, interceptor: Arc<dyn Interceptor>, types: I, order: i32)
    where
        I: IntoIterator<Item = TypeRef>,
    {
        self.register(interceptor, InterceptorMatcher::types(types), order);
    }

    /// Interceptors applying to `ty`, outermost first
    pub fn select(&self, ty: &TypeDescriptor) -> Vec<Arc<dyn Interceptor>> {
        let entries = self.entries.read();
        let selected: Vec<_> = entries
            .iter()
            .filter(|e| e.matcher.matches(ty))
            .map(|e| Arc::clone(&e.interceptor))
            .collect();

        debug!(
            "Selected {} of {} interceptor(s) for {}",
            selected.len(),
            entries.len(),
            ty.name()
        );

        selected
    }

    /// Snapshot of all entries in chain order
    pub fn entries(&self) -> Vec<RegistryEntry> {
        self.entries.read().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Remove every entry
    pub fn clear(&self) {
        self.entries.write().clear();
        info!("Cleared all interceptor registrations");
    }
}

impl Default for InterceptorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for InterceptorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.entries.read().iter()).finish()
    }
}
