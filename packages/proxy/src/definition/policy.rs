// packages/proxy/src/definition/policy.rs
//! Interception policy: which methods are eligible for interception

use crate::model::descriptor::MethodDescriptor;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

type Predicate = Arc<dyn Fn(&MethodDescriptor) -> bool + Send + Sync>;

/// Predicate over method descriptors
///
/// Methods rejected by the policy bypass every interceptor and go straight to
/// the instance.
#[derive(Clone)]
pub struct InterceptionPolicy {
    description: String,
    predicate: Predicate,
}

impl InterceptionPolicy {
    /// Intercept everything
    pub fn all() -> Self {
        Self::named("all", |_| true)
    }

    /// Intercept nothing
    pub fn none() -> Self {
        Self::named("none", |_| false)
    }

    /// Intercept everything except the named methods
    pub fn excluding<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: HashSet<String> = names.into_iter().map(Into::into).collect();
        let mut listed: Vec<_> = names.iter().cloned().collect();
        listed.sort();
        Self::named(format!("excluding {:?}", listed), move |m| {
            !names.contains(m.name())
        })
    }

    /// Intercept only methods carrying `annotation`
    pub fn only_annotated(annotation: impl Into<String>) -> Self {
        let annotation = annotation.into();
        Self::named(format!("annotated @{}", annotation), move |m| {
            m.has_annotation(&annotation)
        })
    }

    /// Arbitrary predicate
    pub fn from_fn<F>(predicate: F) -> Self
    where
        F: Fn(&MethodDescriptor) -> bool + Send + Sync + 'static,
    {
        Self::named("custom", predicate)
    }

    fn named<F>(description: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&MethodDescriptor) -> bool + Send + Sync + 'static,
    {
        Self {
            description: description.into(),
            predicate: Arc::new(predicate),
        }
    }

    /// Whether calls to `method` go through the interceptor chain
    pub fn allows(&self, method: &MethodDescriptor) -> bool {
        (self.predicate)(method)
    }
}

impl Default for InterceptionPolicy {
    fn default() -> Self {
        Self::all()
    }
}

impl fmt::Debug for InterceptionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InterceptionPolicy({})", self.description)
    }
}
