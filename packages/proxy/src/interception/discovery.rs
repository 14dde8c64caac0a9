// packages/proxy/src/interception/discovery.rs
//! Interceptor discovery
//!
//! A discovery service returns declarations of the form
//! `(interceptor, target types, priority)`. A [`Registrar`] turns them into
//! registry entries exactly once.

use crate::interception::interceptor::Interceptor;
use crate::interception::registry::InterceptorRegistry;
use crate::model::descriptor::TypeRef;
use crate::utils::config::InterceptionConfig;
use crate::utils::errors::{ProxyError, Result};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// "Intercept these target types" metadata for one interceptor
#[derive(Clone)]
pub struct InterceptorDeclaration {
    pub interceptor: Arc<dyn Interceptor>,
    pub target_types: Vec<TypeRef>,
    pub priority: i32,
}

impl InterceptorDeclaration {
    pub fn new<I>(interceptor: Arc<dyn Interceptor>, target_types: I, priority: i32) -> Self
    where
        I: IntoIterator<Item = TypeRef>,
    {
        Self {
            interceptor,
            target_types: target_types.into_iter().collect(),
            priority,
        }
    }
}

impl fmt::Debug for InterceptorDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterceptorDeclaration")
            .field("interceptor", &self.interceptor.name())
            .field(
                "target_types",
                &self.target_types.iter().map(|t| t.name()).collect::<Vec<_>>(),
            )
            .field("priority", &self.priority)
            .finish()
    }
}

/// Source of interceptor declarations
pub trait InterceptorDiscovery: Send + Sync {
    /// Name of the source for logs
    fn source(&self) -> &str;

    fn discover(&self) -> Result<Vec<InterceptorDeclaration>>;
}

/// Fixed list of declarations
#[derive(Debug, Clone, Default)]
pub struct StaticDiscovery {
    declarations: Vec<InterceptorDeclaration>,
}

impl StaticDiscovery {
    pub fn new(declarations: Vec<InterceptorDeclaration>) -> Self {
        Self { declarations }
    }

    pub fn declare<I>(mut self, interceptor: Arc<dyn Interceptor>, target_types: I, priority: i32) -> Self
    where
        I: IntoIterator<Item = TypeRef>,
    {
        self.declarations
            .push(InterceptorDeclaration::new(interceptor, target_types, priority));
        self
    }
}

impl InterceptorDiscovery for StaticDiscovery {
    fn source(&self) -> &str {
        "static"
    }

    fn discover(&self) -> Result<Vec<InterceptorDeclaration>> {
        Ok(self.declarations.clone())
    }
}

/// Declarations read from [`InterceptionConfig::bindings`]
///
/// Interceptor and type names in the configuration are resolved against the
/// catalogs supplied by the caller. Unknown names are configuration errors.
pub struct ConfigDiscovery {
    config: InterceptionConfig,
    interceptors: HashMap<String, Arc<dyn Interceptor>>,
    types: HashMap<String, TypeRef>,
}

impl ConfigDiscovery {
    pub fn new(config: InterceptionConfig) -> Self {
        Self {
            config,
            interceptors: HashMap::new(),
            types: HashMap::new(),
        }
    }

    /// Make an interceptor resolvable by name
    pub fn with_interceptor(mut self, name: impl Into<String>, interceptor: Arc<dyn Interceptor>) -> Self {
        self.interceptors.insert(name.into(), interceptor);
        self
    }

    /// Make a type resolvable by its name
    pub fn with_type(mut self, ty: &TypeRef) -> Self {
        self.types.insert(ty.name().to_string(), Arc::clone(ty));
        self
    }
}

impl InterceptorDiscovery for ConfigDiscovery {
    fn source(&self) -> &str {
        "config"
    }

    fn discover(&self) -> Result<Vec<InterceptorDeclaration>> {
        self.config
            .bindings
            .iter()
            .map(|binding| {
                let interceptor = self.interceptors.get(&binding.interceptor).ok_or_else(|| {
                    ProxyError::ConfigError(format!(
                        "Unknown interceptor in binding: {}",
                        binding.interceptor
                    ))
                })?;

                let target_types = binding
                    .targets
                    .iter()
                    .map(|name| {
                        self.types.get(name).cloned().ok_or_else(|| {
                            ProxyError::ConfigError(format!(
                                "Unknown target type in binding for {}: {}",
                                binding.interceptor, name
                            ))
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;

                Ok(InterceptorDeclaration {
                    interceptor: Arc::clone(interceptor),
                    target_types,
                    priority: binding.priority.unwrap_or(self.config.default_priority),
                })
            })
            .collect()
    }
}

/// Registers discovered interceptors, once
pub struct Registrar {
    registry: Arc<InterceptorRegistry>,
    scanned: AtomicBool,
}

impl Registrar {
    pub fn new(registry: Arc<InterceptorRegistry>) -> Self {
        Self {
            registry,
            scanned: AtomicBool::new(false),
        }
    }

    /// Register every declaration from `discovery`.
    ///
    /// Only the first successful scan registers anything; later scans return
    /// `Ok(0)`. A failing discovery leaves the registrar unscanned.
    pub fn scan(&self, discovery: &dyn InterceptorDiscovery) -> Result<usize> {
        if self
            .scanned
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("Registrar already scanned, ignoring {} discovery", discovery.source());
            return Ok(0);
        }

        let declarations = match discovery.discover() {
            Ok(declarations) => declarations,
            Err(e) => {
                self.scanned.store(false, Ordering::SeqCst);
                return Err(e);
            }
        };

        let count = declarations.len();
        for declaration in declarations {
            self.registry.register_for_types(
                declaration.interceptor,
                declaration.target_types,
                declaration.priority,
            );
        }

        info!("Registered {} interceptor(s) from {} discovery", count, discovery.source());
        Ok(count)
    }

    pub fn is_scanned(&self) -> bool {
        self.scanned.load(Ordering::SeqCst)
    }

    pub fn registry(&self) -> &Arc<InterceptorRegistry> {
        &self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::descriptor::TypeDescriptor;
    use crate::utils::config::BindingConfig;

    struct Named(&'static str);

    impl Interceptor for Named {
        fn name(&self) -> &str {
            self.0
        }
    }

    #[test]
    fn test_scan_once() {
        let service = TypeDescriptor::capability("Service").build();
        let discovery = StaticDiscovery::default()
            .declare(Arc::new(Named("audit")), [service.clone()], 5)
            .declare(Arc::new(Named("retry")), [service.clone()], 1);

        let registrar = Registrar::new(Arc::new(InterceptorRegistry::new()));
        assert!(!registrar.is_scanned());
        assert_eq!(registrar.scan(&discovery).unwrap(), 2);
        assert_eq!(registrar.scan(&discovery).unwrap(), 0);
        assert!(registrar.is_scanned());

        let selected = registrar.registry().select(&service);
        let names: Vec<_> = selected.iter().map(|i| i.name().to_string()).collect();
        assert_eq!(names, vec!["retry", "audit"]);
    }

    fn binding(interceptor: &str, targets: &[&str], priority: Option<i32>) -> BindingConfig {
        BindingConfig {
            interceptor: interceptor.to_string(),
            targets: targets.iter().map(|t| t.to_string()).collect(),
            priority,
        }
    }

    #[test]
    fn test_config_discovery_resolves_names() {
        let service = TypeDescriptor::capability("Service").build();
        let config = InterceptionConfig {
            default_priority: 42,
            bindings: vec![
                binding("audit", &["Service"], Some(1)),
                binding("timing", &["Service"], None),
            ],
        };

        let discovery = ConfigDiscovery::new(config)
            .with_interceptor("audit", Arc::new(Named("audit")))
            .with_interceptor("timing", Arc::new(Named("timing")))
            .with_type(&service);

        let declarations = discovery.discover().unwrap();
        assert_eq!(declarations.len(), 2);
        assert_eq!(declarations[0].priority, 1);
        assert_eq!(declarations[1].priority, 42);
        assert_eq!(declarations[1].target_types[0].name(), "Service");
    }

    #[test]
    fn test_failed_discovery_allows_retry() {
        let config = InterceptionConfig {
            default_priority: 0,
            bindings: vec![binding("missing", &[], None)],
        };
        let broken = ConfigDiscovery::new(config);

        let registrar = Registrar::new(Arc::new(InterceptorRegistry::new()));
        let err = registrar.scan(&broken).unwrap_err();
        assert!(matches!(err, ProxyError::ConfigError(_)));
        assert!(!registrar.is_scanned());

        let service = TypeDescriptor::capability("Service").build();
        let working = StaticDiscovery::default().declare(Arc::new(Named("audit")), [service], 0);
        assert_eq!(registrar.scan(&working).unwrap(), 1);
    }

    #[test]
    fn test_unknown_type_is_config_error() {
        let config = InterceptionConfig {
            default_priority: 0,
            bindings: vec![binding("audit", &["Ghost"], None)],
        };
        let discovery = ConfigDiscovery::new(config).with_interceptor("audit", Arc::new(Named("audit")));

        assert!(matches!(discovery.discover(), Err(ProxyError::ConfigError(msg)) if msg.contains("Ghost")));
    }
}
