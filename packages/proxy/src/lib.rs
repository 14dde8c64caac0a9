// packages/proxy/src/lib.rs
//! Sentra Lab Proxy & Method-Interception Engine
//!
//! Wraps a target object in a surrogate, routes every call made on the
//! surrogate through an ordered chain of interceptors, and finally delegates
//! to the real target or to a registered mixin.
//!
//! # Architecture
//!
//! The engine is structured into several key modules:
//!
//! - **model**: Type/method descriptors, dynamic values, call targets
//! - **definition**: Proxy definitions, mixins, interception policies
//! - **interception**: Interceptors, per-call context, pipeline, registry
//! - **runtime**: Instance providers, engines, dispatcher, the `Proxy` handle
//! - **recording**: Invocation event capture and export
//! - **observability**: Tracing subscriber and metrics recorder setup
//! - **utils**: Errors and configuration
//!
//! # Example
//!
//! ```
//! use sentra_lab_proxy::{FnTarget, MethodDescriptor, ProxyDefinition, ProxyFactory, TypeDescriptor, Value};
//!
//! let greeter = TypeDescriptor::capability("Greeter")
//!     .method(MethodDescriptor::new("greet").arity(1))
//!     .build();
//! let target = FnTarget::new(&greeter)
//!     .on("greet", |args: &[Value]| Ok(Value::Text(format!("hi {}", args[0].as_str().unwrap_or("")))))
//!     .into_ref();
//!
//! let definition = ProxyDefinition::builder()
//!     .target_type(&greeter)
//!     .singleton(target)
//!     .build()
//!     .unwrap();
//! let proxy = ProxyFactory::new().create(definition).unwrap();
//!
//! assert_eq!(proxy.call("greet", &[Value::from("ann")]).unwrap(), Value::from("hi ann"));
//! ```

// Public module exports
pub mod definition;
pub mod interception;
pub mod model;
pub mod observability;
pub mod recording;
pub mod runtime;
pub mod utils;

// Re-export commonly used types
pub use definition::{InterceptionPolicy, Mixins, ProxyDefinition, ProxyDefinitionBuilder};
pub use interception::{
    Interceptor, InterceptorMatcher, InterceptorRegistry, Invocation, InvocationContext, Pipeline,
};
pub use model::{FnTarget, MethodDescriptor, Target, TargetRef, TypeDescriptor, TypeRef, Value};
pub use runtime::{
    CapabilityEngine, InstanceProvider, PrototypeProvider, Proxy, ProxyEngine, ProxyFactory,
    SingletonProvider, ThreadScopedProvider,
};
pub use utils::config::ProxyConfig;
pub use utils::errors::{Fault, ProxyError, Result};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
