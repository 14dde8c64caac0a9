// packages/proxy/src/interception/mod.rs
//! Method interception layer
//!
//! This module provides the cross-cutting side of every proxied call:
//!
//! - **Interceptor**: `before` / `invoke` / `after` / `error` hooks
//! - **Context**: Per-call state shared by the interceptors of one call
//! - **Pipeline**: Ordered chain ending in the terminal operation
//! - **Matcher**: Which target types an interceptor applies to
//! - **Registry**: Ordered `(interceptor, matcher, order)` entries
//! - **Discovery**: Declared interceptors registered once
//! - **Built-in**: Tracing, timing and deadline interceptors
//!
//! # Architecture
//!
//! ```text
//! Discovery ──► Registrar ──► InterceptorRegistry
//!                                   │ select(target type)
//!                                   ▼
//!                  ProxyDefinition.interceptors (outermost first)
//!                                   │ assemble
//!                                   ▼
//!                  Pipeline: link 0 → link 1 → ... → terminal
//! ```

pub mod builtin;
pub mod context;
pub mod discovery;
pub mod interceptor;
pub mod matcher;
pub mod pipeline;
pub mod registry;

// Re-export commonly used types
pub use builtin::{DeadlineInterceptor, TimingInterceptor, TracingInterceptor, ELAPSED_US};
pub use context::InvocationContext;
pub use discovery::{
    ConfigDiscovery, InterceptorDeclaration, InterceptorDiscovery, Registrar, StaticDiscovery,
};
pub use interceptor::Interceptor;
pub use matcher::InterceptorMatcher;
pub use pipeline::{terminal_fn, Invocation, Pipeline, Terminal};
pub use registry::{InterceptorRegistry, RegistryEntry};
