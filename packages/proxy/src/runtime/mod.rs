// packages/proxy/src/runtime/mod.rs
//! Proxy runtime
//!
//! This module turns definitions into live proxies and routes their calls:
//!
//! - **Instance Provider**: Singleton, prototype and thread-scoped instances
//! - **Engine**: Builds surrogates from definitions
//! - **Factory**: Picks the engine for a definition
//! - **Dispatcher**: Identity operations, policy check, pipeline, terminal
//! - **Surrogate**: The `Proxy` handle callers hold
//!
//! # Architecture
//!
//! ```text
//! ProxyDefinition ──► ProxyFactory ──► ProxyEngine ──► Proxy
//!                                                        │
//!                               proxy.call(method, args) │
//!                                                        ▼
//!                                                   Dispatcher
//!                      ┌─────────────────┬───────────────┴───────────┐
//!                      ▼                 ▼                           ▼
//!               identity ops      policy excluded              Pipeline
//!              (no interceptors)  (instance directly)   interceptors → terminal
//!                                                        (mixin or instance)
//! ```
//!
//! Every call runs synchronously on the caller's thread.

pub mod dispatcher;
pub mod engine;
pub mod factory;
pub mod instance_provider;
pub mod surrogate;

// Re-export commonly used types
pub use dispatcher::{Dispatcher, TerminalResolver};
pub use engine::{CapabilityEngine, ProxyEngine, MARKER_CAPABILITY};
pub use factory::ProxyFactory;
pub use instance_provider::{
    InstanceFactory, InstanceProvider, PrototypeProvider, SingletonProvider, ThreadScopedProvider,
};
pub use surrogate::Proxy;
