// packages/proxy/src/definition/mod.rs
//! Proxy definitions
//!
//! Everything a proxy needs to know before its first call: target type,
//! instance provider, interceptors, mixins and interception policy.

pub mod mixins;
pub mod policy;
pub mod proxy_definition;

pub use mixins::{Mixins, MixinsBuilder};
pub use policy::InterceptionPolicy;
pub use proxy_definition::{ProxyDefinition, ProxyDefinitionBuilder};
