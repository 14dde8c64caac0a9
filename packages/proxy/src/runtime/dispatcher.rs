// packages/proxy/src/runtime/dispatcher.rs
//! Call dispatcher
//!
//! Every call made on a [`Proxy`](crate::runtime::surrogate::Proxy) lands in
//! [`Dispatcher::dispatch`]:
//!
//! 1. identity operations (`to_string`, `hash`, `equals`) are answered
//!    directly, without interceptors
//! 2. methods the policy excludes go straight to the current instance
//! 3. everything else runs through the pre-assembled pipeline, ending in the
//!    [`TerminalResolver`] (mixin first, then instance)

use crate::definition::proxy_definition::ProxyDefinition;
use crate::interception::context::InvocationContext;
use crate::interception::pipeline::{Pipeline, Terminal};
use crate::model::descriptor::{MethodDescriptor, MethodRef, ObjectMethod};
use crate::model::target::TargetRef;
use crate::model::value::{object_address, ObjectRef, Value};
use crate::utils::errors::{Fault, ProxyError};
use std::fmt;
use std::sync::Arc;
use tracing::{trace, warn};

/// Terminal step: route the call to a mixin or the instance
pub struct TerminalResolver {
    definition: Arc<ProxyDefinition>,
}

impl TerminalResolver {
    pub fn new(definition: Arc<ProxyDefinition>) -> Self {
        Self { definition }
    }

    fn resolve(&self, method: &MethodDescriptor, instance: Option<&TargetRef>) -> Result<TargetRef, Fault> {
        if let Some(delegate) = self.definition.mixins().implementation_for(method.declaring()) {
            trace!(method = %method, "Resolved to mixin");
            return Ok(delegate);
        }

        instance
            .cloned()
            .ok_or_else(|| ProxyError::NullTarget(self.definition.target_type().name().to_string()).into())
    }
}

impl Terminal for TerminalResolver {
    fn call(&self, ctx: &InvocationContext) -> Result<Value, Fault> {
        let target = self.resolve(ctx.method(), ctx.target())?;
        target.call(ctx.method(), ctx.arguments())
    }
}

/// Per-proxy call router
pub struct Dispatcher {
    engine: &'static str,
    definition: Arc<ProxyDefinition>,
    pipeline: Pipeline,
}

impl Dispatcher {
    /// Assemble the pipeline once for the definition's interceptors
    pub fn new(engine: &'static str, definition: Arc<ProxyDefinition>) -> Self {
        let terminal = Arc::new(TerminalResolver::new(Arc::clone(&definition)));
        let pipeline = Pipeline::assemble(definition.interceptors().iter().cloned(), terminal);

        Self {
            engine,
            definition,
            pipeline,
        }
    }

    pub fn engine_name(&self) -> &'static str {
        self.engine
    }

    pub fn definition(&self) -> &Arc<ProxyDefinition> {
        &self.definition
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Deterministic `to_string` result
    pub fn label(&self) -> String {
        format!("{}Proxy[{}]", self.engine, self.definition.target_type().name())
    }

    /// Route one call made on `proxy`
    pub fn dispatch(&self, proxy: &ObjectRef, method: &MethodRef, args: &[Value]) -> Result<Value, Fault> {
        if let Some(op) = ObjectMethod::classify(method) {
            metrics::counter!("proxy_identity_calls_total", "engine" => self.engine).increment(1);
            return Ok(self.identity(op, proxy, args));
        }

        let instance = self.definition.instance_provider().get()?;

        let outcome = if self.definition.policy().allows(method) {
            metrics::counter!("proxy_invocations_total", "engine" => self.engine).increment(1);
            self.pipeline
                .call(Some(Arc::clone(proxy)), instance, Arc::clone(method), args)
        } else {
            warn!(
                "Method {} is excluded from interception by policy {:?}",
                method,
                self.definition.policy()
            );
            metrics::counter!("proxy_excluded_calls_total", "engine" => self.engine).increment(1);
            self.call_direct(method, instance, args)
        };

        let value = outcome.map_err(|fault| {
            metrics::counter!("proxy_faults_total", "engine" => self.engine).increment(1);
            fault
        })?;

        if value.is_null() && method.returns_primitive() {
            return Err(ProxyError::NullPrimitiveReturn {
                method: method.qualified_name(),
            }
            .into());
        }

        Ok(value)
    }

    /// Answer an identity operation for `proxy`
    pub(crate) fn identity(&self, op: ObjectMethod, proxy: &ObjectRef, args: &[Value]) -> Value {
        match op {
            ObjectMethod::ToString => Value::Text(self.label()),
            ObjectMethod::Hash => Value::Int(object_address(proxy) as i64),
            ObjectMethod::Equals => {
                let same = args
                    .first()
                    .and_then(Value::as_object)
                    .map_or(false, |other| object_address(other) == object_address(proxy));
                Value::Bool(same)
            }
        }
    }

    fn call_direct(
        &self,
        method: &MethodDescriptor,
        instance: Option<TargetRef>,
        args: &[Value],
    ) -> Result<Value, Fault> {
        let instance = instance
            .ok_or_else(|| ProxyError::NullTarget(self.definition.target_type().name().to_string()))?;
        instance.call(method, args)
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("engine", &self.engine)
            .field("target_type", &self.definition.target_type().name())
            .field("pipeline", &self.pipeline)
            .finish()
    }
}
