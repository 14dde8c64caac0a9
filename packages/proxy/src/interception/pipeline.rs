// packages/proxy/src/interception/pipeline.rs
//! Invocation pipeline
//!
//! Composes an ordered interceptor list and a terminal operation into one
//! callable chain.
//!
//! # Architecture
//!
//! ```text
//! Link 0 (outermost)   before → invoke ─┐                ┌─ error? → after
//! Link 1                        before → invoke ─┐  ┌─ error? → after
//! ...                                            │  │
//! Fallback                                  terminal.call
//! ```
//!
//! Inside the chain every failure travels as an `Unwind` carrier. The carrier
//! is opened whenever control goes back to interceptor code (through
//! [`Invocation::proceed`]) and at the outer boundary, so callers and
//! interceptors only ever see the original [`Fault`].

use crate::interception::context::InvocationContext;
use crate::interception::interceptor::Interceptor;
use crate::model::descriptor::{MethodDescriptor, MethodRef};
use crate::model::target::TargetRef;
use crate::model::value::{ObjectRef, Value};
use crate::utils::errors::Fault;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

/// Final step of a call: the real method
pub trait Terminal: Send + Sync {
    fn call(&self, ctx: &InvocationContext) -> Result<Value, Fault>;
}

impl<F> Terminal for F
where
    F: Fn(&InvocationContext) -> Result<Value, Fault> + Send + Sync,
{
    fn call(&self, ctx: &InvocationContext) -> Result<Value, Fault> {
        self(ctx)
    }
}

/// Wrap a closure as a terminal
pub fn terminal_fn<F>(f: F) -> Arc<dyn Terminal>
where
    F: Fn(&InvocationContext) -> Result<Value, Fault> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Carrier used as the chain's error type
struct Unwind(Fault);

impl Unwind {
    fn into_fault(self) -> Fault {
        self.0
    }
}

type Step = Result<Value, Unwind>;

enum Link {
    Intercept {
        ordinal: usize,
        interceptor: Arc<dyn Interceptor>,
    },
    Fallback,
}

/// Assembled interceptor chain
pub struct Pipeline {
    links: Vec<Link>,
    terminal: Arc<dyn Terminal>,
}

impl Pipeline {
    /// Wrap each interceptor as a link, then append the terminal fallback
    pub fn assemble<I>(interceptors: I, terminal: Arc<dyn Terminal>) -> Self
    where
        I: IntoIterator<Item = Arc<dyn Interceptor>>,
    {
        let mut links: Vec<Link> = interceptors
            .into_iter()
            .enumerate()
            .map(|(ordinal, interceptor)| Link::Intercept {
                ordinal,
                interceptor,
            })
            .collect();
        links.push(Link::Fallback);

        debug!("Assembled pipeline with {} interceptor(s)", links.len() - 1);

        Self { links, terminal }
    }

    /// Number of interceptors in the chain
    pub fn len(&self) -> usize {
        self.links.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Interceptor names, outermost first
    pub fn interceptor_names(&self) -> Vec<String> {
        self.links
            .iter()
            .filter_map(|link| match link {
                Link::Intercept { interceptor, .. } => Some(interceptor.name().to_string()),
                Link::Fallback => None,
            })
            .collect()
    }

    /// Build a context for the call and run the chain
    pub fn call(
        &self,
        proxy: Option<ObjectRef>,
        target: Option<TargetRef>,
        method: MethodRef,
        args: &[Value],
    ) -> Result<Value, Fault> {
        let ctx = InvocationContext::new(proxy, target, method, args);
        self.invoke(&ctx)
    }

    /// Run the chain with an existing context
    pub fn invoke(&self, ctx: &InvocationContext) -> Result<Value, Fault> {
        trace!(call_id = %ctx.call_id(), method = %ctx.method(), "Entering pipeline");
        self.run(0, ctx).map_err(Unwind::into_fault)
    }

    fn run(&self, index: usize, ctx: &InvocationContext) -> Step {
        match &self.links[index] {
            Link::Fallback => {
                trace!(call_id = %ctx.call_id(), "Invoking terminal");
                self.terminal.call(ctx).map_err(Unwind)
            }
            Link::Intercept {
                ordinal,
                interceptor,
            } => self.run_link(index, *ordinal, interceptor.as_ref(), ctx),
        }
    }

    fn run_link(
        &self,
        index: usize,
        ordinal: usize,
        interceptor: &dyn Interceptor,
        ctx: &InvocationContext,
    ) -> Step {
        let method = ctx.method();
        let args = ctx.arguments();

        trace!(call_id = %ctx.call_id(), ordinal, interceptor = interceptor.name(), "Entering link");

        // Not offered to `error`: the rest of the chain is skipped.
        interceptor.before(ctx, method, args).map_err(Unwind)?;

        let mut invocation = Invocation::new(self, index + 1, ordinal, ctx);
        let outcome = match interceptor.invoke(&mut invocation) {
            Ok(value) => {
                invocation.result = Some(value.clone());
                Ok(value)
            }
            Err(fault) => recover(interceptor, ctx, method, args, fault, invocation.result()),
        };

        let known = outcome.as_ref().ok();
        if let Err(fault) = interceptor.after(ctx, method, args, known) {
            recover(interceptor, ctx, method, args, fault, known)?;
        }

        outcome
    }
}

/// Offer `fault` to the interceptor's error hook
fn recover(
    interceptor: &dyn Interceptor,
    ctx: &InvocationContext,
    method: &MethodDescriptor,
    args: &[Value],
    fault: Fault,
    last_result: Option<&Value>,
) -> Step {
    match interceptor.error(ctx, method, args, &fault) {
        Ok(true) => {
            debug!(
                call_id = %ctx.call_id(),
                interceptor = interceptor.name(),
                "Fault handled by interceptor: {}",
                fault
            );
            Ok(last_result.cloned().unwrap_or_default())
        }
        Ok(false) => Err(Unwind(fault)),
        Err(replacement) => Err(Unwind(replacement)),
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("interceptors", &self.interceptor_names())
            .finish()
    }
}

/// Handle given to [`Interceptor::invoke`]
///
/// `proceed` runs the rest of the chain at most once; later calls return the
/// first outcome again, so the terminal step runs once per call.
pub struct Invocation<'a> {
    pipeline: &'a Pipeline,
    next: usize,
    ordinal: usize,
    ctx: &'a InvocationContext,
    result: Option<Value>,
    outcome: Option<Result<Value, Fault>>,
}

impl<'a> Invocation<'a> {
    fn new(pipeline: &'a Pipeline, next: usize, ordinal: usize, ctx: &'a InvocationContext) -> Self {
        Self {
            pipeline,
            next,
            ordinal,
            ctx,
            result: None,
            outcome: None,
        }
    }

    /// Run the remainder of the chain
    pub fn proceed(&mut self) -> Result<Value, Fault> {
        if let Some(outcome) = &self.outcome {
            trace!(call_id = %self.ctx.call_id(), ordinal = self.ordinal, "Repeated proceed");
            return outcome.clone();
        }

        let outcome = self
            .pipeline
            .run(self.next, self.ctx)
            .map_err(Unwind::into_fault);
        if let Ok(value) = &outcome {
            self.result = Some(value.clone());
        }
        self.outcome = Some(outcome.clone());
        outcome
    }

    /// Whether `proceed` has been called
    pub fn has_proceeded(&self) -> bool {
        self.outcome.is_some()
    }

    /// Position of the current interceptor in the chain
    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    pub fn context(&self) -> &InvocationContext {
        self.ctx
    }

    pub fn method(&self) -> &MethodDescriptor {
        self.ctx.method()
    }

    pub fn arguments(&self) -> &[Value] {
        self.ctx.arguments()
    }

    /// Last result set on this invocation
    pub fn result(&self) -> Option<&Value> {
        self.result.as_ref()
    }

    /// Record a result; used when a fault is claimed by the error hook
    pub fn set_result(&mut self, value: impl Into<Value>) {
        self.result = Some(value.into());
    }
}
