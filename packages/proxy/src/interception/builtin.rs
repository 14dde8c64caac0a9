// packages/proxy/src/interception/builtin.rs
//! Built-in interceptors
//!
//! - **TracingInterceptor**: structured log events around each call
//! - **TimingInterceptor**: call duration histogram + `elapsed_us` attribute
//! - **DeadlineInterceptor**: turns slow calls into a reported fault

use crate::interception::context::InvocationContext;
use crate::interception::interceptor::Interceptor;
use crate::interception::pipeline::Invocation;
use crate::model::descriptor::MethodDescriptor;
use crate::model::value::Value;
use crate::utils::errors::{Fault, ProxyError};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Context attribute holding the call duration in microseconds
pub const ELAPSED_US: &str = "elapsed_us";

/// Logs start, completion and faults of every call
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingInterceptor;

impl Interceptor for TracingInterceptor {
    fn name(&self) -> &str {
        "tracing"
    }

    fn before(&self, ctx: &InvocationContext, method: &MethodDescriptor, args: &[Value]) -> Result<(), Fault> {
        debug!(
            call_id = %ctx.call_id(),
            method = %method,
            args = args.len(),
            "Call started"
        );
        Ok(())
    }

    fn after(
        &self,
        ctx: &InvocationContext,
        method: &MethodDescriptor,
        _args: &[Value],
        result: Option<&Value>,
    ) -> Result<(), Fault> {
        debug!(
            call_id = %ctx.call_id(),
            method = %method,
            elapsed_us = ctx.elapsed().as_micros() as u64,
            ok = result.is_some(),
            "Call finished"
        );
        Ok(())
    }

    fn error(
        &self,
        ctx: &InvocationContext,
        method: &MethodDescriptor,
        _args: &[Value],
        fault: &Fault,
    ) -> Result<bool, Fault> {
        warn!(call_id = %ctx.call_id(), method = %method, "Call failed: {}", fault);
        Ok(false)
    }
}

/// Measures call duration
#[derive(Debug, Clone, Copy, Default)]
pub struct TimingInterceptor;

impl Interceptor for TimingInterceptor {
    fn name(&self) -> &str {
        "timing"
    }

    fn after(
        &self,
        ctx: &InvocationContext,
        method: &MethodDescriptor,
        _args: &[Value],
        _result: Option<&Value>,
    ) -> Result<(), Fault> {
        let elapsed = ctx.elapsed();
        ctx.set_attribute(ELAPSED_US, elapsed.as_micros() as i64);
        metrics::histogram!("proxy_call_duration_seconds", "method" => method.qualified_name())
            .record(elapsed.as_secs_f64());
        Ok(())
    }
}

/// Fails calls that take longer than `limit`
///
/// Calls run on the caller's thread, so the deadline is checked when
/// `proceed()` returns; the overrun is reported as
/// [`ProxyError::DeadlineExceeded`] and never retried. A fault raised by the
/// inner chain takes precedence over the deadline.
#[derive(Debug, Clone, Copy)]
pub struct DeadlineInterceptor {
    limit: Duration,
}

impl DeadlineInterceptor {
    pub fn new(limit: Duration) -> Self {
        Self { limit }
    }

    pub fn limit(&self) -> Duration {
        self.limit
    }
}

impl Interceptor for DeadlineInterceptor {
    fn name(&self) -> &str {
        "deadline"
    }

    fn invoke(&self, invocation: &mut Invocation<'_>) -> Result<Value, Fault> {
        let started = Instant::now();
        let value = invocation.proceed()?;
        let elapsed = started.elapsed();

        if elapsed > self.limit {
            warn!(
                call_id = %invocation.context().call_id(),
                "Deadline of {:?} exceeded after {:?}",
                self.limit,
                elapsed
            );
            return Err(ProxyError::DeadlineExceeded {
                method: invocation.method().qualified_name(),
                elapsed_ms: elapsed.as_millis(),
                limit_ms: self.limit.as_millis(),
            }
            .into());
        }

        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interception::pipeline::{terminal_fn, Pipeline};
    use std::sync::Arc;

    fn method() -> Arc<MethodDescriptor> {
        Arc::new(MethodDescriptor::new("slow").declared_by("Worker"))
    }

    #[test]
    fn test_deadline_exceeded() {
        let pipeline = Pipeline::assemble(
            vec![Arc::new(DeadlineInterceptor::new(Duration::from_millis(5))) as Arc<dyn Interceptor>],
            terminal_fn(|_| {
                std::thread::sleep(Duration::from_millis(30));
                Ok(Value::from("late"))
            }),
        );

        let err = pipeline.call(None, None, method(), &[]).unwrap_err();
        assert!(matches!(
            err.as_proxy_error(),
            Some(ProxyError::DeadlineExceeded { method, .. }) if method == "Worker.slow"
        ));
    }

    #[test]
    fn test_inner_fault_wins_over_deadline() {
        let raised = Fault::msg("backend down");
        let thrown = raised.clone();
        let pipeline = Pipeline::assemble(
            vec![Arc::new(DeadlineInterceptor::new(Duration::from_millis(5))) as Arc<dyn Interceptor>],
            terminal_fn(move |_| {
                std::thread::sleep(Duration::from_millis(30));
                Err(thrown.clone())
            }),
        );

        let err = pipeline.call(None, None, method(), &[]).unwrap_err();
        assert!(err.same_as(&raised));
        assert!(err.as_proxy_error().is_none());
    }

    #[test]
    fn test_deadline_met() {
        let pipeline = Pipeline::assemble(
            vec![Arc::new(DeadlineInterceptor::new(Duration::from_secs(5))) as Arc<dyn Interceptor>],
            terminal_fn(|_| Ok(Value::from("fast"))),
        );

        assert_eq!(
            pipeline.call(None, None, method(), &[]).unwrap(),
            Value::from("fast")
        );
    }

    #[test]
    fn test_timing_sets_attribute() {
        let pipeline = Pipeline::assemble(
            vec![
                Arc::new(TracingInterceptor) as Arc<dyn Interceptor>,
                Arc::new(TimingInterceptor) as Arc<dyn Interceptor>,
            ],
            terminal_fn(|_| Ok(Value::Null)),
        );

        let ctx = InvocationContext::new(None, None, method(), &[]);
        pipeline.invoke(&ctx).unwrap();
        assert!(ctx.attribute(ELAPSED_US).and_then(|v| v.as_int()).is_some());
    }

    #[test]
    fn test_tracing_does_not_claim_faults() {
        let pipeline = Pipeline::assemble(
            vec![Arc::new(TracingInterceptor) as Arc<dyn Interceptor>],
            terminal_fn(|_| Err(Fault::msg("down"))),
        );

        let err = pipeline.call(None, None, method(), &[]).unwrap_err();
        assert_eq!(err.to_string(), "down");
    }
}
