// packages/proxy/src/interception/interceptor.rs
//! Interceptor extension point

use crate::interception::context::InvocationContext;
use crate::interception::pipeline::Invocation;
use crate::model::descriptor::MethodDescriptor;
use crate::model::value::Value;
use crate::utils::errors::Fault;

/// Cross-cutting behaviour wrapped around proxied calls.
///
/// Hooks run in this order for each link of the chain:
///
/// 1. `before`: a failure aborts the call immediately.
/// 2. `invoke`: defaults to [`Invocation::proceed`].
/// 3. `error`: only when `invoke` failed. Return `Ok(true)` to claim the fault
///    (the call resolves with the invocation's last result), `Ok(false)` to let
///    it propagate, or `Err(other)` to propagate a replacement.
/// 4. `after`: always. Its failure is handed to `error` rather than raised.
///
/// Interceptors are shared by every call on every thread, so per-call state
/// belongs in the [`InvocationContext`].
pub trait Interceptor: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    fn before(
        &self,
        _ctx: &InvocationContext,
        _method: &MethodDescriptor,
        _args: &[Value],
    ) -> Result<(), Fault> {
        Ok(())
    }

    fn invoke(&self, invocation: &mut Invocation<'_>) -> Result<Value, Fault> {
        invocation.proceed()
    }

    /// `result` is the value as currently known to this link; an outer link
    /// may still replace it.
    fn after(
        &self,
        _ctx: &InvocationContext,
        _method: &MethodDescriptor,
        _args: &[Value],
        _result: Option<&Value>,
    ) -> Result<(), Fault> {
        Ok(())
    }

    fn error(
        &self,
        _ctx: &InvocationContext,
        _method: &MethodDescriptor,
        _args: &[Value],
        _fault: &Fault,
    ) -> Result<bool, Fault> {
        Ok(false)
    }
}
