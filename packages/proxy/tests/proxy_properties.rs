// packages/proxy/tests/proxy_properties.rs
//! End-to-end behaviour of proxies built through the public API

use parking_lot::Mutex;
use proptest::prelude::*;
use sentra_lab_proxy::model::{Primitive, ReturnKind};
use sentra_lab_proxy::{
    Fault, FnTarget, InstanceProvider, Interceptor, InterceptorMatcher, InterceptorRegistry,
    Invocation, InvocationContext, MethodDescriptor, Mixins, ProxyDefinition, ProxyFactory,
    ThreadScopedProvider, TypeDescriptor, TypeRef, Value,
};
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::Arc;

type Journal = Arc<Mutex<Vec<String>>>;

/// Writes `before:<tag>` and `after:<tag>:<result>` into a shared journal
struct Tagged {
    tag: String,
    journal: Journal,
}

impl Tagged {
    fn new(tag: impl Into<String>, journal: &Journal) -> Arc<dyn Interceptor> {
        Arc::new(Self {
            tag: tag.into(),
            journal: Arc::clone(journal),
        })
    }
}

impl Interceptor for Tagged {
    fn name(&self) -> &str {
        &self.tag
    }

    fn before(&self, _: &InvocationContext, _: &MethodDescriptor, _: &[Value]) -> Result<(), Fault> {
        self.journal.lock().push(format!("before:{}", self.tag));
        Ok(())
    }

    fn after(
        &self,
        _: &InvocationContext,
        _: &MethodDescriptor,
        _: &[Value],
        result: Option<&Value>,
    ) -> Result<(), Fault> {
        let rendered = result.and_then(Value::as_str).unwrap_or("-");
        self.journal
            .lock()
            .push(format!("after:{}:{}", self.tag, rendered));
        Ok(())
    }
}

fn service() -> TypeRef {
    TypeDescriptor::capability("Service")
        .method(MethodDescriptor::new("fetch"))
        .build()
}

/// Target answering `fetch` with "Y" and counting calls
fn counting_target(ty: &TypeRef, calls: &Arc<AtomicUsize>) -> sentra_lab_proxy::TargetRef {
    let calls = Arc::clone(calls);
    FnTarget::new(ty)
        .on("fetch", move |_: &[Value]| {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(Value::from("Y"))
        })
        .into_ref()
}

fn entries(journal: &Journal, prefix: &str) -> Vec<String> {
    journal
        .lock()
        .iter()
        .filter(|e| e.starts_with(prefix))
        .map(|e| e.split(':').nth(1).unwrap_or_default().to_string())
        .collect()
}

#[test]
fn interceptors_run_in_ascending_order() {
    let ty = service();
    let journal: Journal = Arc::default();
    let calls = Arc::new(AtomicUsize::new(0));

    let registry = InterceptorRegistry::new();
    registry.register(Tagged::new("a", &journal), InterceptorMatcher::any(), 10);
    registry.register(Tagged::new("b", &journal), InterceptorMatcher::any(), 5);
    registry.register(Tagged::new("c", &journal), InterceptorMatcher::any(), 20);

    let definition = ProxyDefinition::builder()
        .target_type(&ty)
        .singleton(counting_target(&ty, &calls))
        .interceptors_from(&registry)
        .build()
        .unwrap();
    let proxy = ProxyFactory::new().create(definition).unwrap();

    assert_eq!(proxy.call("fetch", &[]).unwrap(), Value::from("Y"));
    assert_eq!(entries(&journal, "before"), vec!["b", "a", "c"]);
    assert_eq!(entries(&journal, "after"), vec!["c", "a", "b"]);
}

#[test]
fn target_runs_once_per_call() {
    let ty = service();

    for count in [0usize, 1, 5] {
        let journal: Journal = Arc::default();
        let calls = Arc::new(AtomicUsize::new(0));
        let interceptors: Vec<_> = (0..count)
            .map(|i| Tagged::new(format!("i{}", i), &journal))
            .collect();

        let definition = ProxyDefinition::builder()
            .target_type(&ty)
            .singleton(counting_target(&ty, &calls))
            .interceptors(interceptors)
            .build()
            .unwrap();
        let proxy = ProxyFactory::new().create(definition).unwrap();

        proxy.call("fetch", &[]).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1, "{} interceptor(s)", count);
    }
}

#[derive(Debug, thiserror::Error)]
#[error("upstream unavailable")]
struct Unavailable;

struct Suppress;

impl Interceptor for Suppress {
    fn error(&self, _: &InvocationContext, _: &MethodDescriptor, _: &[Value], _: &Fault) -> Result<bool, Fault> {
        Ok(true)
    }
}

fn failing_target(ty: &TypeRef, fault: &Fault) -> sentra_lab_proxy::TargetRef {
    let fault = fault.clone();
    FnTarget::new(ty)
        .on("fetch", move |_: &[Value]| Err(fault.clone()))
        .into_ref()
}

#[test]
fn handled_fault_returns_null() {
    let ty = service();
    let raised = Fault::new(Unavailable);

    let definition = ProxyDefinition::builder()
        .target_type(&ty)
        .singleton(failing_target(&ty, &raised))
        .interceptor(Arc::new(Suppress))
        .build()
        .unwrap();
    let proxy = ProxyFactory::new().create(definition).unwrap();

    assert_eq!(proxy.call("fetch", &[]).unwrap(), Value::Null);
}

#[test]
fn unhandled_fault_reaches_caller_unchanged() {
    let ty = service();
    let journal: Journal = Arc::default();
    let raised = Fault::new(Unavailable);

    let definition = ProxyDefinition::builder()
        .target_type(&ty)
        .singleton(failing_target(&ty, &raised))
        .interceptor(Tagged::new("outer", &journal))
        .interceptor(Tagged::new("inner", &journal))
        .build()
        .unwrap();
    let proxy = ProxyFactory::new().create(definition).unwrap();

    let err = proxy.call("fetch", &[]).unwrap_err();
    assert!(err.same_as(&raised));
    assert!(err.is::<Unavailable>());
    assert_eq!(err.to_string(), "upstream unavailable");
}

#[test]
fn mixin_wins_over_target() {
    let ty = service();
    let calls = Arc::new(AtomicUsize::new(0));
    let mixin = FnTarget::new(&ty)
        .on("fetch", |_: &[Value]| Ok(Value::from("mixin")))
        .into_ref();

    let definition = ProxyDefinition::builder()
        .target_type(&ty)
        .singleton(counting_target(&ty, &calls))
        .mixins(Mixins::from_instance(mixin))
        .build()
        .unwrap();
    let proxy = ProxyFactory::new().create(definition).unwrap();

    for _ in 0..3 {
        assert_eq!(proxy.call("fetch", &[]).unwrap(), Value::from("mixin"));
    }
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn identity_operations_skip_interceptors() {
    let ty = service();
    let journal: Journal = Arc::default();
    let calls = Arc::new(AtomicUsize::new(0));

    let registry = InterceptorRegistry::new();
    registry.register(Tagged::new("watch", &journal), InterceptorMatcher::any(), 0);

    let definition = ProxyDefinition::builder()
        .target_type(&ty)
        .singleton(counting_target(&ty, &calls))
        .interceptors_from(&registry)
        .build()
        .unwrap();
    let proxy = ProxyFactory::new().create(definition).unwrap();

    let label = proxy.call("to_string", &[]).unwrap();
    assert_eq!(label.as_str(), Some("capabilityProxy[Service]"));
    assert_eq!(proxy.call("hash", &[]).unwrap(), Value::Int(proxy.identity_hash()));
    assert_eq!(
        proxy.call("equals", &[proxy.as_object()]).unwrap(),
        Value::Bool(true)
    );
    assert_eq!(proxy.call("equals", &[Value::Null]).unwrap(), Value::Bool(false));

    assert!(journal.lock().is_empty());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn thread_scoped_instances_are_isolated() {
    let ty = TypeDescriptor::capability("Session")
        .method(MethodDescriptor::new("id").returns(ReturnKind::Primitive(Primitive::Int)))
        .build();

    let created = Arc::new(AtomicUsize::new(0));
    let serial = Arc::new(AtomicI64::new(0));
    let provider = {
        let ty = Arc::clone(&ty);
        let created = Arc::clone(&created);
        let serial = Arc::clone(&serial);
        Arc::new(ThreadScopedProvider::new(move || {
            created.fetch_add(1, Ordering::SeqCst);
            let id = serial.fetch_add(1, Ordering::SeqCst);
            Ok(FnTarget::new(&ty)
                .on("id", move |_: &[Value]| Ok(Value::Int(id)))
                .into_ref())
        }))
    };

    let definition = ProxyDefinition::builder()
        .target_type(&ty)
        .instance_provider(Arc::clone(&provider) as Arc<dyn InstanceProvider>)
        .build()
        .unwrap();
    let proxy = ProxyFactory::new().create(definition).unwrap();

    let shared = &proxy;
    let ids: Vec<i64> = std::thread::scope(|scope| {
        let workers: Vec<_> = (0..2)
            .map(|_| {
                scope.spawn(move || {
                    let first = shared.call("id", &[]).unwrap().as_int().unwrap();
                    let second = shared.call("id", &[]).unwrap().as_int().unwrap();
                    assert_eq!(first, second);
                    first
                })
            })
            .collect();
        workers.into_iter().map(|w| w.join().unwrap()).collect()
    });

    assert_ne!(ids[0], ids[1]);
    assert_eq!(created.load(Ordering::SeqCst), 2);

    let before = proxy.call("id", &[]).unwrap();
    assert_eq!(proxy.call("id", &[]).unwrap(), before);
    assert_eq!(created.load(Ordering::SeqCst), 3);

    assert!(provider.remove().is_some());
    let after = proxy.call("id", &[]).unwrap();
    assert_ne!(after, before);
    assert_eq!(created.load(Ordering::SeqCst), 4);
}

struct ShortCircuit;

impl Interceptor for ShortCircuit {
    fn invoke(&self, _: &mut Invocation<'_>) -> Result<Value, Fault> {
        Ok(Value::from("X"))
    }
}

#[test]
fn short_circuit_result_seen_by_outer_after() {
    let ty = service();
    let journal: Journal = Arc::default();
    let calls = Arc::new(AtomicUsize::new(0));

    let registry = InterceptorRegistry::new();
    registry.register(Arc::new(ShortCircuit), InterceptorMatcher::any(), 10);
    registry.register(Tagged::new("counting", &journal), InterceptorMatcher::any(), 0);

    let definition = ProxyDefinition::builder()
        .target_type(&ty)
        .singleton(counting_target(&ty, &calls))
        .interceptors_from(&registry)
        .build()
        .unwrap();
    let proxy = ProxyFactory::new().create(definition).unwrap();

    assert_eq!(proxy.call("fetch", &[]).unwrap(), Value::from("X"));
    assert_eq!(
        *journal.lock(),
        vec!["before:counting".to_string(), "after:counting:X".to_string()]
    );
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

/// Stamps the call's argument into its context before the call and checks
/// it is still there afterwards
struct Stamp {
    mismatches: Arc<AtomicUsize>,
}

impl Interceptor for Stamp {
    fn name(&self) -> &str {
        "stamp"
    }

    fn before(&self, ctx: &InvocationContext, _: &MethodDescriptor, args: &[Value]) -> Result<(), Fault> {
        ctx.set_attribute("stamp", args[0].clone());
        Ok(())
    }

    fn after(
        &self,
        ctx: &InvocationContext,
        _: &MethodDescriptor,
        args: &[Value],
        result: Option<&Value>,
    ) -> Result<(), Fault> {
        let seen = ctx.attribute("seen");
        if ctx.attribute("stamp").as_ref() != Some(&args[0])
            || seen.as_ref() != Some(&args[0])
            || result != Some(&args[0])
        {
            self.mismatches.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

/// Copies the outer stamp into a second attribute around `proceed`
struct Relay;

impl Interceptor for Relay {
    fn name(&self) -> &str {
        "relay"
    }

    fn invoke(&self, invocation: &mut Invocation<'_>) -> Result<Value, Fault> {
        let stamp = invocation
            .context()
            .attribute("stamp")
            .ok_or_else(|| Fault::msg("stamp missing"))?;
        if stamp != invocation.arguments()[0] {
            return Err(Fault::msg("stamp leaked from another call"));
        }
        invocation.context().set_attribute("seen", stamp);
        invocation.proceed()
    }
}

#[test]
fn concurrent_calls_share_one_chain_without_leaking_state() {
    const THREADS: i64 = 8;
    const CALLS: i64 = 200;

    let ty = TypeDescriptor::capability("Echo")
        .method(MethodDescriptor::new("echo").arity(1))
        .build();
    let terminal_calls = Arc::new(AtomicUsize::new(0));
    let mismatches = Arc::new(AtomicUsize::new(0));

    let target = {
        let terminal_calls = Arc::clone(&terminal_calls);
        FnTarget::new(&ty)
            .on("echo", move |args: &[Value]| {
                terminal_calls.fetch_add(1, Ordering::SeqCst);
                Ok(args[0].clone())
            })
            .into_ref()
    };

    let definition = ProxyDefinition::builder()
        .target_type(&ty)
        .singleton(target)
        .interceptor(Arc::new(Stamp {
            mismatches: Arc::clone(&mismatches),
        }))
        .interceptor(Arc::new(Relay))
        .build()
        .unwrap();
    let proxy = ProxyFactory::new().create(definition).unwrap();

    let shared = &proxy;
    std::thread::scope(|scope| {
        for t in 0..THREADS {
            scope.spawn(move || {
                for i in 0..CALLS {
                    let arg = Value::Int(t * CALLS + i);
                    let result = shared.call("echo", &[arg.clone()]).unwrap();
                    assert_eq!(result, arg);
                }
            });
        }
    });

    assert_eq!(mismatches.load(Ordering::SeqCst), 0);
    assert_eq!(
        terminal_calls.load(Ordering::SeqCst),
        (THREADS * CALLS) as usize
    );
}

proptest! {
    #[test]
    fn selection_is_a_stable_sort_by_order(orders in prop::collection::vec(-5i32..5, 0..12)) {
        let journal: Journal = Arc::default();
        let registry = InterceptorRegistry::new();
        for (i, order) in orders.iter().enumerate() {
            registry.register(Tagged::new(i.to_string(), &journal), InterceptorMatcher::any(), *order);
        }

        let mut expected: Vec<usize> = (0..orders.len()).collect();
        expected.sort_by_key(|&i| orders[i]);

        let selected: Vec<usize> = registry
            .select(&service())
            .iter()
            .map(|i| i.name().parse().unwrap())
            .collect();
        prop_assert_eq!(selected, expected);
    }
}
