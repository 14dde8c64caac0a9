// packages/proxy/src/recording/recorder.rs
//! Invocation recorder
//!
//! [`RecordingInterceptor`] turns the hooks of every call it wraps into
//! [`InvocationEvent`]s on an [`EventQueue`]. Recording never fails a call:
//! when the queue is full the event is dropped and counted.

use crate::interception::context::InvocationContext;
use crate::interception::interceptor::Interceptor;
use crate::model::descriptor::MethodDescriptor;
use crate::model::value::Value;
use crate::recording::event_queue::EventQueue;
use crate::utils::config::RecordingConfig;
use crate::utils::errors::Fault;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use ulid::Ulid;

/// Event to be recorded
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvocationEvent {
    /// Unique event ID
    pub id: String,

    /// Call the event belongs to
    pub call_id: String,

    /// Event type
    pub event_type: EventType,

    /// Qualified method name
    pub method: String,

    /// Timestamp (nanoseconds since epoch)
    pub timestamp_ns: u64,

    /// Event data (JSON)
    pub data: serde_json::Value,

    /// Duration (microseconds)
    pub duration_us: Option<u64>,
}

/// Event types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    CallStarted,
    CallCompleted,
    CallFailed,
}

fn timestamp_ns(at: DateTime<Utc>) -> u64 {
    at.timestamp_nanos_opt().unwrap_or_default().max(0) as u64
}

/// Interceptor that records calls
pub struct RecordingInterceptor {
    queue: Arc<EventQueue>,
}

impl RecordingInterceptor {
    pub fn new(config: &RecordingConfig) -> Self {
        info!("Initializing invocation recorder (capacity {})", config.queue_capacity);
        Self::with_queue(Arc::new(EventQueue::new(config.queue_capacity)))
    }

    /// Record into an existing queue
    pub fn with_queue(queue: Arc<EventQueue>) -> Self {
        Self { queue }
    }

    pub fn queue(&self) -> &Arc<EventQueue> {
        &self.queue
    }

    /// Take every recorded event, oldest first
    pub fn drain(&self) -> Vec<InvocationEvent> {
        self.queue.drain()
    }

    fn record(
        &self,
        ctx: &InvocationContext,
        event_type: EventType,
        at: DateTime<Utc>,
        data: serde_json::Value,
        duration_us: Option<u64>,
    ) {
        let event = InvocationEvent {
            id: Ulid::new().to_string(),
            call_id: ctx.call_id().to_string(),
            event_type,
            method: ctx.method().qualified_name(),
            timestamp_ns: timestamp_ns(at),
            data,
            duration_us,
        };

        if self.queue.push(event).is_err() {
            warn!(call_id = %ctx.call_id(), "Event queue full, dropping {:?} event", event_type);
        }
    }
}

impl Interceptor for RecordingInterceptor {
    fn name(&self) -> &str {
        "recording"
    }

    fn before(&self, ctx: &InvocationContext, _method: &MethodDescriptor, args: &[Value]) -> Result<(), Fault> {
        let arguments: Vec<_> = args.iter().map(Value::to_json).collect();
        self.record(
            ctx,
            EventType::CallStarted,
            ctx.wall_start(),
            serde_json::json!({ "arguments": arguments }),
            None,
        );
        Ok(())
    }

    fn after(
        &self,
        ctx: &InvocationContext,
        _method: &MethodDescriptor,
        _args: &[Value],
        result: Option<&Value>,
    ) -> Result<(), Fault> {
        // Failures are recorded by `error`
        if let Some(result) = result {
            self.record(
                ctx,
                EventType::CallCompleted,
                Utc::now(),
                serde_json::json!({ "result": result.to_json() }),
                Some(ctx.elapsed().as_micros() as u64),
            );
        }
        Ok(())
    }

    fn error(
        &self,
        ctx: &InvocationContext,
        _method: &MethodDescriptor,
        _args: &[Value],
        fault: &Fault,
    ) -> Result<bool, Fault> {
        self.record(
            ctx,
            EventType::CallFailed,
            Utc::now(),
            serde_json::json!({ "error": fault.to_string() }),
            Some(ctx.elapsed().as_micros() as u64),
        );
        Ok(false)
    }
}
