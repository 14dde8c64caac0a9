// packages/proxy/src/recording/mod.rs
//! Invocation recording
//!
//! This module captures proxied calls as structured events:
//!
//! - **Recorder**: `RecordingInterceptor`, one event per call phase
//! - **Event Queue**: Lock-free bounded MPMC queue with drop accounting
//! - **Exporter**: Export to JSON and JSON lines
//!
//! # Architecture
//!
//! ```text
//! Pipeline → RecordingInterceptor → Lock-Free Queue → drain()
//!            (before/after/error)                        ↓
//!                                                    Exporter
//!                                                        ↓
//!                                               JSON / JSON lines
//! ```

pub mod event_queue;
pub mod exporter;
pub mod recorder;

// Re-export commonly used types
pub use event_queue::{EventQueue, QueueStats};
pub use exporter::{ExportFormat, Exporter};
pub use recorder::{EventType, InvocationEvent, RecordingInterceptor};
