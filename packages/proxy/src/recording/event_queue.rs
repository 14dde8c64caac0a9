// packages/proxy/src/recording/event_queue.rs
//! Lock-free MPMC event queue
//!
//! Bounded queue between recording interceptors and whoever drains the
//! events. A full queue drops the new event and counts the drop.

use crate::recording::recorder::InvocationEvent;
use crossbeam::queue::ArrayQueue;
use std::sync::atomic::{AtomicU64, Ordering};

/// Lock-free event queue
pub struct EventQueue {
    /// Underlying bounded queue
    queue: ArrayQueue<InvocationEvent>,

    /// Push counter
    push_count: AtomicU64,

    /// Pop counter
    pop_count: AtomicU64,

    /// Drop counter (queue full)
    drop_count: AtomicU64,
}

impl EventQueue {
    /// Create a new event queue; a capacity of zero is raised to one
    pub fn new(capacity: usize) -> Self {
        Self {
            queue: ArrayQueue::new(capacity.max(1)),
            push_count: AtomicU64::new(0),
            pop_count: AtomicU64::new(0),
            drop_count: AtomicU64::new(0),
        }
    }

    /// Push an event (non-blocking)
    pub fn push(&self, event: InvocationEvent) -> Result<(), InvocationEvent> {
        match self.queue.push(event) {
            Ok(()) => {
                self.push_count.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            Err(event) => {
                self.drop_count.fetch_add(1, Ordering::Relaxed);
                Err(event)
            }
        }
    }

    /// Try to pop an event (non-blocking)
    pub fn try_pop(&self) -> Option<InvocationEvent> {
        let event = self.queue.pop()?;
        self.pop_count.fetch_add(1, Ordering::Relaxed);
        Some(event)
    }

    /// Pop everything currently queued, oldest first
    pub fn drain(&self) -> Vec<InvocationEvent> {
        let mut out = Vec::with_capacity(self.queue.len());
        while let Some(event) = self.try_pop() {
            out.push(event);
        }
        out
    }

    /// Get queue statistics
    pub fn stats(&self) -> QueueStats {
        QueueStats {
            push_count: self.push_count.load(Ordering::Relaxed),
            pop_count: self.pop_count.load(Ordering::Relaxed),
            drop_count: self.drop_count.load(Ordering::Relaxed),
            current_size: self.queue.len(),
            capacity: self.queue.capacity(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.queue.is_full()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn capacity(&self) -> usize {
        self.queue.capacity()
    }
}

/// Queue statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueStats {
    /// Total events pushed
    pub push_count: u64,

    /// Total events popped
    pub pop_count: u64,

    /// Total events dropped (queue full)
    pub drop_count: u64,

    /// Current queue size
    pub current_size: usize,

    /// Queue capacity
    pub capacity: usize,
}

impl QueueStats {
    /// Calculate fill percentage
    pub fn fill_percentage(&self) -> f64 {
        (self.current_size as f64 / self.capacity as f64) * 100.0
    }

    /// Dropped events as a percentage of all offered events
    pub fn drop_rate(&self) -> f64 {
        let offered = self.push_count + self.drop_count;
        if offered == 0 {
            0.0
        } else {
            (self.drop_count as f64 / offered as f64) * 100.0
        }
    }
}
