// src/acquisition/stop.rs
//! Cooperative stop flags polled by the sampling loop

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Default)]
struct Flags {
    stop: AtomicBool,
    deadline: AtomicBool,
}

/// Shared stop token.
///
/// Clones share state; a signal handler may hold one clone and the scheduler
/// another. Setting a flag is a single atomic store with no allocation or
/// I/O, so it is safe to do from a signal context. The scheduler polls both
/// flags once per sample iteration, which bounds cancellation latency to one
/// sampling period.
#[derive(Debug, Clone, Default)]
pub struct StopToken {
    flags: Arc<Flags>,
}

impl StopToken {
    /// Fresh token with neither flag set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a user stop.
    pub fn request_stop(&self) {
        self.flags.stop.store(true, Ordering::Relaxed);
    }

    /// Mark the run deadline as reached.
    pub fn mark_deadline(&self) {
        self.flags.deadline.store(true, Ordering::Relaxed);
    }

    /// Whether a user stop was requested.
    pub fn stop_requested(&self) -> bool {
        self.flags.stop.load(Ordering::Relaxed)
    }

    /// Whether the run deadline was reached.
    pub fn deadline_reached(&self) -> bool {
        self.flags.deadline.load(Ordering::Relaxed)
    }
}
