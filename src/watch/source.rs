//! Watch source traits and cancellation.

use crate::value::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative cancellation flag shared between dispatchers and their
/// watch sources. Cloning yields a handle to the same signal.
#[derive(Debug, Clone, Default)]
pub struct StopSignal {
    stopped: Arc<AtomicBool>,
}

impl StopSignal {
    pub fn new() -> Self {
        StopSignal::default()
    }

    /// Signals every holder to stop. In-flight event processing finishes;
    /// nothing is forcibly interrupted.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

/// Callbacks a watch source delivers raw object payloads to.
///
/// For one resource type, calls are never made concurrently and arrive in
/// the order the watched system produced them.
pub trait EventHandler {
    fn on_add(&self, obj: &Value);
    fn on_update(&self, old: &Value, new: &Value);
    fn on_delete(&self, obj: &Value);
}

/// A source of watch events for one resource type.
pub trait WatchSource {
    /// Blocks until the source's cache is fully synced. Returns false if
    /// the stop signal fired first.
    fn wait_for_sync(&mut self, stop: &StopSignal) -> bool;

    /// Delivers events to `handler` until the stream ends or the stop
    /// signal fires.
    fn process(&mut self, handler: &dyn EventHandler, stop: &StopSignal);
}
