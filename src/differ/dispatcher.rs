//! Event dispatcher: wires watch callbacks to filter, diff, and output.

use crate::differ::{diff_maps, NameFilter, Output, RedactionRule};
use crate::value::Value;
use crate::watch::{EventHandler, StopSignal, WatchSource};
use crate::wrapper::{wrap, CanonicalObject};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error};

/// Error running a dispatcher. Fatal to this resource type only; other
/// dispatchers are unaffected.
#[derive(Debug, Error)]
pub enum DifferError {
    #[error("cache for {resource} did not sync before shutdown")]
    SyncFailed { resource: String },
}

/// Differ subscribes to one resource type's watch events and emits a
/// change-log entry for every semantic difference.
///
/// All state is per-call; one instance runs per resource type and shares
/// nothing with its peers, so dispatchers are safe to run concurrently.
pub struct Differ {
    resource: String,
    filter: NameFilter,
    label_rule: RedactionRule,
    annotation_rule: RedactionRule,
    path_prefix: String,
    output: Arc<dyn Output>,
}

impl Differ {
    pub fn new(
        resource: impl Into<String>,
        filter: NameFilter,
        label_rule: RedactionRule,
        annotation_rule: RedactionRule,
        output: Arc<dyn Output>,
    ) -> Self {
        Differ {
            resource: resource.into(),
            filter,
            label_rule,
            annotation_rule,
            path_prefix: String::new(),
            output,
        }
    }

    /// Sets a root prefix prepended to every rendered diff path.
    pub fn with_path_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.path_prefix = prefix.into();
        self
    }

    /// Runs the dispatcher: waits for the watch source's cache to sync,
    /// then processes events until `stop` fires or the stream ends.
    pub fn run(&self, source: &mut dyn WatchSource, stop: &StopSignal) -> Result<(), DifferError> {
        debug!(resource = %self.resource, "waiting for cache sync");
        if !source.wait_for_sync(stop) {
            return Err(DifferError::SyncFailed {
                resource: self.resource.clone(),
            });
        }

        debug!(resource = %self.resource, "cache synced, processing events");
        source.process(self, stop);

        debug!(resource = %self.resource, "dispatcher stopped");
        Ok(())
    }

    fn added(&self, raw: &Value) {
        let Some(object) = self.must_wrap(raw) else {
            return;
        };
        if self.filter.matches(object.name()) {
            self.output
                .write_added(object.name(), object.namespace(), object.kind());
        }
    }

    fn deleted(&self, raw: &Value) {
        let Some(object) = self.must_wrap(raw) else {
            return;
        };
        if self.filter.matches(object.name()) {
            self.output
                .write_deleted(object.name(), object.namespace(), object.kind());
        }
    }

    fn updated(&self, old_raw: &Value, new_raw: &Value) {
        let (Some(old), Some(new)) = (self.must_wrap(old_raw), self.must_wrap(new_raw)) else {
            return;
        };

        if !self.filter.matches(old.name()) && !self.filter.matches(new.name()) {
            return;
        }

        let old_target = old.comparison_target(&self.label_rule, &self.annotation_rule);
        let new_target = new.comparison_target(&self.label_rule, &self.annotation_rule);

        let entries = diff_maps(&old_target, &new_target);
        if entries.is_empty() {
            // Resync with no semantic change; emit nothing.
            return;
        }

        let diffs: Vec<String> = entries
            .iter()
            .map(|entry| entry.render(&self.path_prefix))
            .collect();
        self.output
            .write_updated(new.name(), new.namespace(), new.kind(), &diffs);
    }

    fn must_wrap(&self, raw: &Value) -> Option<CanonicalObject> {
        match wrap(raw) {
            Ok(object) => Some(object),
            Err(err) => {
                error!(resource = %self.resource, error = %err, "failed to wrap event payload, skipping event");
                None
            }
        }
    }

    /// Last line of defense: a panic while handling one event is logged
    /// and the event dropped, so a malformed payload cannot take down the
    /// whole watch loop.
    fn guard(&self, verb: &str, f: impl FnOnce()) {
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(f)) {
            let reason = panic_message(payload.as_ref());
            error!(resource = %self.resource, verb, reason, "panic while processing event, dropping it");
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "unknown panic"
    }
}

impl EventHandler for Differ {
    fn on_add(&self, obj: &Value) {
        self.guard("add", || self.added(obj));
    }

    fn on_update(&self, old: &Value, new: &Value) {
        self.guard("update", || self.updated(old, new));
    }

    fn on_delete(&self, obj: &Value) {
        self.guard("delete", || self.deleted(obj));
    }
}
