//! Replay of recorded watch streams.

use crate::value::Value;
use crate::watch::{EventHandler, StopSignal, WatchSource};
use serde::Deserialize;
use std::collections::{BTreeMap, VecDeque};
use std::io::BufRead;
use thiserror::Error;
use tracing::{debug, warn};

/// Error reading a recorded watch stream.
#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("failed to read event stream: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed event on line {line}: {source}")]
    Malformed {
        line: usize,
        source: serde_json::Error,
    },
}

/// One recorded event, in the shape `kubectl get --watch -o json` emits:
/// `{"type": "ADDED" | "MODIFIED" | "DELETED", "object": {...}}`.
#[derive(Debug, Clone, Deserialize)]
struct WireEvent {
    #[serde(rename = "type")]
    event_type: String,
    object: Value,
}

/// Replays a recorded JSON-lines watch stream.
///
/// Keeps a namespace/name-keyed cache of the last seen payload so a
/// MODIFIED event can hand the handler the previous snapshot as well,
/// the way an informer cache would.
#[derive(Debug)]
pub struct ReplaySource {
    events: VecDeque<WireEvent>,
    cache: BTreeMap<(String, String), Value>,
}

impl ReplaySource {
    /// Parses a JSON-lines stream. Blank lines are skipped; a malformed
    /// line fails the whole stream, since a truncated recording would
    /// otherwise silently drop events.
    pub fn from_reader(reader: impl BufRead) -> Result<Self, ReplayError> {
        let mut events = VecDeque::new();
        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let event: WireEvent =
                serde_json::from_str(&line).map_err(|source| ReplayError::Malformed {
                    line: i + 1,
                    source,
                })?;
            events.push_back(event);
        }
        Ok(ReplaySource {
            events,
            cache: BTreeMap::new(),
        })
    }

    /// Keeps only events whose object kind matches, case-insensitively.
    /// Used to fan one recorded stream out to per-resource dispatchers.
    pub fn retain_kind(&mut self, kind: &str) {
        self.events
            .retain(|event| object_kind(&event.object).eq_ignore_ascii_case(kind));
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

fn object_kind(object: &Value) -> &str {
    object
        .as_map()
        .and_then(|m| m.get("kind"))
        .and_then(Value::as_str)
        .unwrap_or("")
}

fn object_key(object: &Value) -> (String, String) {
    let meta = object
        .as_map()
        .and_then(|m| m.get("metadata"))
        .and_then(Value::as_map);
    let field = |name: &str| {
        meta.and_then(|m| m.get(name))
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string()
    };
    (field("namespace"), field("name"))
}

impl WatchSource for ReplaySource {
    fn wait_for_sync(&mut self, stop: &StopSignal) -> bool {
        // A recording is synced by construction.
        !stop.is_stopped()
    }

    fn process(&mut self, handler: &dyn EventHandler, stop: &StopSignal) {
        while let Some(event) = self.events.pop_front() {
            if stop.is_stopped() {
                return;
            }

            let key = object_key(&event.object);
            match event.event_type.as_str() {
                "ADDED" => {
                    handler.on_add(&event.object);
                    self.cache.insert(key, event.object);
                }
                "MODIFIED" => {
                    match self.cache.get(&key) {
                        Some(old) => handler.on_update(old, &event.object),
                        None => {
                            // No prior snapshot; a resyncing informer
                            // would deliver this as an add.
                            debug!(?key, "MODIFIED without prior snapshot, delivering as add");
                            handler.on_add(&event.object);
                        }
                    }
                    self.cache.insert(key, event.object);
                }
                "DELETED" => {
                    handler.on_delete(&event.object);
                    self.cache.remove(&key);
                }
                other => {
                    warn!(event_type = other, "skipping unknown watch event type");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<String>>,
    }

    impl EventHandler for Recorder {
        fn on_add(&self, obj: &Value) {
            self.calls.lock().unwrap().push(format!("add {}", name_of(obj)));
        }

        fn on_update(&self, old: &Value, new: &Value) {
            self.calls
                .lock()
                .unwrap()
                .push(format!("update {} {}", name_of(old), name_of(new)));
        }

        fn on_delete(&self, obj: &Value) {
            self.calls.lock().unwrap().push(format!("delete {}", name_of(obj)));
        }
    }

    fn name_of(obj: &Value) -> String {
        object_key(obj).1
    }

    const STREAM: &str = r#"
{"type":"ADDED","object":{"kind":"Deployment","metadata":{"name":"web-1","namespace":"prod"},"spec":{"replicas":3}}}
{"type":"MODIFIED","object":{"kind":"Deployment","metadata":{"name":"web-1","namespace":"prod"},"spec":{"replicas":5}}}
{"type":"DELETED","object":{"kind":"Deployment","metadata":{"name":"web-1","namespace":"prod"},"spec":{"replicas":5}}}
"#;

    #[test]
    fn test_replay_pairs_modified_with_cached_old() {
        let mut source = ReplaySource::from_reader(STREAM.trim().as_bytes()).unwrap();
        let recorder = Recorder::default();
        let stop = StopSignal::new();

        assert!(source.wait_for_sync(&stop));
        source.process(&recorder, &stop);

        let calls = recorder.calls.lock().unwrap();
        assert_eq!(
            *calls,
            vec!["add web-1", "update web-1 web-1", "delete web-1"]
        );
    }

    #[test]
    fn test_modified_without_prior_snapshot_is_an_add() {
        let stream = r#"{"type":"MODIFIED","object":{"kind":"Deployment","metadata":{"name":"web-1"},"spec":{}}}"#;
        let mut source = ReplaySource::from_reader(stream.as_bytes()).unwrap();
        let recorder = Recorder::default();

        source.process(&recorder, &StopSignal::new());
        assert_eq!(*recorder.calls.lock().unwrap(), vec!["add web-1"]);
    }

    #[test]
    fn test_retain_kind_filters_case_insensitively() {
        let stream = r#"
{"type":"ADDED","object":{"kind":"Deployment","metadata":{"name":"a"}}}
{"type":"ADDED","object":{"kind":"StatefulSet","metadata":{"name":"b"}}}
"#;
        let mut source = ReplaySource::from_reader(stream.trim().as_bytes()).unwrap();
        source.retain_kind("deployment");
        assert_eq!(source.len(), 1);
    }

    #[test]
    fn test_malformed_line_is_an_error() {
        let err = ReplaySource::from_reader("not json".as_bytes()).unwrap_err();
        assert!(matches!(err, ReplayError::Malformed { line: 1, .. }));
    }

    #[test]
    fn test_stop_halts_replay() {
        let mut source = ReplaySource::from_reader(STREAM.trim().as_bytes()).unwrap();
        let recorder = Recorder::default();
        let stop = StopSignal::new();
        stop.stop();

        source.process(&recorder, &stop);
        assert!(recorder.calls.lock().unwrap().is_empty());
    }
}
