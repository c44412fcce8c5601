//! Canonical object adapter.

use crate::differ::RedactionRule;
use crate::value::{Map, Value};
use serde::Deserialize;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::warn;

/// Kind reported when the payload carries no explicit `kind` field.
pub const UNSTRUCTURED_KIND: &str = "Unstructured";

/// UnwrapError means the raw payload was not the expected structured-object
/// shape. This is a wiring error, not a transient condition: callers log it
/// and skip the event.
#[derive(Debug, Clone, Error)]
#[error("expected a structured object, received {actual}")]
pub struct UnwrapError {
    pub actual: &'static str,
}

/// The subset of object metadata the differ cares about.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ObjectMeta {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
}

/// A normalized snapshot of one watched object at one point in time.
///
/// Built fresh per event; the raw tree is cloned out of the payload so
/// redaction and diffing never corrupt the watch source's cached copy.
#[derive(Debug, Clone)]
pub struct CanonicalObject {
    kind: String,
    metadata: ObjectMeta,
    raw: Map,
}

/// Wraps a raw watch payload into a [`CanonicalObject`].
pub fn wrap(raw: &Value) -> Result<CanonicalObject, UnwrapError> {
    let map = raw.as_map().ok_or(UnwrapError {
        actual: raw.type_name(),
    })?;

    let kind = map
        .get("kind")
        .and_then(Value::as_str)
        .unwrap_or(UNSTRUCTURED_KIND)
        .to_string();

    Ok(CanonicalObject {
        kind,
        metadata: extract_metadata(map),
        raw: map.clone(),
    })
}

/// Re-serializes the metadata subtree into [`ObjectMeta`]. Malformed
/// metadata degrades to the empty default rather than failing the event.
fn extract_metadata(map: &Map) -> ObjectMeta {
    let meta = match map.get("metadata") {
        Some(meta) => meta,
        None => return ObjectMeta::default(),
    };

    serde_json::to_string(meta)
        .and_then(|json| serde_json::from_str(&json))
        .unwrap_or_else(|err| {
            warn!(error = %err, "malformed object metadata, treating as empty");
            ObjectMeta::default()
        })
}

impl CanonicalObject {
    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn metadata(&self) -> &ObjectMeta {
        &self.metadata
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn namespace(&self) -> &str {
        &self.metadata.namespace
    }

    /// Builds the tree the diff engine compares.
    ///
    /// Always contains the spec (and any other top-level fields); never
    /// contains status, and never raw metadata beyond the optionally
    /// included, redacted labels and annotations.
    pub fn comparison_target(
        &self,
        label_rule: &RedactionRule,
        annotation_rule: &RedactionRule,
    ) -> Map {
        let mut target = self.raw.clone();

        target.delete("status");
        target.delete("metadata");

        let mut metadata = Map::new();

        if label_rule.enable {
            let mut labels = self.metadata.labels.clone();
            label_rule.redact(&mut labels);
            metadata.set("labels".into(), string_map_value(labels));
        }

        if annotation_rule.enable {
            let mut annotations = self.metadata.annotations.clone();
            annotation_rule.redact(&mut annotations);
            metadata.set("annotations".into(), string_map_value(annotations));
        }

        target.set("metadata".into(), Value::Map(metadata));

        target
    }
}

fn string_map_value(map: BTreeMap<String, String>) -> Value {
    let mut out = Map::new();
    for (k, v) in map {
        out.set(k, Value::String(v));
    }
    Value::Map(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::from_json;

    fn deployment() -> Value {
        from_json(
            r#"{
                "kind": "Deployment",
                "metadata": {
                    "name": "web-1",
                    "namespace": "prod",
                    "labels": {"app": "web", "release": "r42"},
                    "annotations": {"note": "hi"}
                },
                "spec": {"replicas": 3},
                "status": {"readyReplicas": 3}
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_wrap_extracts_identity() {
        let obj = wrap(&deployment()).unwrap();
        assert_eq!(obj.kind(), "Deployment");
        assert_eq!(obj.name(), "web-1");
        assert_eq!(obj.namespace(), "prod");
        assert_eq!(obj.metadata().labels.get("app"), Some(&"web".to_string()));
    }

    #[test]
    fn test_wrap_rejects_non_map() {
        let err = wrap(&Value::String("nope".into())).unwrap_err();
        assert_eq!(err.actual, "string");
    }

    #[test]
    fn test_wrap_defaults_kind() {
        let obj = wrap(&from_json(r#"{"spec": {}}"#).unwrap()).unwrap();
        assert_eq!(obj.kind(), UNSTRUCTURED_KIND);
    }

    #[test]
    fn test_wrap_tolerates_malformed_metadata() {
        let obj = wrap(&from_json(r#"{"metadata": "oops"}"#).unwrap()).unwrap();
        assert_eq!(obj.name(), "");
        assert!(obj.metadata().labels.is_empty());
    }

    #[test]
    fn test_comparison_target_excludes_status_and_metadata() {
        let obj = wrap(&deployment()).unwrap();
        let target = obj.comparison_target(&RedactionRule::disabled(), &RedactionRule::disabled());

        assert!(!target.has("status"));
        assert!(target.has("spec"));
        let metadata = target.get("metadata").unwrap().as_map().unwrap();
        assert!(metadata.is_empty());
    }

    #[test]
    fn test_comparison_target_includes_redacted_labels() {
        let obj = wrap(&deployment()).unwrap();
        let rule = RedactionRule {
            enable: true,
            ignore_keys: vec!["release".into()],
        };
        let target = obj.comparison_target(&rule, &RedactionRule::disabled());

        let metadata = target.get("metadata").unwrap().as_map().unwrap();
        let labels = metadata.get("labels").unwrap().as_map().unwrap();
        assert!(labels.has("app"));
        assert!(!labels.has("release"));
        assert!(!metadata.has("annotations"));
    }
}
