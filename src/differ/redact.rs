//! Redaction of configured label/annotation keys before comparison.

use serde::Deserialize;
use std::collections::BTreeMap;

/// RedactionRule controls whether a metadata string map (labels or
/// annotations) takes part in comparison, and which keys are stripped
/// from it first. One instance exists for labels and one for annotations,
/// each independently toggleable.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RedactionRule {
    #[serde(default)]
    pub enable: bool,
    #[serde(default)]
    pub ignore_keys: Vec<String>,
}

impl RedactionRule {
    /// A rule that excludes the map from comparison entirely.
    pub fn disabled() -> Self {
        RedactionRule::default()
    }

    /// Removes each configured key from `map` in place. Absent keys are a
    /// no-op, so applying the rule twice is the same as applying it once.
    /// Callers must pass a map they own a fresh copy of, never the watch
    /// source's cached instance.
    pub fn redact(&self, map: &mut BTreeMap<String, String>) {
        for key in &self.ignore_keys {
            map.remove(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn labels() -> BTreeMap<String, String> {
        BTreeMap::from([("a".to_string(), "1".to_string()), ("b".to_string(), "2".to_string())])
    }

    #[test]
    fn test_redact_removes_configured_keys() {
        let rule = RedactionRule {
            enable: true,
            ignore_keys: vec!["a".into()],
        };
        let mut map = labels();
        rule.redact(&mut map);
        assert_eq!(map, BTreeMap::from([("b".to_string(), "2".to_string())]));
    }

    #[test]
    fn test_redact_absent_key_is_noop() {
        let rule = RedactionRule {
            enable: true,
            ignore_keys: vec!["missing".into()],
        };
        let mut map = labels();
        rule.redact(&mut map);
        assert_eq!(map, labels());
    }

    #[test]
    fn test_redact_is_idempotent() {
        let rule = RedactionRule {
            enable: true,
            ignore_keys: vec!["a".into()],
        };
        let mut once = labels();
        rule.redact(&mut once);
        let mut twice = labels();
        rule.redact(&mut twice);
        rule.redact(&mut twice);
        assert_eq!(once, twice);
    }
}
