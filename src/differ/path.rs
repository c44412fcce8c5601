//! Diff path representation and string formatting.

use std::fmt;

/// One step of traversal into the compared tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathStep {
    /// Map key.
    Field(String),
    /// Sequence position. The diff engine pairs sequence elements by
    /// position, so for an element present on one side only this is that
    /// side's index, and otherwise the shared index.
    Index(usize),
}

impl PathStep {
    pub fn field(name: impl Into<String>) -> Self {
        PathStep::Field(name.into())
    }

    pub fn index(i: usize) -> Self {
        PathStep::Index(i)
    }
}

/// A complete path from the comparison root to one point of divergence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffPath {
    steps: Vec<PathStep>,
}

impl DiffPath {
    pub fn new() -> Self {
        DiffPath { steps: Vec::new() }
    }

    pub fn from_steps(steps: Vec<PathStep>) -> Self {
        DiffPath { steps }
    }

    pub fn push(&mut self, step: PathStep) {
        self.steps.push(step);
    }

    pub fn pop(&mut self) -> Option<PathStep> {
        self.steps.pop()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PathStep> {
        self.steps.iter()
    }

    /// Renders the path as a stable string, prepending `prefix` when one
    /// is configured.
    ///
    /// Map keys append `.key`, or `[key]` when the raw key text contains
    /// a `.` (a dotted label key would otherwise be indistinguishable
    /// from nested traversal). Sequence positions append `[i]`. The first
    /// component is bare when there is no prefix, so a top-level field
    /// renders `spec.replicas`, not `.spec.replicas`.
    pub fn render(&self, prefix: &str) -> String {
        let mut out = String::from(prefix);
        for step in &self.steps {
            match step {
                PathStep::Field(key) => {
                    if key.contains('.') {
                        out.push('[');
                        out.push_str(key);
                        out.push(']');
                    } else {
                        if !out.is_empty() {
                            out.push('.');
                        }
                        out.push_str(key);
                    }
                }
                PathStep::Index(i) => {
                    out.push('[');
                    out.push_str(&i.to_string());
                    out.push(']');
                }
            }
        }
        out
    }
}

impl fmt::Display for DiffPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render(""))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_render_dotted_fields() {
        let path = DiffPath::from_steps(vec![PathStep::field("spec"), PathStep::field("replicas")]);
        assert_eq!(path.render(""), "spec.replicas");
    }

    #[test]
    fn test_render_with_prefix() {
        let path = DiffPath::from_steps(vec![PathStep::field("replicas")]);
        assert_eq!(path.render("spec"), "spec.replicas");
    }

    #[test]
    fn test_render_brackets_dotted_keys() {
        let path = DiffPath::from_steps(vec![
            PathStep::field("metadata"),
            PathStep::field("labels"),
            PathStep::field("app.kubernetes.io/name"),
        ]);
        assert_eq!(path.render(""), "metadata.labels[app.kubernetes.io/name]");
    }

    #[test]
    fn test_render_sequence_indices() {
        let path = DiffPath::from_steps(vec![
            PathStep::field("spec"),
            PathStep::field("containers"),
            PathStep::index(1),
            PathStep::field("image"),
        ]);
        assert_eq!(path.render(""), "spec.containers[1].image");
    }
}
