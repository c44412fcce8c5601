//! Structural diff engine.
//!
//! Compares two untyped trees leaf by leaf and collects the points of
//! divergence. Entries come out in traversal order: map keys in the
//! merged sorted order of both sides, sequence elements by position.

use crate::differ::path::{DiffPath, PathStep};
use crate::value::{Map, Value};
use std::fmt;

/// What happened at one leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffKind {
    /// Present only on the new side.
    Added,
    /// Present only on the old side.
    Deleted,
    /// Present on both sides with different values.
    Modified,
}

/// One leaf-level difference between the old and new snapshots.
#[derive(Debug, Clone, PartialEq)]
pub struct DiffEntry {
    pub path: DiffPath,
    pub kind: DiffKind,
    pub old: Option<Value>,
    pub new: Option<Value>,
}

impl DiffEntry {
    fn added(path: DiffPath, new: Value) -> Self {
        DiffEntry {
            path,
            kind: DiffKind::Added,
            old: None,
            new: Some(new),
        }
    }

    fn deleted(path: DiffPath, old: Value) -> Self {
        DiffEntry {
            path,
            kind: DiffKind::Deleted,
            old: Some(old),
            new: None,
        }
    }

    fn modified(path: DiffPath, old: Value, new: Value) -> Self {
        DiffEntry {
            path,
            kind: DiffKind::Modified,
            old: Some(old),
            new: Some(new),
        }
    }

    /// Renders the entry as `path: new (added)`, `path: old (deleted)`,
    /// or `path: old -> new`, with an optional root prefix on the path.
    pub fn render(&self, prefix: &str) -> String {
        let path = self.path.render(prefix);
        match self.kind {
            DiffKind::Added => format!("{}: {} (added)", path, display(&self.new)),
            DiffKind::Deleted => format!("{}: {} (deleted)", path, display(&self.old)),
            DiffKind::Modified => {
                format!("{}: {} -> {}", path, display(&self.old), display(&self.new))
            }
        }
    }
}

fn display(v: &Option<Value>) -> impl fmt::Display + '_ {
    struct D<'a>(&'a Option<Value>);
    impl fmt::Display for D<'_> {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self.0 {
                Some(v) => write!(f, "{}", v),
                None => write!(f, "<absent>"),
            }
        }
    }
    D(v)
}

impl fmt::Display for DiffEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render(""))
    }
}

/// Computes the structural diff between two comparison targets.
pub fn diff_maps(old: &Map, new: &Map) -> Vec<DiffEntry> {
    let mut entries = Vec::new();
    let mut path = DiffPath::new();
    walk_maps(old, new, &mut path, &mut entries);
    entries
}

/// Computes the structural diff between two arbitrary trees.
pub fn diff(old: &Value, new: &Value) -> Vec<DiffEntry> {
    let mut entries = Vec::new();
    let mut path = DiffPath::new();
    walk(Some(old), Some(new), &mut path, &mut entries);
    entries
}

fn walk(
    old: Option<&Value>,
    new: Option<&Value>,
    path: &mut DiffPath,
    entries: &mut Vec<DiffEntry>,
) {
    match (old, new) {
        // Both missing is equal; nothing to report.
        (None, None) => {}
        (None, Some(new)) => entries.push(DiffEntry::added(path.clone(), new.clone())),
        (Some(old), None) => entries.push(DiffEntry::deleted(path.clone(), old.clone())),
        (Some(old), Some(new)) => match (old, new) {
            (Value::Map(o), Value::Map(n)) => walk_maps(o, n, path, entries),
            (Value::List(o), Value::List(n)) => walk_lists(o, n, path, entries),
            // A shape change (scalar vs composite, or list vs map) is one
            // modified leaf carrying both whole values.
            _ => {
                if old != new {
                    entries.push(DiffEntry::modified(path.clone(), old.clone(), new.clone()));
                }
            }
        },
    }
}

fn walk_maps(old: &Map, new: &Map, path: &mut DiffPath, entries: &mut Vec<DiffEntry>) {
    // BTreeMap keys are sorted, so the merged union is visited in a
    // stable order without sorting entries afterward.
    let mut keys: Vec<&String> = old.fields.keys().collect();
    for key in new.fields.keys() {
        if !old.has(key) {
            keys.push(key);
        }
    }
    keys.sort();

    for key in keys {
        path.push(PathStep::field(key.clone()));
        walk(old.get(key), new.get(key), path, entries);
        path.pop();
    }
}

fn walk_lists(old: &[Value], new: &[Value], path: &mut DiffPath, entries: &mut Vec<DiffEntry>) {
    // Positional pairing. Elements without a stable identity cannot be
    // matched across reorders; a shifted list reports per-index changes.
    let len = old.len().max(new.len());
    for i in 0..len {
        path.push(PathStep::index(i));
        walk(old.get(i), new.get(i), path, entries);
        path.pop();
    }
}
