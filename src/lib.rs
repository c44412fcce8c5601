//! # Kube Diff Logger
//!
//! Watches create/update/delete events for Kubernetes objects and emits a
//! log line describing every semantic change: which field, under what path,
//! changed from what to what.
//!
//! ## Modules
//!
//! - [`value`] - In-memory representation of YAML/JSON object trees
//! - [`wrapper`] - Normalizes raw watch payloads into canonical objects
//! - [`differ`] - Filtering, structural diffing, path formatting, and output
//! - [`watch`] - The boundary to the external watch-and-cache subsystem
//! - [`config`] - YAML configuration

pub mod config;
pub mod differ;
pub mod value;
pub mod watch;
pub mod wrapper;

pub use config::{Config, ConfigError, DifferConfig, GroupKind};
pub use differ::{
    DiffEntry, DiffKind, DiffPath, Differ, DifferError, FilterStyle, NameFilter, Output,
    OutputFormat, PathStep, RedactionRule, StreamOutput,
};
pub use value::Value;
pub use watch::{EventHandler, ReplaySource, StopSignal, WatchSource};
pub use wrapper::{CanonicalObject, ObjectMeta, UnwrapError};
