//! Differ module - change detection and diff formatting.
//!
//! This module decides which watch events are relevant, computes a
//! structural diff between two canonical snapshots, and renders the
//! result through an output sink.

mod diff;
mod dispatcher;
mod filter;
mod output;
mod path;
mod redact;


pub use diff::*;
pub use dispatcher::*;
pub use filter::*;
pub use output::*;
pub use path::*;
pub use redact::*;
