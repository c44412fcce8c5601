//! Value module - In-memory representation of YAML/JSON objects.
//!
//! This is the untyped tree every watched object is normalized into
//! before filtering, redaction, and diffing.

mod value;

pub use value::*;
