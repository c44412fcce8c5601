//! Wrapper module - normalizes raw watch payloads into canonical objects.
//!
//! The watch source delivers opaque, dynamically-typed trees. The adapter
//! turns them into a [`CanonicalObject`] exposing kind, metadata, and the
//! raw structure, and builds the comparison target the diff engine runs on.

mod canonical;

pub use canonical::*;
