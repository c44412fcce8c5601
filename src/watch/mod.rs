//! Watch module - the boundary to the external watch-and-cache subsystem.
//!
//! The informer machinery itself lives outside this crate; these traits
//! describe exactly what the differ needs from it. [`ReplaySource`] is the
//! in-repo implementation, replaying a recorded watch stream.

mod replay;
mod source;

pub use replay::*;
pub use source::*;
