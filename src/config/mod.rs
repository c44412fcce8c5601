//! Config module - YAML configuration for the diff logger.

mod config;

pub use config::*;
