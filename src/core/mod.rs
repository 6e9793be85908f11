//! Core types: errors, configuration, path helpers, cancellation.

pub mod config;
pub mod errors;
pub mod paths;
#[cfg(feature = "signals")]
pub mod signals;
