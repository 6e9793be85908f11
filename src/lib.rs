#![forbid(unsafe_code)]

//! toolong: audit directory trees for names and paths that exceed Linux
//! byte limits, and shorten overlong names without losing data.
//!
//! Two halves:
//! 1. **Scanner** walks a tree without following symlinks and reports every
//!    name of 255 bytes or more and every path of 4096 bytes or more.
//! 2. **Remediator** splits an overlong name into a directory plus a
//!    shorter leaf (or truncates it), picking collision-free targets.
//!
//! # Library usage
//!
//! ```rust,no_run
//! use toolong::prelude::*;
//!
//! let config = Config::default();
//! let stream = Scanner::new(&config.limits).scan("/data")?;
//! let report = collect_scan(stream);
//! let fixes = Remediator::new(&config).apply(&report.violations, None);
//! println!("fixed {} of {}", fixes.fixed.len(), report.violations.len());
//! # Ok::<(), toolong::core::errors::TlError>(())
//! ```

pub mod prelude;

pub mod core;
pub mod logger;
pub mod remedy;
pub mod scanner;
