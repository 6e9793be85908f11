//! Convenience re-exports for library consumers.
//!
//! ```rust,no_run
//! use toolong::prelude::*;
//! ```

// Core
pub use crate::core::config::{Config, DirectoryStrategy, LimitsConfig, RemediationConfig};
pub use crate::core::errors::{Result, TlError};
#[cfg(feature = "signals")]
pub use crate::core::signals::SignalHandler;

// Scanner
pub use crate::scanner::audit::{ScanReport, Scanner, ViolationStream, collect_scan, count_entries};
pub use crate::scanner::limits::{LimitChecker, Violation, ViolationKind};
pub use crate::scanner::walker::{EntryKind, TreeWalker, WalkEntry};

// Remediation
pub use crate::remedy::fixer::{FixOutcome, FixReport, Remediator};
pub use crate::remedy::naming::{NamePlan, NameRules};

// Logging
pub use crate::logger::activity::{ActivityEvent, ActivityLogger};
pub use crate::logger::report::append_report;
