//! Plain-text violation log, appended after every run.
//!
//! One line per violation in the same `NAME TOO LONG [observed/limit]: path`
//! form the terminal shows. A run that appends to a non-empty log first writes
//! a dated separator block so consecutive runs stay readable.

#![allow(missing_docs)]

use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, Local};

use crate::core::errors::{Result, TlError};
use crate::scanner::limits::Violation;

/// Line written when a run found nothing.
pub const CLEAN_LINE: &str = "All paths and names are within Linux limits";

const SEPARATOR_WIDTH: usize = 60;

/// Render the lines for one run, without the separator block.
#[must_use]
pub fn render_lines(violations: &[Violation]) -> Vec<String> {
    if violations.is_empty() {
        return vec![CLEAN_LINE.to_string()];
    }
    violations.iter().map(ToString::to_string).collect()
}

/// Append one run's result to `log_file`, creating it if needed.
pub fn append_report(log_file: &Path, violations: &[Violation]) -> Result<()> {
    append_report_at(log_file, violations, Local::now())
}

/// Same as [`append_report`] with an explicit timestamp for the separator.
pub fn append_report_at(
    log_file: &Path,
    violations: &[Violation],
    at: DateTime<Local>,
) -> Result<()> {
    let has_history = fs::metadata(log_file).is_ok_and(|meta| meta.len() > 0);

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .map_err(|source| TlError::io(log_file, source))?;
    let mut out = BufWriter::new(file);

    let mut write = |line: &str| {
        writeln!(out, "{line}").map_err(|source| TlError::io(log_file, source))
    };

    if has_history {
        let rule = "=".repeat(SEPARATOR_WIDTH);
        write("")?;
        write(&rule)?;
        write(&format!("Scan at {}", at.format("%Y-%m-%d %H:%M:%S")))?;
        write(&rule)?;
    }
    for line in render_lines(violations) {
        write(&line)?;
    }

    out.flush().map_err(|source| TlError::io(log_file, source))
}
