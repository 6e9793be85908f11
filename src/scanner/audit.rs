//! Scan driver: walk a tree, check every entry, stream the violations.

#![allow(missing_docs)]

use std::collections::VecDeque;
use std::path::Path;

use crate::core::config::LimitsConfig;
use crate::core::errors::{Result, TlError};
use crate::scanner::limits::{LimitChecker, Violation};
use crate::scanner::walker::TreeWalker;

/// Progress snapshot handed to the progress callback after each entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanProgress {
    pub visited: u64,
    /// Known only when the caller ran `count_entries` first.
    pub total: Option<u64>,
}

impl ScanProgress {
    /// Percentage done, when a total is known.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn percent(&self) -> Option<f64> {
        match self.total {
            Some(0) => Some(100.0),
            Some(total) => Some((self.visited as f64 / total as f64 * 100.0).min(100.0)),
            None => None,
        }
    }
}

type ProgressFn<'a> = Box<dyn FnMut(ScanProgress) + 'a>;
type StopFn<'a> = Box<dyn Fn() -> bool + 'a>;

/// Configured scanner. Consumed by [`scan`](Self::scan).
pub struct Scanner<'a> {
    checker: LimitChecker,
    total: Option<u64>,
    progress: Option<ProgressFn<'a>>,
    stop_check: Option<StopFn<'a>>,
}

impl<'a> Scanner<'a> {
    #[must_use]
    pub fn new(limits: &LimitsConfig) -> Self {
        Self {
            checker: LimitChecker::new(limits),
            total: None,
            progress: None,
            stop_check: None,
        }
    }

    /// Invoke `callback` after every visited entry.
    #[must_use]
    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: FnMut(ScanProgress) + 'a,
    {
        self.progress = Some(Box::new(callback));
        self
    }

    /// Entry count reported as `ScanProgress::total`.
    #[must_use]
    pub const fn with_total(mut self, total: u64) -> Self {
        self.total = Some(total);
        self
    }

    /// Polled before each entry; returning `true` ends the stream early.
    #[must_use]
    pub fn with_stop_check<F>(mut self, check: F) -> Self
    where
        F: Fn() -> bool + 'a,
    {
        self.stop_check = Some(Box::new(check));
        self
    }

    /// Start a scan below `root`.
    ///
    /// Fails fast with `TlError::InvalidRoot` when the root is missing or not a
    /// directory. Nothing on disk is modified.
    pub fn scan(self, root: impl AsRef<Path>) -> Result<ViolationStream<'a>> {
        let walker = TreeWalker::new(root)?;
        Ok(ViolationStream {
            walker,
            checker: self.checker,
            buffered: VecDeque::with_capacity(2),
            visited: 0,
            total: self.total,
            progress: self.progress,
            stop_check: self.stop_check,
            interrupted: false,
        })
    }
}

/// Lazy, finite, non-restartable sequence of scan results.
///
/// `Ok` items are violations; `Err` items are subtrees that could not be read
/// (`TlError::ScanIo`) and were skipped.
pub struct ViolationStream<'a> {
    walker: TreeWalker,
    checker: LimitChecker,
    buffered: VecDeque<Violation>,
    visited: u64,
    total: Option<u64>,
    progress: Option<ProgressFn<'a>>,
    stop_check: Option<StopFn<'a>>,
    interrupted: bool,
}

impl ViolationStream<'_> {
    /// Entries visited so far.
    #[must_use]
    pub const fn entries_scanned(&self) -> u64 {
        self.visited
    }

    /// Whether the stop check ended the stream before the walk finished.
    #[must_use]
    pub const fn was_interrupted(&self) -> bool {
        self.interrupted
    }
}

impl Iterator for ViolationStream<'_> {
    type Item = Result<Violation>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(violation) = self.buffered.pop_front() {
                return Some(Ok(violation));
            }
            if self.interrupted {
                return None;
            }
            if let Some(check) = &self.stop_check
                && check()
            {
                self.interrupted = true;
                return None;
            }

            let entry = match self.walker.next()? {
                Ok(entry) => entry,
                Err(err) => return Some(Err(err)),
            };

            self.visited += 1;
            self.buffered.extend(self.checker.check(&entry));

            if let Some(progress) = self.progress.as_mut() {
                progress(ScanProgress {
                    visited: self.visited,
                    total: self.total,
                });
            }
        }
    }
}

/// Count the entries below `root` with a separate walk, for progress totals.
///
/// Unreadable subtrees are silently left out of the count. `stop_check` is
/// polled before each entry; once it returns `true` the count is abandoned
/// with `TlError::Interrupted`.
pub fn count_entries(
    root: impl AsRef<Path>,
    stop_check: Option<&dyn Fn() -> bool>,
) -> Result<u64> {
    let mut walker = TreeWalker::new(root)?;
    let mut count = 0;
    loop {
        if stop_check.is_some_and(|check| check()) {
            return Err(TlError::Interrupted);
        }
        match walker.next() {
            Some(Ok(_)) => count += 1,
            Some(Err(_)) => {}
            None => return Ok(count),
        }
    }
}

/// Everything a drained stream produced.
#[derive(Debug, Default)]
pub struct ScanReport {
    pub violations: Vec<Violation>,
    /// `TlError::ScanIo` items for subtrees that were skipped.
    pub skipped: Vec<TlError>,
    pub entries_scanned: u64,
    pub interrupted: bool,
}

impl ScanReport {
    pub fn name_violations(&self) -> impl Iterator<Item = &Violation> {
        self.violations.iter().filter(|v| v.kind.is_name())
    }

    pub fn path_violations(&self) -> impl Iterator<Item = &Violation> {
        self.violations.iter().filter(|v| v.kind.is_path())
    }

    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Drain a stream into a [`ScanReport`].
pub fn collect_scan(mut stream: ViolationStream<'_>) -> ScanReport {
    let mut report = ScanReport::default();
    for item in stream.by_ref() {
        match item {
            Ok(violation) => report.violations.push(violation),
            Err(err) => report.skipped.push(err),
        }
    }
    report.entries_scanned = stream.entries_scanned();
    report.interrupted = stream.was_interrupted();
    report
}

// ──────────────────── tests ────────────────────
