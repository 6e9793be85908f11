//! Name remediation: split or truncate one overlong name, and run batches.
//!
//! Pipeline per violation: reject path violations -> re-inspect the entry
//! -> plan split/truncate -> allocate collision-free names -> create the
//! intermediate directory (split only) -> move the entry.
//!
//! A batch runs deepest-path-first so renaming a directory cannot invalidate
//! the recorded paths of violations below it. Failures are recorded and the
//! batch moves on; only the stop check ends it early, and never mid-fix.

#![allow(missing_docs)]

use std::fmt;
use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::core::config::{Config, DirectoryStrategy, LimitsConfig, RemediationConfig};
use crate::core::errors::{Result, TlError};
use crate::logger::activity::{ActivityEvent, ActivityLogger};
use crate::remedy::allocate::allocate_unique;
use crate::remedy::naming::{NamePlan, NameRules, plan};
use crate::scanner::limits::Violation;
use crate::scanner::walker::EntryKind;

// ──────────────────── report types ────────────────────

/// What one successful fix did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FixOutcome {
    pub kind: EntryKind,
    #[serde(serialize_with = "lossy_path")]
    pub from: PathBuf,
    #[serde(serialize_with = "lossy_path")]
    pub to: PathBuf,
    /// Intermediate directory created by a split; `None` for a rename in place.
    #[serde(serialize_with = "lossy_opt_path")]
    pub created_directory: Option<PathBuf>,
}

impl fmt::Display for FixOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = if self.created_directory.is_some() {
            "moved"
        } else {
            "renamed"
        };
        write!(
            f,
            "{} {verb}: {} -> {}",
            self.kind.label(),
            self.from.display(),
            self.to.display()
        )
    }
}

/// A single fix failure record.
#[derive(Debug, Clone, Serialize)]
pub struct FixFailure {
    #[serde(serialize_with = "lossy_path")]
    pub path: PathBuf,
    pub error: String,
    pub error_code: &'static str,
    pub recoverable: bool,
}

impl FixFailure {
    fn new(path: &Path, error: &TlError) -> Self {
        Self {
            path: path.to_path_buf(),
            error: error.to_string(),
            error_code: error.code(),
            recoverable: error.is_retryable(),
        }
    }
}

/// Summary after a batch completes.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FixReport {
    pub fixed: Vec<FixOutcome>,
    pub failed: Vec<FixFailure>,
    /// Path violations, which are reported but never changed.
    pub unsupported: Vec<Violation>,
    /// Violations left untouched because the stop check fired.
    pub cancelled: usize,
    #[serde(serialize_with = "duration_ms")]
    pub duration: Duration,
}

impl FixReport {
    /// Name violations the batch actually tried.
    #[must_use]
    pub fn attempted(&self) -> usize {
        self.fixed.len() + self.failed.len()
    }

    #[must_use]
    pub fn was_cancelled(&self) -> bool {
        self.cancelled > 0
    }
}

fn lossy_path<S: serde::Serializer>(path: &Path, s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_str(&path.to_string_lossy())
}

#[allow(clippy::ref_option)]
fn lossy_opt_path<S: serde::Serializer>(
    path: &Option<PathBuf>,
    s: S,
) -> std::result::Result<S::Ok, S::Error> {
    match path {
        Some(path) => s.serialize_some(&path.to_string_lossy()),
        None => s.serialize_none(),
    }
}

#[allow(clippy::cast_possible_truncation)]
fn duration_ms<S: serde::Serializer>(d: &Duration, s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis() as u64)
}

// ──────────────────── remediator ────────────────────

/// Moves one filesystem entry; swapped out in tests to inject failures.
type MoveFn = fn(&Path, &Path) -> io::Result<()>;

fn rename_entry(from: &Path, to: &Path) -> io::Result<()> {
    fs::rename(from, to)
}

/// Fixes name violations in place on disk.
pub struct Remediator {
    rules: NameRules,
    max_attempts: u32,
    strategy: DirectoryStrategy,
    logger: ActivityLogger,
    move_op: MoveFn,
}

impl Remediator {
    /// Build from the effective configuration. Activity logging starts disabled.
    pub fn new(config: &Config) -> Self {
        Self::from_parts(&config.limits, &config.remediation)
    }

    pub fn from_parts(limits: &LimitsConfig, remediation: &RemediationConfig) -> Self {
        Self {
            rules: NameRules::new(limits, remediation),
            max_attempts: remediation.max_collision_attempts,
            strategy: remediation.directory_strategy,
            logger: ActivityLogger::disabled(),
            move_op: rename_entry,
        }
    }

    #[must_use]
    pub fn with_logger(mut self, logger: ActivityLogger) -> Self {
        self.logger = logger;
        self
    }

    #[cfg(test)]
    fn with_move_op(mut self, op: MoveFn) -> Self {
        self.move_op = op;
        self
    }

    /// Repair one violation.
    ///
    /// Side effects are bounded: at most one new directory and one moved
    /// entry (plus that entry's direct children when a directory has to be
    /// relocated piecewise). File content is never deleted.
    pub fn fix(&self, violation: &Violation) -> Result<FixOutcome> {
        if violation.kind.is_path() {
            return Err(TlError::UnsupportedRemediation {
                path: violation.path.clone(),
                observed: violation.observed_length_bytes,
            });
        }

        let source = violation.path.as_path();
        let meta = match fs::symlink_metadata(source) {
            Ok(meta) => meta,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(TlError::SourceMissing {
                    path: source.to_path_buf(),
                });
            }
            Err(err) => return Err(TlError::remediation(source, "inspect entry", err)),
        };
        // The entry may have changed type since the scan; trust what is there now.
        let kind = EntryKind::from_file_type(meta.file_type());

        let Some(name_os) = source.file_name() else {
            return Err(TlError::remediation(
                source,
                "inspect entry",
                io::Error::new(ErrorKind::InvalidInput, "path has no final component"),
            ));
        };
        let Some(name) = name_os.to_str() else {
            return Err(TlError::NonUtf8Name {
                path: source.to_path_buf(),
            });
        };
        let parent = source.parent().unwrap_or_else(|| Path::new(""));

        match plan(name, kind) {
            NamePlan::Truncate { stem, suffix } => {
                let target = allocate_unique(parent, stem, suffix, &self.rules, self.max_attempts)?;
                self.move_entry(source, &target, kind)?;
                Ok(FixOutcome {
                    kind,
                    from: source.to_path_buf(),
                    to: target,
                    created_directory: None,
                })
            }
            NamePlan::Split {
                directory,
                stem,
                suffix,
            } => {
                let new_dir = allocate_unique(parent, directory, "", &self.rules, self.max_attempts)?;
                fs::create_dir(&new_dir)
                    .map_err(|err| TlError::remediation(source, "create directory", err))?;

                let moved = allocate_unique(&new_dir, stem, suffix, &self.rules, self.max_attempts)
                    .and_then(|target| {
                        self.move_entry(source, &target, kind)?;
                        Ok(target)
                    });
                match moved {
                    Ok(target) => Ok(FixOutcome {
                        kind,
                        from: source.to_path_buf(),
                        to: target,
                        created_directory: Some(new_dir),
                    }),
                    Err(err) => {
                        // Only succeeds while the new directory is still empty.
                        let _ = fs::remove_dir(&new_dir);
                        Err(err)
                    }
                }
            }
        }
    }

    /// Fix every name violation in `violations`, deepest path first.
    ///
    /// If `stop_check` returns `true` before a fix starts, the remaining
    /// violations are counted as cancelled and the batch ends.
    pub fn apply(
        &self,
        violations: &[Violation],
        stop_check: Option<&dyn Fn() -> bool>,
    ) -> FixReport {
        let start = Instant::now();
        let mut report = FixReport::default();

        let mut ordered: Vec<&Violation> = violations.iter().collect();
        ordered.sort_by_key(|v| std::cmp::Reverse(v.depth()));

        for (index, violation) in ordered.iter().enumerate() {
            if violation.kind.is_path() {
                report.unsupported.push((*violation).clone());
                continue;
            }

            if let Some(check) = stop_check
                && check()
            {
                report.cancelled = ordered[index..]
                    .iter()
                    .filter(|v| v.kind.is_name())
                    .count();
                report.unsupported.extend(
                    ordered[index..]
                        .iter()
                        .filter(|v| v.kind.is_path())
                        .map(|v| (*v).clone()),
                );
                self.logger.send(ActivityEvent::Interrupted { stage: "fix" });
                break;
            }

            let fix_start = Instant::now();
            match self.fix(violation) {
                Ok(outcome) => {
                    self.logger.send(ActivityEvent::FixApplied {
                        path: outcome.from.clone(),
                        target: outcome.to.clone(),
                        kind: outcome.kind,
                        duration: fix_start.elapsed(),
                    });
                    report.fixed.push(outcome);
                }
                Err(err) => {
                    self.logger
                        .send(ActivityEvent::fix_failed(&violation.path, &err));
                    report.failed.push(FixFailure::new(&violation.path, &err));
                }
            }
        }

        self.logger.flush();
        report.duration = start.elapsed();
        report
    }

    // ──────────────────── moves ────────────────────

    fn move_entry(&self, source: &Path, target: &Path, kind: EntryKind) -> Result<()> {
        if !kind.is_dir() {
            // Symlinks are renamed themselves; their targets are never touched.
            return (self.move_op)(source, target)
                .map_err(|err| TlError::remediation(source, "rename", err));
        }

        if self.strategy == DirectoryStrategy::Relocate {
            return relocate_children(source, target, self.move_op);
        }
        match (self.move_op)(source, target) {
            Ok(()) => Ok(()),
            // A mount point or a filesystem without directory rename can
            // still have its children moved.
            Err(err) if matches!(err.kind(), ErrorKind::ResourceBusy | ErrorKind::Unsupported) => {
                relocate_children(source, target, self.move_op)
            }
            Err(err) => Err(TlError::remediation(source, "rename", err)),
        }
    }
}

/// Create `target`, move every direct child of `source` into it, then remove
/// the emptied `source`. The final removal is best-effort.
///
/// On failure, children already moved go back to `source` and a `target`
/// created here is removed, so the caller sees the tree as it was.
fn relocate_children(source: &Path, target: &Path, move_op: MoveFn) -> Result<()> {
    let created = match fs::create_dir(target) {
        Ok(()) => true,
        Err(err) if err.kind() == ErrorKind::AlreadyExists && target.is_dir() => false,
        Err(err) => return Err(TlError::remediation(source, "create directory", err)),
    };

    let mut moved: Vec<(PathBuf, PathBuf)> = Vec::new();
    let result = move_children(source, target, move_op, &mut moved);
    if result.is_err() {
        for (from, to) in moved.iter().rev() {
            let _ = fs::rename(to, from);
        }
        if created {
            let _ = fs::remove_dir(target);
        }
        return result;
    }

    let _ = fs::remove_dir(source);
    Ok(())
}

fn move_children(
    source: &Path,
    target: &Path,
    move_op: MoveFn,
    moved: &mut Vec<(PathBuf, PathBuf)>,
) -> Result<()> {
    let children =
        fs::read_dir(source).map_err(|err| TlError::remediation(source, "list children", err))?;
    for child in children {
        let child = child.map_err(|err| TlError::remediation(source, "list children", err))?;
        let from = child.path();
        let to = target.join(child.file_name());
        move_op(&from, &to).map_err(|err| TlError::remediation(source, "move child", err))?;
        moved.push((from, to));
    }
    Ok(())
}

// ──────────────────── tests ────────────────────
