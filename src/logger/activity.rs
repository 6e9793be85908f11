//! Typed activity events and the shared handle that writes them.
//!
//! Callers build an `ActivityEvent`; the handle converts it to a `LogEntry`
//! and appends it through one `JsonlWriter` behind a `parking_lot::Mutex`.
//! A disabled handle accepts events and drops them, so call sites never branch
//! on whether logging is configured.

#![allow(missing_docs)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::core::errors::TlError;
use crate::logger::jsonl::{EventType, JsonlConfig, JsonlWriter, LogEntry, Severity};
use crate::scanner::walker::EntryKind;

/// Events recorded in the activity log.
#[derive(Debug, Clone)]
pub enum ActivityEvent {
    ScanStarted {
        root: PathBuf,
        config_hash: String,
    },
    ScanCompleted {
        root: PathBuf,
        entries_scanned: u64,
        violations: usize,
        skipped: usize,
        duration: Duration,
    },
    SubtreeSkipped {
        path: PathBuf,
        error_code: &'static str,
        message: String,
    },
    FixApplied {
        path: PathBuf,
        target: PathBuf,
        kind: EntryKind,
        duration: Duration,
    },
    FixFailed {
        path: PathBuf,
        error_code: &'static str,
        message: String,
    },
    Interrupted {
        stage: &'static str,
    },
}

impl ActivityEvent {
    /// Failure event for one violation.
    pub fn fix_failed(path: &Path, error: &TlError) -> Self {
        Self::FixFailed {
            path: path.to_path_buf(),
            error_code: error.code(),
            message: error.to_string(),
        }
    }

    /// Skip event built from a `TlError::ScanIo` item.
    pub fn subtree_skipped(error: &TlError) -> Self {
        let path = match error {
            TlError::ScanIo { path, .. } => path.clone(),
            _ => PathBuf::new(),
        };
        Self::SubtreeSkipped {
            path,
            error_code: error.code(),
            message: error.to_string(),
        }
    }
}

/// Cheaply cloneable handle to the activity log.
#[derive(Clone, Default)]
pub struct ActivityLogger {
    writer: Option<Arc<Mutex<JsonlWriter>>>,
}

impl ActivityLogger {
    /// Open the JSONL file at `path`, switching to `fallback` if it fails.
    pub fn open(path: &Path, fallback: Option<&Path>) -> Self {
        Self::with_config(JsonlConfig {
            fallback_path: fallback.map(Path::to_path_buf),
            ..JsonlConfig::at(path)
        })
    }

    pub fn with_config(config: JsonlConfig) -> Self {
        Self {
            writer: Some(Arc::new(Mutex::new(JsonlWriter::open(config)))),
        }
    }

    /// A handle that drops every event.
    pub fn disabled() -> Self {
        Self { writer: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.writer.is_some()
    }

    pub fn send(&self, event: ActivityEvent) {
        if let Some(writer) = &self.writer {
            writer.lock().write_entry(&event_to_log_entry(&event));
        }
    }

    pub fn flush(&self) {
        if let Some(writer) = &self.writer {
            writer.lock().flush();
        }
    }
}

// ──────────────────── event conversion ────────────────────

#[allow(clippy::cast_possible_truncation)]
fn millis(duration: Duration) -> u64 {
    duration.as_millis() as u64
}

fn lossy(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn event_to_log_entry(event: &ActivityEvent) -> LogEntry {
    match event {
        ActivityEvent::ScanStarted { root, config_hash } => {
            let mut e = LogEntry::new(EventType::ScanStart, Severity::Info);
            e.path = Some(lossy(root));
            e.details = Some(format!(
                "version={} config_hash={config_hash}",
                env!("CARGO_PKG_VERSION")
            ));
            e
        }
        ActivityEvent::ScanCompleted {
            root,
            entries_scanned,
            violations,
            skipped,
            duration,
        } => {
            let mut e = LogEntry::new(EventType::ScanComplete, Severity::Info);
            e.path = Some(lossy(root));
            e.entries_scanned = Some(*entries_scanned);
            e.violations = Some(*violations);
            e.skipped = Some(*skipped);
            e.duration_ms = Some(millis(*duration));
            e.ok = Some(*violations == 0);
            e
        }
        ActivityEvent::SubtreeSkipped {
            path,
            error_code,
            message,
        } => {
            let mut e = LogEntry::new(EventType::SubtreeSkipped, Severity::Warning);
            e.path = Some(lossy(path));
            e.error_code = Some((*error_code).to_string());
            e.error_message = Some(message.clone());
            e
        }
        ActivityEvent::FixApplied {
            path,
            target,
            kind,
            duration,
        } => {
            let mut e = LogEntry::new(EventType::FixApplied, Severity::Info);
            e.path = Some(lossy(path));
            e.target = Some(lossy(target));
            e.duration_ms = Some(millis(*duration));
            e.ok = Some(true);
            e.details = Some(format!("kind={}", kind.label()));
            e
        }
        ActivityEvent::FixFailed {
            path,
            error_code,
            message,
        } => {
            let mut e = LogEntry::new(EventType::FixFailed, Severity::Warning);
            e.path = Some(lossy(path));
            e.ok = Some(false);
            e.error_code = Some((*error_code).to_string());
            e.error_message = Some(message.clone());
            e
        }
        ActivityEvent::Interrupted { stage } => {
            let mut e = LogEntry::new(EventType::Interrupted, Severity::Warning);
            e.details = Some(format!("stage={stage}"));
            e
        }
    }
}
