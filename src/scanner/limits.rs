//! Byte-limit classification of walked entries.

#![allow(missing_docs)]

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Serialize, Serializer};

use crate::core::config::LimitsConfig;
use crate::core::paths::byte_len;
use crate::scanner::walker::{EntryKind, WalkEntry};

/// Which limit an entry broke, and what kind of entry it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "limit", content = "entry", rename_all = "snake_case")]
pub enum ViolationKind {
    NameTooLong(EntryKind),
    PathTooLong(EntryKind),
}

impl ViolationKind {
    #[must_use]
    pub const fn entry_kind(self) -> EntryKind {
        match self {
            Self::NameTooLong(kind) | Self::PathTooLong(kind) => kind,
        }
    }

    #[must_use]
    pub const fn is_name(self) -> bool {
        matches!(self, Self::NameTooLong(_))
    }

    #[must_use]
    pub const fn is_path(self) -> bool {
        matches!(self, Self::PathTooLong(_))
    }

    /// Uppercase tag used in the text log.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::NameTooLong(_) => "NAME TOO LONG",
            Self::PathTooLong(_) => "PATH TOO LONG",
        }
    }
}

/// One limit violation found by a scan. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub kind: ViolationKind,
    /// Byte count that triggered the violation.
    pub observed_length_bytes: usize,
    /// The limit it was measured against.
    pub limit_bytes: usize,
    /// Path at scan time.
    #[serde(serialize_with = "serialize_lossy_path")]
    pub path: PathBuf,
}

impl Violation {
    /// Number of `/`-separated components, used to order fixes deepest-first.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.path.components().count()
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}/{}]: {}",
            self.kind.label(),
            self.observed_length_bytes,
            self.limit_bytes,
            self.path.display()
        )
    }
}

fn serialize_lossy_path<S: Serializer>(path: &Path, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&path.to_string_lossy())
}

/// Pure classifier: name and path byte lengths against configured limits.
///
/// Both checks use `>=`: an entry whose name is exactly `max_name_bytes` long
/// is already in violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimitChecker {
    max_name_bytes: usize,
    max_path_bytes: usize,
}

impl LimitChecker {
    #[must_use]
    pub const fn new(limits: &LimitsConfig) -> Self {
        Self {
            max_name_bytes: limits.max_name_bytes,
            max_path_bytes: limits.max_path_bytes,
        }
    }

    #[must_use]
    pub const fn max_name_bytes(&self) -> usize {
        self.max_name_bytes
    }

    #[must_use]
    pub const fn max_path_bytes(&self) -> usize {
        self.max_path_bytes
    }

    /// Check one entry. Yields zero, one or two violations, name first.
    #[must_use]
    pub fn check(&self, entry: &WalkEntry) -> Vec<Violation> {
        self.check_path(&entry.path, entry.kind)
    }

    /// Same as [`check`](Self::check) for a path that did not come from a walk.
    #[must_use]
    pub fn check_path(&self, path: &Path, kind: EntryKind) -> Vec<Violation> {
        let mut found = Vec::new();

        if let Some(name) = path.file_name() {
            let name_len = byte_len(name);
            if name_len >= self.max_name_bytes {
                found.push(Violation {
                    kind: ViolationKind::NameTooLong(kind),
                    observed_length_bytes: name_len,
                    limit_bytes: self.max_name_bytes,
                    path: path.to_path_buf(),
                });
            }
        }

        let path_len = byte_len(path);
        if path_len >= self.max_path_bytes {
            found.push(Violation {
                kind: ViolationKind::PathTooLong(kind),
                observed_length_bytes: path_len,
                limit_bytes: self.max_path_bytes,
                path: path.to_path_buf(),
            });
        }

        found
    }
}

impl Default for LimitChecker {
    fn default() -> Self {
        Self::new(&LimitsConfig::default())
    }
}
