//! Pure name arithmetic: UTF-8-safe truncation and splitting, stem/suffix
//! separation, and the split-or-truncate decision for one overlong name.
//!
//! Nothing here touches the filesystem, so every rule can be checked with
//! plain strings.

#![allow(missing_docs)]

use crate::core::config::{LimitsConfig, RemediationConfig};
use crate::scanner::walker::EntryKind;

/// Byte limits that govern generated names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NameRules {
    /// A generated name must stay strictly below this.
    pub max_name_bytes: usize,
    /// Overlong pieces are cut to this.
    pub safe_name_bytes: usize,
    /// Stem budget for numbered collision candidates.
    pub collision_stem_bytes: usize,
}

impl NameRules {
    #[must_use]
    pub const fn new(limits: &LimitsConfig, remediation: &RemediationConfig) -> Self {
        Self {
            max_name_bytes: limits.max_name_bytes,
            safe_name_bytes: remediation.safe_name_bytes,
            collision_stem_bytes: remediation.collision_stem_bytes,
        }
    }
}

impl Default for NameRules {
    fn default() -> Self {
        Self::new(&LimitsConfig::default(), &RemediationConfig::default())
    }
}

/// Longest prefix of `value` that is at most `max_bytes` long and ends on a
/// character boundary. A character that would straddle the cut is dropped whole.
#[must_use]
pub fn safe_truncate(value: &str, max_bytes: usize) -> &str {
    if value.len() <= max_bytes {
        return value;
    }
    let mut cut = max_bytes;
    while !value.is_char_boundary(cut) {
        cut -= 1;
    }
    &value[..cut]
}

/// Split at the byte midpoint, moved onto a character boundary.
///
/// The midpoint moves backward first. If that reaches the start of the string
/// (a single multi-byte character, for instance) it moves forward to the next
/// boundary instead, which may leave the second half empty.
#[must_use]
pub fn split_string_utf8(value: &str) -> (&str, &str) {
    let middle = value.len() / 2;
    let mut cut = middle;
    while cut > 0 && !value.is_char_boundary(cut) {
        cut -= 1;
    }
    if cut == 0 {
        cut = middle;
        while cut < value.len() && !value.is_char_boundary(cut) {
            cut += 1;
        }
    }
    value.split_at(cut)
}

/// Separate a name into stem and suffix.
///
/// Directories never have a suffix. For files and symlinks the suffix starts
/// at the last `.` unless that dot is the first or the last byte, so `.bashrc`
/// and `archive.` keep an empty suffix.
#[must_use]
pub fn split_name(name: &str, kind: EntryKind) -> (&str, &str) {
    if kind.is_dir() {
        return (name, "");
    }
    match name.rfind('.') {
        Some(dot) if dot > 0 && dot + 1 < name.len() => name.split_at(dot),
        _ => (name, ""),
    }
}

/// Fit `stem + suffix` strictly under the name limit.
///
/// The suffix is kept when it is short enough (up to half the safe margin);
/// otherwise it is cut as well.
#[must_use]
pub fn fit_name(stem: &str, suffix: &str, rules: &NameRules) -> String {
    if stem.len() + suffix.len() < rules.max_name_bytes {
        return format!("{stem}{suffix}");
    }
    let suffix = safe_truncate(suffix, rules.safe_name_bytes / 2);
    let stem = safe_truncate(stem, rules.safe_name_bytes - suffix.len());
    format!("{stem}{suffix}")
}

/// Numbered collision candidate `stem_N + suffix`.
///
/// The stem is cut to the collision budget and the suffix gets what is left
/// under the safe margin, so the `_N` tag itself is never truncated away.
#[must_use]
pub fn numbered_name(stem: &str, suffix: &str, counter: u32, rules: &NameRules) -> String {
    let tag = format!("_{counter}");
    let stem_budget = rules
        .collision_stem_bytes
        .min(rules.safe_name_bytes.saturating_sub(tag.len()));
    let stem = safe_truncate(stem, stem_budget);
    let suffix_budget = rules
        .safe_name_bytes
        .saturating_sub(stem.len() + tag.len());
    let suffix = safe_truncate(suffix, suffix_budget);
    format!("{stem}{tag}{suffix}")
}

/// How one overlong name will be repaired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamePlan<'n> {
    /// New directory named `directory` in the parent; the entry moves into it
    /// as `stem + suffix`.
    Split {
        directory: &'n str,
        stem: &'n str,
        suffix: &'n str,
    },
    /// Rename in place to a shortened `stem + suffix`.
    Truncate { stem: &'n str, suffix: &'n str },
}

/// Decide how to repair `name`.
///
/// Splitting is preferred because it keeps every byte of the name. Truncation
/// is the fallback when the stem is a single byte or when no character
/// boundary gives two non-empty halves.
#[must_use]
pub fn plan(name: &str, kind: EntryKind) -> NamePlan<'_> {
    let (stem, suffix) = split_name(name, kind);
    if stem.len() <= 1 {
        return NamePlan::Truncate { stem, suffix };
    }
    let (first, second) = split_string_utf8(stem);
    if first.is_empty() || second.is_empty() {
        return NamePlan::Truncate { stem, suffix };
    }
    NamePlan::Split {
        directory: first,
        stem: second,
        suffix,
    }
}

/// `true` for names that can never be created: empty, `.` and `..`.
#[must_use]
pub fn is_reserved(candidate: &str) -> bool {
    matches!(candidate, "" | "." | "..")
}

// ──────────────────── tests ────────────────────
