//! Collision-safe name allocation inside one directory.

#![allow(missing_docs)]

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::core::errors::{Result, TlError};
use crate::remedy::naming::{NameRules, fit_name, is_reserved, numbered_name};

/// Find a name in `directory` that nothing occupies yet.
///
/// The first candidate is `stem + suffix` fitted under the name limit, then
/// `stem_1 + suffix`, `stem_2 + suffix`, and so on. Existence is checked with
/// `symlink_metadata`, so a dangling symlink still occupies its name. The
/// result is deterministic for a given directory listing.
pub fn allocate_unique(
    directory: &Path,
    stem: &str,
    suffix: &str,
    rules: &NameRules,
    max_attempts: u32,
) -> Result<PathBuf> {
    let first = fit_name(stem, suffix, rules);
    if let Some(free) = free_candidate(directory, &first, rules)? {
        return Ok(free);
    }

    for counter in 1..=max_attempts {
        let candidate = numbered_name(stem, suffix, counter, rules);
        if let Some(free) = free_candidate(directory, &candidate, rules)? {
            return Ok(free);
        }
    }

    Err(TlError::NameSpaceExhausted {
        directory: directory.to_path_buf(),
        stem: stem.to_string(),
        attempts: max_attempts,
    })
}

fn free_candidate(directory: &Path, candidate: &str, rules: &NameRules) -> Result<Option<PathBuf>> {
    if is_reserved(candidate) || candidate.len() >= rules.max_name_bytes {
        return Ok(None);
    }
    let path = directory.join(candidate);
    match fs::symlink_metadata(&path) {
        Ok(_) => Ok(None),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(Some(path)),
        Err(err) => Err(TlError::remediation(&path, "check candidate name", err)),
    }
}
