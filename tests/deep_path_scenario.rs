//! A file whose full path crosses 4096 bytes, built with relative creation.
//!
//! Lives in its own test binary with a single test because it changes the
//! process working directory.

use std::env;
use std::fs;

use tempfile::TempDir;
use toolong::core::config::Config;
use toolong::core::paths::byte_len;
use toolong::remedy::fixer::Remediator;
use toolong::scanner::audit::{Scanner, collect_scan};
use toolong::scanner::limits::ViolationKind;
use toolong::scanner::walker::EntryKind;

const SEGMENT_BYTES: usize = 80;
/// Deepest directory path; stays below PATH_MAX so it can still be listed.
const PARENT_CEILING: usize = 4080;
const LEAF_PATH_BYTES: usize = 4200;

#[test]
fn deep_path_is_reported_and_left_alone() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();
    let original_cwd = env::current_dir().unwrap();

    env::set_current_dir(&root).unwrap();
    let mut parent_len = byte_len(&root);
    let mut depth = 0;
    while parent_len + 1 + SEGMENT_BYTES < PARENT_CEILING {
        let segment = format!("{depth:02}{}", "s".repeat(SEGMENT_BYTES - 2));
        fs::create_dir(&segment).unwrap();
        env::set_current_dir(&segment).unwrap();
        parent_len += 1 + SEGMENT_BYTES;
        depth += 1;
    }
    let leaf_len = LEAF_PATH_BYTES - parent_len - 1;
    assert!(leaf_len < 255, "leaf name would itself be too long");
    fs::write("l".repeat(leaf_len), b"deep").unwrap();
    env::set_current_dir(&original_cwd).unwrap();

    let config = Config::default();
    let report = collect_scan(Scanner::new(&config.limits).scan(&root).unwrap());
    assert!(report.skipped.is_empty(), "skipped: {:?}", report.skipped);
    assert_eq!(report.violations.len(), 1);
    let violation = &report.violations[0];
    assert_eq!(violation.kind, ViolationKind::PathTooLong(EntryKind::File));
    assert_eq!(violation.observed_length_bytes, LEAF_PATH_BYTES);
    assert_eq!(violation.limit_bytes, 4096);

    let fixes = Remediator::new(&config).apply(&report.violations, None);
    assert!(fixes.fixed.is_empty());
    assert!(fixes.failed.is_empty());
    assert_eq!(fixes.unsupported.len(), 1);

    let err = Remediator::new(&config).fix(violation).unwrap_err();
    assert_eq!(err.code(), "TL-3001");

    let rescan = collect_scan(Scanner::new(&config.limits).scan(&root).unwrap());
    assert_eq!(rescan.violations, report.violations);
}
