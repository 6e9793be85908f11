//! Remediation against a real filesystem: split, collisions, data safety,
//! rescans.
//!
//! Linux refuses names over 255 bytes, so the overlong entries here are exactly
//! 255 bytes, the first length the scanner reports.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use toolong::core::config::{Config, DirectoryStrategy};
use toolong::remedy::fixer::Remediator;
use toolong::scanner::audit::{ScanReport, Scanner, collect_scan};
use toolong::scanner::limits::ViolationKind;
use toolong::scanner::walker::EntryKind;

fn scan(config: &Config, root: &Path) -> ScanReport {
    collect_scan(Scanner::new(&config.limits).scan(root).unwrap())
}

/// File name -> content for every regular file below `root`; names are unique per test.
fn file_contents(root: &Path) -> BTreeMap<String, Vec<u8>> {
    let mut out = BTreeMap::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        for entry in fs::read_dir(&dir).unwrap() {
            let entry = entry.unwrap();
            let file_type = entry.file_type().unwrap();
            if file_type.is_dir() {
                stack.push(entry.path());
            } else if file_type.is_file() {
                out.insert(
                    entry.file_name().to_string_lossy().into_owned(),
                    fs::read(entry.path()).unwrap(),
                );
            }
        }
    }
    out
}

#[test]
fn scenario_a_long_file_name_is_split() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    let name = format!("{}.txt", "a".repeat(251));
    assert_eq!(name.len(), 255);
    fs::write(root.join(&name), b"payload").unwrap();

    let config = Config::default();
    let report = scan(&config, root);
    assert_eq!(report.violations.len(), 1);
    let violation = &report.violations[0];
    assert_eq!(violation.kind, ViolationKind::NameTooLong(EntryKind::File));
    assert_eq!(violation.observed_length_bytes, 255);

    let outcome = Remediator::new(&config).fix(violation).unwrap();
    let expected_dir = root.join("a".repeat(125));
    let expected = expected_dir.join(format!("{}.txt", "a".repeat(126)));
    assert_eq!(outcome.created_directory.as_deref(), Some(expected_dir.as_path()));
    assert_eq!(outcome.to, expected);
    assert_eq!(fs::read(&expected).unwrap(), b"payload");
    assert!(!root.join(&name).exists());
    assert!(outcome.to_string().starts_with("file moved: "));

    assert!(scan(&config, root).is_clean());
}

#[test]
fn directory_split_keeps_every_child() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    let long_dir = root.join("d".repeat(255));
    fs::create_dir_all(long_dir.join("nested/deeper")).unwrap();
    fs::write(long_dir.join("one.txt"), b"1").unwrap();
    fs::write(long_dir.join("nested/two.txt"), b"2").unwrap();
    fs::write(long_dir.join("nested/deeper/three.txt"), b"3").unwrap();
    let before = file_contents(root);

    let config = Config::default();
    let report = scan(&config, root);
    assert_eq!(report.violations.len(), 1);
    assert_eq!(
        report.violations[0].kind,
        ViolationKind::NameTooLong(EntryKind::Directory)
    );

    let outcome = Remediator::new(&config).fix(&report.violations[0]).unwrap();
    assert_eq!(outcome.kind, EntryKind::Directory);
    assert_eq!(outcome.to, root.join("d".repeat(127)).join("d".repeat(128)));
    assert!(outcome.to.join("nested/deeper/three.txt").is_file());
    assert_eq!(file_contents(root), before);
    assert!(scan(&config, root).is_clean());
}

#[test]
fn relocate_strategy_moves_children_one_by_one() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    let long_dir = root.join("r".repeat(255));
    fs::create_dir_all(long_dir.join("inner")).unwrap();
    fs::write(long_dir.join("inner/data.bin"), [7_u8; 64]).unwrap();
    fs::write(long_dir.join("top.txt"), b"top").unwrap();
    let before = file_contents(root);

    let mut config = Config::default();
    config.remediation.directory_strategy = DirectoryStrategy::Relocate;
    let report = scan(&config, root);
    let fixes = Remediator::new(&config).apply(&report.violations, None);

    assert_eq!(fixes.fixed.len(), 1);
    assert!(fixes.failed.is_empty());
    assert!(!long_dir.exists());
    assert_eq!(file_contents(root), before);
}

#[test]
fn split_directory_collision_gets_numbered() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    let name = format!("{}.txt", "a".repeat(251));
    fs::write(root.join(&name), b"x").unwrap();
    // Occupies the first-choice directory name.
    fs::write(root.join("a".repeat(125)), b"blocker").unwrap();

    let config = Config::default();
    let report = scan(&config, root);
    let outcome = Remediator::new(&config).fix(&report.violations[0]).unwrap();

    let numbered = root.join(format!("{}_1", "a".repeat(125)));
    assert_eq!(outcome.created_directory.as_deref(), Some(numbered.as_path()));
    assert_eq!(fs::read(root.join("a".repeat(125))).unwrap(), b"blocker");
    assert_eq!(fs::read(&outcome.to).unwrap(), b"x");
}

#[test]
fn long_symlink_is_renamed_without_touching_target() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    fs::write(root.join("target.txt"), b"t").unwrap();
    let link = root.join("s".repeat(255));
    std::os::unix::fs::symlink("target.txt", &link).unwrap();

    let config = Config::default();
    let report = scan(&config, root);
    assert_eq!(report.violations.len(), 1);
    assert_eq!(
        report.violations[0].kind,
        ViolationKind::NameTooLong(EntryKind::Symlink)
    );

    let outcome = Remediator::new(&config).fix(&report.violations[0]).unwrap();
    let moved_link = fs::symlink_metadata(&outcome.to).unwrap();
    assert!(moved_link.file_type().is_symlink());
    assert_eq!(fs::read_link(&outcome.to).unwrap(), PathBuf::from("target.txt"));
    assert_eq!(fs::read(root.join("target.txt")).unwrap(), b"t");
}

#[test]
fn nested_violations_are_fixed_deepest_first() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    let outer = root.join("o".repeat(255));
    let inner = outer.join("i".repeat(255));
    fs::create_dir_all(&inner).unwrap();
    fs::write(inner.join("leaf.txt"), b"leaf").unwrap();

    let config = Config::default();
    let report = scan(&config, root);
    assert_eq!(report.violations.len(), 2);

    let fixes = Remediator::new(&config).apply(&report.violations, None);
    assert_eq!(fixes.fixed.len(), 2, "failures: {:?}", fixes.failed);
    assert_eq!(fixes.fixed[0].from, inner);
    assert!(scan(&config, root).is_clean());
    assert_eq!(file_contents(root).get("leaf.txt").map(Vec::as_slice), Some(&b"leaf"[..]));
}

#[test]
fn vanished_source_is_reported_not_fatal() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    let first = root.join("x".repeat(255));
    let second = root.join("y".repeat(255));
    fs::write(&first, b"1").unwrap();
    fs::write(&second, b"2").unwrap();

    let config = Config::default();
    let report = scan(&config, root);
    assert_eq!(report.violations.len(), 2);
    fs::remove_file(&first).unwrap();

    let fixes = Remediator::new(&config).apply(&report.violations, None);
    assert_eq!(fixes.fixed.len(), 1);
    assert_eq!(fixes.failed.len(), 1);
    assert_eq!(fixes.failed[0].error_code, "TL-3002");
    assert_eq!(fixes.failed[0].path, first);
}

#[test]
fn repeated_scans_agree() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    fs::create_dir(root.join("b".repeat(255))).unwrap();
    fs::write(root.join("c".repeat(254)), b"").unwrap();
    fs::write(root.join("e".repeat(255)), b"").unwrap();

    let config = Config::default();
    let mut first = scan(&config, root).violations;
    let mut second = scan(&config, root).violations;
    first.sort_by(|a, b| a.path.cmp(&b.path));
    second.sort_by(|a, b| a.path.cmp(&b.path));

    assert_eq!(first.len(), 2);
    assert_eq!(first, second);
}

#[test]
fn empty_tree_scan_and_fix_are_noops() {
    let tmp = TempDir::new().unwrap();
    let config = Config::default();
    let report = scan(&config, tmp.path());
    assert!(report.is_clean());
    assert_eq!(report.entries_scanned, 0);

    let fixes = Remediator::new(&config).apply(&report.violations, None);
    assert_eq!(fixes.attempted(), 0);
    assert!(fs::read_dir(tmp.path()).unwrap().next().is_none());
}
