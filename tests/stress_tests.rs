//! Stress tests: wide trees, deep trees and heavy name collisions.

use std::fmt::Write as _;
use std::fs;
use std::time::Instant;

use tempfile::TempDir;
use toolong::core::config::Config;
use toolong::remedy::fixer::Remediator;
use toolong::scanner::audit::{Scanner, collect_scan, count_entries};

/// Stress report emitted at the end of each scenario.
struct StressReport {
    scenario: String,
    metrics: Vec<(String, String)>,
}

impl StressReport {
    fn new(scenario: &str) -> Self {
        Self {
            scenario: scenario.to_string(),
            metrics: Vec::new(),
        }
    }

    fn metric(&mut self, key: &str, value: impl std::fmt::Display) {
        self.metrics.push((key.to_string(), value.to_string()));
    }

    fn emit(&self) -> String {
        let mut out = String::new();
        writeln!(out, "═══ Stress: {} ═══", self.scenario).unwrap();
        for (k, v) in &self.metrics {
            writeln!(out, "  {k}: {v}").unwrap();
        }
        out
    }
}

#[test]
fn wide_tree_scan_counts_every_entry() {
    let mut report = StressReport::new("wide_tree_scan");
    let tmp = TempDir::new().unwrap();
    for dir in 0..20 {
        let sub = tmp.path().join(format!("dir{dir:02}"));
        fs::create_dir(&sub).unwrap();
        for file in 0..100 {
            fs::write(sub.join(format!("f{file:03}.dat")), b"").unwrap();
        }
    }
    fs::write(tmp.path().join("w".repeat(255)), b"").unwrap();

    let start = Instant::now();
    let config = Config::default();
    let scan = collect_scan(Scanner::new(&config.limits).scan(tmp.path()).unwrap());
    report.metric("entries", scan.entries_scanned);
    report.metric("elapsed_ms", start.elapsed().as_millis());
    eprintln!("{}", report.emit());

    assert_eq!(scan.entries_scanned, 20 + 20 * 100 + 1);
    assert_eq!(count_entries(tmp.path(), None).unwrap(), scan.entries_scanned);
    assert_eq!(scan.violations.len(), 1);
}

#[test]
fn deep_tree_walk_does_not_recurse() {
    let mut report = StressReport::new("deep_tree_walk");
    let tmp = TempDir::new().unwrap();
    let mut current = tmp.path().to_path_buf();
    // Short names keep the deepest path under the path limit.
    for _ in 0..1000 {
        current.push("d");
    }
    fs::create_dir_all(&current).unwrap();

    let config = Config::default();
    let scan = collect_scan(Scanner::new(&config.limits).scan(tmp.path()).unwrap());
    report.metric("entries", scan.entries_scanned);
    eprintln!("{}", report.emit());

    assert_eq!(scan.entries_scanned, 1000);
    assert!(scan.is_clean());
}

#[test]
fn many_colliding_splits_get_distinct_directories() {
    let mut report = StressReport::new("colliding_splits");
    let tmp = TempDir::new().unwrap();
    // Every name splits into the same 127-byte first half.
    for index in 0..50 {
        let name = format!("{}_{index:02}", "q".repeat(252));
        assert_eq!(name.len(), 255);
        fs::write(tmp.path().join(name), index.to_string()).unwrap();
    }

    let config = Config::default();
    let scan = collect_scan(Scanner::new(&config.limits).scan(tmp.path()).unwrap());
    assert_eq!(scan.violations.len(), 50);

    let start = Instant::now();
    let fixes = Remediator::new(&config).apply(&scan.violations, None);
    report.metric("fixed", fixes.fixed.len());
    report.metric("failed", fixes.failed.len());
    report.metric("elapsed_ms", start.elapsed().as_millis());
    eprintln!("{}", report.emit());

    assert_eq!(fixes.fixed.len(), 50);
    let mut dirs: Vec<_> = fixes
        .fixed
        .iter()
        .filter_map(|f| f.created_directory.clone())
        .collect();
    dirs.sort();
    dirs.dedup();
    assert_eq!(dirs.len(), 50);
    assert!(dirs.contains(&tmp.path().join("q".repeat(127))));
    assert!(dirs.contains(&tmp.path().join(format!("{}_49", "q".repeat(127)))));

    let rescan = collect_scan(Scanner::new(&config.limits).scan(tmp.path()).unwrap());
    assert!(rescan.is_clean());
    assert_eq!(rescan.entries_scanned, 100);
}
