//! Scan a directory with the library API and print what a fix would do.
//!
//! ```text
//! cargo run --example scan_tree -- /path/to/tree
//! ```

use std::path::PathBuf;

use toolong::prelude::*;
use toolong::remedy::naming::{fit_name, plan};

fn main() -> Result<()> {
    let root = std::env::args_os()
        .nth(1)
        .map_or_else(|| PathBuf::from("."), PathBuf::from);
    let config = Config::load(None)?;

    let mut report = ScanReport::default();
    let mut stream = Scanner::new(&config.limits).scan(&root)?;
    for item in stream.by_ref() {
        match item {
            Ok(violation) => report.violations.push(violation),
            Err(err) => eprintln!("skipped: {err}"),
        }
    }
    report.entries_scanned = stream.entries_scanned();

    println!(
        "{} entries, {} name and {} path violations",
        report.entries_scanned,
        report.name_violations().count(),
        report.path_violations().count()
    );

    let rules = NameRules::new(&config.limits, &config.remediation);
    for violation in &report.violations {
        println!("{violation}");
        let Some(name) = violation.path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !violation.kind.is_name() {
            continue;
        }
        match plan(name, violation.kind.entry_kind()) {
            NamePlan::Split {
                directory,
                stem,
                suffix,
            } => println!(
                "  would split into {}/{}",
                fit_name(directory, "", &rules),
                fit_name(stem, suffix, &rules)
            ),
            NamePlan::Truncate { stem, suffix } => {
                println!("  would truncate to fit: {}", fit_name(stem, suffix, &rules));
            }
        }
    }
    Ok(())
}
