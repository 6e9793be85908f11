//! Top-level CLI definition and dispatch.

use std::collections::HashSet;
use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::{Shell as CompletionShell, generate};
use colored::{Colorize, control};
use serde_json::{Value, json};
use thiserror::Error;

use toolong::core::config::Config;
use toolong::core::errors::TlError;
use toolong::core::paths::{auto_log_name, resolve_absolute_path};
use toolong::core::signals::SignalHandler;
use toolong::logger::activity::{ActivityEvent, ActivityLogger};
use toolong::logger::report::{CLEAN_LINE, append_report};
use toolong::remedy::fixer::{FixReport, Remediator};
use toolong::scanner::audit::{ScanProgress, ScanReport, Scanner, collect_scan, count_entries};
use toolong::scanner::limits::Violation;

/// Sentinel used by clap when `--log` is given without a value.
const AUTO_LOG: &str = "AUTO";

/// toolong: find file names and paths too long for Linux, and fix the names.
#[derive(Debug, Parser)]
#[command(
    name = "toolong",
    author,
    version,
    about = "Find file and directory names or paths too long for Linux, and shorten overlong names",
    long_about = None,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Override config file path.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Force JSON output mode.
    #[arg(long, global = true)]
    json: bool,
    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,
    /// Increase verbosity.
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,
    /// Print only `<names> <paths> <total>`.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Scan a directory tree and report overlong names and paths.
    Scan(ScanArgs),
    /// Shorten overlong names, then rescan and report what is left.
    #[command(visible_alias = "axe")]
    Fix(FixArgs),
    /// View and check configuration.
    Config(ConfigArgs),
    /// Generate shell completions.
    Completions(CompletionsArgs),
}

#[derive(Debug, Clone, Args)]
struct ScanArgs {
    /// Directory to scan.
    #[arg(default_value = ".", value_name = "DIR")]
    directory: PathBuf,
    /// Do not print scan progress.
    #[arg(short = 'p', long)]
    no_progress: bool,
    /// Append the report to FILE (default: `<current dir name>.LOG`).
    #[arg(
        short,
        long,
        value_name = "FILE",
        num_args = 0..=1,
        default_missing_value = AUTO_LOG
    )]
    log: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
struct FixArgs {
    #[command(flatten)]
    scan: ScanArgs,
    /// Report what is left from the fix results instead of scanning again.
    #[arg(long)]
    no_rescan: bool,
}

#[derive(Debug, Clone, Args)]
struct ConfigArgs {
    #[command(subcommand)]
    command: Option<ConfigCommand>,
}

#[derive(Debug, Clone, Copy, Subcommand)]
enum ConfigCommand {
    /// Print the config file path.
    Path,
    /// Print the effective configuration.
    Show,
    /// Validate the configuration.
    Validate,
}

#[derive(Debug, Clone, Args)]
struct CompletionsArgs {
    /// Shell to generate completions for.
    #[arg(value_enum)]
    shell: CompletionShell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputMode {
    Human,
    Json,
}

/// CLI error type with explicit exit-code mapping.
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid user input: bad root, bad config.
    #[error("{0}")]
    User(String),
    /// The run finished but violations remain.
    #[error("{0} violation(s) remain")]
    Violations(usize),
    /// Environment/runtime failure.
    #[error("{0}")]
    Runtime(String),
    /// SIGINT/SIGTERM stopped the run.
    #[error("interrupted by user")]
    Interrupted,
    /// JSON serialization failed.
    #[error("failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),
    /// Output write failed.
    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),
}

impl CliError {
    /// Process exit code contract for the CLI.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::User(_) | Self::Violations(_) => 1,
            Self::Runtime(_) | Self::Io(_) | Self::Json(_) => 2,
            Self::Interrupted => 130,
        }
    }

    /// Whether `main` should print the error; a violation count was already reported.
    pub const fn is_reported(&self) -> bool {
        matches!(self, Self::Violations(_))
    }
}

impl From<TlError> for CliError {
    fn from(err: TlError) -> Self {
        match err {
            TlError::InvalidConfig { .. }
            | TlError::MissingConfig { .. }
            | TlError::ConfigParse { .. }
            | TlError::InvalidRoot { .. } => Self::User(err.to_string()),
            TlError::Interrupted => Self::Interrupted,
            other => Self::Runtime(other.to_string()),
        }
    }
}

/// Dispatch CLI commands.
pub fn run(cli: &Cli) -> Result<(), CliError> {
    if cli.no_color {
        control::set_override(false);
    }

    match &cli.command {
        Command::Scan(args) => run_scan(cli, args),
        Command::Fix(args) => run_fix(cli, args),
        Command::Config(args) => run_config(cli, args),
        Command::Completions(args) => {
            let mut command = Cli::command();
            let binary_name = command.get_name().to_string();
            generate(args.shell, &mut command, binary_name, &mut io::stdout());
            Ok(())
        }
    }
}

// ──────────────────── scan / fix ────────────────────

/// Shared state of one scan or fix run.
struct Session {
    config: Config,
    signals: SignalHandler,
    logger: ActivityLogger,
    mode: OutputMode,
    show_progress: bool,
}

impl Session {
    fn open(cli: &Cli, args: &ScanArgs) -> Result<Self, CliError> {
        let config = Config::load(cli.config.as_deref())?;
        let logger = if config.logging.activity_log_enabled {
            ActivityLogger::open(
                &config.paths.activity_log,
                Some(&config.paths.activity_log_fallback),
            )
        } else {
            ActivityLogger::disabled()
        };
        let mode = output_mode(cli);
        let show_progress = !args.no_progress
            && !cli.quiet
            && mode == OutputMode::Human
            && io::stderr().is_terminal();

        if cli.verbose {
            eprintln!(
                "[TL-CONFIG] using {} (limits: name {} / path {} bytes)",
                config.paths.config_file.display(),
                config.limits.max_name_bytes,
                config.limits.max_path_bytes
            );
        }

        Ok(Self {
            config,
            signals: SignalHandler::new(),
            logger,
            mode,
            show_progress,
        })
    }

    fn scan(&self, root: &Path) -> Result<ScanReport, CliError> {
        let start = Instant::now();
        let config_hash = self
            .config
            .stable_hash()
            .unwrap_or_else(|_| "unknown".to_string());
        self.logger.send(ActivityEvent::ScanStarted {
            root: resolve_absolute_path(root),
            config_hash,
        });

        let mut scanner = Scanner::new(&self.config.limits);
        if self.show_progress {
            let total = if self.config.scanner.count_before_scan {
                eprint!("Counting entries... ");
                let signals = self.signals.clone();
                let stop: &dyn Fn() -> bool = &move || signals.should_stop();
                match count_entries(root, Some(stop)) {
                    Ok(total) => {
                        eprintln!("found: {total}");
                        Some(total)
                    }
                    Err(TlError::Interrupted) => {
                        eprintln!();
                        self.logger.send(ActivityEvent::Interrupted { stage: "count" });
                        self.logger.flush();
                        return Err(CliError::Interrupted);
                    }
                    Err(err) => return Err(err.into()),
                }
            } else {
                None
            };
            if let Some(total) = total {
                scanner = scanner.with_total(total);
            }
            let interval = self.config.scanner.progress_interval.max(1);
            scanner = scanner.with_progress(move |progress| {
                if progress.visited % interval == 0 || Some(progress.visited) == progress.total {
                    print_progress(progress);
                }
            });
        }
        let signals = self.signals.clone();
        let stream = scanner
            .with_stop_check(move || signals.should_stop())
            .scan(root)?;
        let report = collect_scan(stream);
        if self.show_progress {
            eprintln!();
        }

        for skipped in &report.skipped {
            self.logger.send(ActivityEvent::subtree_skipped(skipped));
            eprintln!("{} {skipped}", "warning:".yellow());
        }

        if report.interrupted {
            self.logger.send(ActivityEvent::Interrupted { stage: "scan" });
            self.logger.flush();
            return Err(CliError::Interrupted);
        }

        self.logger.send(ActivityEvent::ScanCompleted {
            root: resolve_absolute_path(root),
            entries_scanned: report.entries_scanned,
            violations: report.violations.len(),
            skipped: report.skipped.len(),
            duration: start.elapsed(),
        });
        self.logger.flush();
        Ok(report)
    }
}

fn print_progress(progress: ScanProgress) {
    let mut stderr = io::stderr().lock();
    let _ = match (progress.percent(), progress.total) {
        (Some(percent), Some(total)) => write!(
            stderr,
            "\rScanning: {percent:.1}% ({}/{total})",
            progress.visited
        ),
        _ => write!(stderr, "\rScanning: {} entries", progress.visited),
    };
    let _ = stderr.flush();
}

fn run_scan(cli: &Cli, args: &ScanArgs) -> Result<(), CliError> {
    let session = Session::open(cli, args)?;
    let report = session.scan(&args.directory)?;

    let log_file = write_log(args, &report.violations)?;
    print_scan_summary(cli, &session, args, &report, log_file.as_deref())?;
    finish(report.violations.len())
}

fn run_fix(cli: &Cli, args: &FixArgs) -> Result<(), CliError> {
    let session = Session::open(cli, &args.scan)?;
    let initial = session.scan(&args.scan.directory)?;

    let remediator = Remediator::new(&session.config).with_logger(session.logger.clone());
    let signals = session.signals.clone();
    let stop: &dyn Fn() -> bool = &move || signals.should_stop();
    let fix_report = remediator.apply(&initial.violations, Some(stop));

    if session.mode == OutputMode::Human && !cli.quiet {
        print_fix_details(&fix_report, initial.name_violations().count());
    } else {
        for failure in &fix_report.failed {
            eprintln!("{} {}", "error:".red(), failure.error);
        }
    }
    if fix_report.was_cancelled() {
        return Err(CliError::Interrupted);
    }

    let final_report = if args.no_rescan {
        remaining_after(&initial, &fix_report)
    } else {
        session.scan(&args.scan.directory)?
    };

    let log_file = write_log(&args.scan, &final_report.violations)?;
    match session.mode {
        OutputMode::Json if !cli.quiet => {
            let payload = json!({
                "command": "fix",
                "root": args.scan.directory.to_string_lossy(),
                "fix": serde_json::to_value(&fix_report)?,
                "rescanned": !args.no_rescan,
                "entries_scanned": final_report.entries_scanned,
                "violations": serde_json::to_value(&final_report.violations)?,
                "log_file": log_file.as_ref().map(|p| p.to_string_lossy()),
            });
            write_json_line(&payload)?;
        }
        _ => print_scan_summary(cli, &session, &args.scan, &final_report, log_file.as_deref())?,
    }
    finish(final_report.violations.len())
}

/// What is left when the tree is not scanned again: everything that was not fixed.
fn remaining_after(initial: &ScanReport, fixes: &FixReport) -> ScanReport {
    let fixed: HashSet<&Path> = fixes.fixed.iter().map(|f| f.from.as_path()).collect();
    ScanReport {
        violations: initial
            .violations
            .iter()
            .filter(|v| !(v.kind.is_name() && fixed.contains(v.path.as_path())))
            .cloned()
            .collect(),
        skipped: Vec::new(),
        entries_scanned: initial.entries_scanned,
        interrupted: false,
    }
}

fn finish(remaining: usize) -> Result<(), CliError> {
    if remaining == 0 {
        Ok(())
    } else {
        Err(CliError::Violations(remaining))
    }
}

fn write_log(args: &ScanArgs, violations: &[Violation]) -> Result<Option<PathBuf>, CliError> {
    let Some(requested) = &args.log else {
        return Ok(None);
    };
    let path = if requested.as_os_str() == AUTO_LOG {
        let cwd = std::env::current_dir()
            .map_err(|e| CliError::Runtime(format!("cannot read current directory: {e}")))?;
        auto_log_name(&cwd)
    } else {
        requested.clone()
    };
    append_report(&path, violations)?;
    Ok(Some(path))
}

// ──────────────────── output ────────────────────

fn print_scan_summary(
    cli: &Cli,
    session: &Session,
    args: &ScanArgs,
    report: &ScanReport,
    log_file: Option<&Path>,
) -> Result<(), CliError> {
    let names = report.name_violations().count();
    let paths = report.path_violations().count();
    let limits = &session.config.limits;

    if cli.quiet {
        println!("{names} {paths} {}", report.entries_scanned);
        return Ok(());
    }

    match session.mode {
        OutputMode::Json => {
            let skipped: Vec<Value> = report
                .skipped
                .iter()
                .map(|e| json!({ "code": e.code(), "error": e.to_string() }))
                .collect();
            let payload = json!({
                "command": "scan",
                "root": args.directory.to_string_lossy(),
                "entries_scanned": report.entries_scanned,
                "name_violations": names,
                "path_violations": paths,
                "violations": serde_json::to_value(&report.violations)?,
                "skipped": skipped,
                "log_file": log_file.map(|p| p.to_string_lossy()),
            });
            write_json_line(&payload)?;
        }
        OutputMode::Human => {
            println!();
            println!("{}", "SCAN RESULTS:".bold());
            println!(
                "Entries scanned: {}",
                report.entries_scanned.to_string().blue()
            );
            println!(
                "Names too long (>={} bytes): {}",
                limits.max_name_bytes,
                names.to_string().yellow()
            );
            println!(
                "Paths too long (>={} bytes): {}",
                limits.max_path_bytes,
                paths.to_string().yellow()
            );

            if report.is_clean() {
                println!();
                println!("{}", CLEAN_LINE.green());
            } else {
                println!();
                println!("{}", "VIOLATIONS:".bold());
                for violation in &report.violations {
                    println!("  {violation}");
                    if cli.verbose {
                        println!("    ({})", violation.kind.entry_kind().label());
                    }
                }
            }

            if let Some(path) = log_file {
                println!();
                println!("{} {}", "Report appended to:".blue(), path.display());
            }
        }
    }
    Ok(())
}

fn print_fix_details(report: &FixReport, name_violations: usize) {
    if !report.unsupported.is_empty() {
        println!(
            "{}",
            "Warning: long paths are not fixed automatically:".yellow()
        );
        for violation in &report.unsupported {
            println!("  {violation}");
        }
        println!();
    }

    if name_violations == 0 {
        println!("{}", "No long names to fix".green());
        return;
    }

    println!("{}", "Fixing long names:".bold());
    for (index, outcome) in report.fixed.iter().enumerate() {
        println!("{}/{name_violations}: {}", index + 1, outcome.from.display());
        println!("  {}", outcome.to_string().green());
    }
    for failure in &report.failed {
        println!("{}", failure.path.display());
        println!("  {} {}", "Error:".yellow(), failure.error);
    }
    if report.was_cancelled() {
        println!(
            "{}",
            format!("Stopped with {} fix(es) not attempted", report.cancelled).yellow()
        );
    }
    println!(
        "{}",
        format!("Fixed: {}/{name_violations}", report.fixed.len()).bold()
    );
}

// ──────────────────── config ────────────────────

fn run_config(cli: &Cli, args: &ConfigArgs) -> Result<(), CliError> {
    match args.command {
        None | Some(ConfigCommand::Path) => {
            let path = cli.config.clone().unwrap_or_else(Config::default_path);
            let exists = path.exists();

            match output_mode(cli) {
                OutputMode::Human => {
                    println!("{}", path.display());
                    if !exists {
                        println!("  (file does not exist; defaults will be used)");
                    }
                }
                OutputMode::Json => {
                    let payload = json!({
                        "command": "config path",
                        "path": path.to_string_lossy(),
                        "exists": exists,
                    });
                    write_json_line(&payload)?;
                }
            }
            Ok(())
        }
        Some(ConfigCommand::Show) => {
            let config = Config::load(cli.config.as_deref())?;

            match output_mode(cli) {
                OutputMode::Human => println!("{}", config.to_toml()?),
                OutputMode::Json => {
                    let payload = json!({
                        "command": "config show",
                        "config": serde_json::to_value(&config)?,
                    });
                    write_json_line(&payload)?;
                }
            }
            Ok(())
        }
        Some(ConfigCommand::Validate) => match Config::load(cli.config.as_deref()) {
            Ok(config) => {
                let hash = config.stable_hash()?;

                match output_mode(cli) {
                    OutputMode::Human => {
                        println!("Configuration is valid.");
                        println!("  Source: {}", config.paths.config_file.display());
                        println!("  Hash: {hash}");
                    }
                    OutputMode::Json => {
                        let payload = json!({
                            "command": "config validate",
                            "valid": true,
                            "path": config.paths.config_file.to_string_lossy(),
                            "hash": hash,
                        });
                        write_json_line(&payload)?;
                    }
                }
                Ok(())
            }
            Err(e) => {
                match output_mode(cli) {
                    OutputMode::Human => eprintln!("Configuration is INVALID: {e}"),
                    OutputMode::Json => {
                        let payload = json!({
                            "command": "config validate",
                            "valid": false,
                            "code": e.code(),
                            "error": e.to_string(),
                        });
                        write_json_line(&payload)?;
                    }
                }
                Err(CliError::User(format!("invalid config: {e}")))
            }
        },
    }
}

// ──────────────────── helpers ────────────────────

fn write_json_line(payload: &Value) -> Result<(), CliError> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer(&mut stdout, payload)?;
    writeln!(stdout)?;
    Ok(())
}

fn output_mode(cli: &Cli) -> OutputMode {
    let env_mode = std::env::var("TOOLONG_OUTPUT_FORMAT").ok();
    resolve_output_mode(cli.json, env_mode.as_deref())
}

fn resolve_output_mode(json_flag: bool, env_mode: Option<&str>) -> OutputMode {
    if json_flag {
        return OutputMode::Json;
    }

    match env_mode
        .map(str::trim)
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("json") => OutputMode::Json,
        _ => OutputMode::Human,
    }
}

// ──────────────────── tests ────────────────────
