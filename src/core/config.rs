//! Configuration system: TOML file + env var overrides + defaults.

#![allow(missing_docs)]

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::errors::{Result, TlError};

/// Full toolong configuration model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Config {
    pub limits: LimitsConfig,
    pub remediation: RemediationConfig,
    pub scanner: ScannerConfig,
    pub logging: LoggingConfig,
    pub paths: PathsConfig,
}

/// Byte limits an entry is measured against.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LimitsConfig {
    /// A final path component of this many bytes or more is a violation.
    pub max_name_bytes: usize,
    /// A full path of this many bytes or more is a violation.
    pub max_path_bytes: usize,
}

/// How a directory entry is moved to its new name.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DirectoryStrategy {
    /// One atomic `rename`; children are relocated one by one only if it fails.
    Rename,
    /// Always create the target and move the children one by one.
    Relocate,
}

/// Knobs for the name remediation algorithm.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RemediationConfig {
    /// Length every overlong piece is cut down to, leaving room for `_N` tags.
    pub safe_name_bytes: usize,
    /// Stem length kept when a numbered collision candidate is built.
    pub collision_stem_bytes: usize,
    /// Numbered candidates tried before giving up on a directory.
    pub max_collision_attempts: u32,
    pub directory_strategy: DirectoryStrategy,
}

/// Scan progress behaviour.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ScannerConfig {
    /// Entries between two progress lines.
    pub progress_interval: u64,
    /// Walk the tree once up front so progress can show a percentage.
    pub count_before_scan: bool,
}

/// Activity log switches.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    pub activity_log_enabled: bool,
}

/// Filesystem paths used by toolong.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PathsConfig {
    pub config_file: PathBuf,
    pub activity_log: PathBuf,
    /// Used when `activity_log` cannot be opened or written.
    pub activity_log_fallback: PathBuf,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_name_bytes: 255,
            max_path_bytes: 4096,
        }
    }
}

impl Default for RemediationConfig {
    fn default() -> Self {
        Self {
            safe_name_bytes: 250,
            collision_stem_bytes: 200,
            max_collision_attempts: 10_000,
            directory_strategy: DirectoryStrategy::Rename,
        }
    }
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            progress_interval: 100,
            count_before_scan: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            activity_log_enabled: true,
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        let home_dir = env::var_os("HOME").map_or_else(
            || {
                eprintln!("[TL-CONFIG] WARNING: HOME not set, falling back to /tmp for data paths");
                PathBuf::from("/tmp")
            },
            PathBuf::from,
        );
        Self {
            config_file: home_dir.join(".config").join("toolong").join("config.toml"),
            activity_log: home_dir
                .join(".local")
                .join("share")
                .join("toolong")
                .join("activity.jsonl"),
            activity_log_fallback: env::temp_dir().join("toolong").join("activity.jsonl"),
        }
    }
}

impl Config {
    /// Default configuration path.
    #[must_use]
    pub fn default_path() -> PathBuf {
        PathsConfig::default().config_file
    }

    /// Load config from default or explicit path, then apply env overrides.
    ///
    /// Missing config file is not an error when loading from default path; defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path_buf = path.map_or_else(Self::default_path, Path::to_path_buf);
        let is_explicit_path = path.is_some();

        let mut cfg = if path_buf.exists() {
            let raw = fs::read_to_string(&path_buf).map_err(|source| TlError::io(&path_buf, source))?;
            toml::from_str::<Self>(&raw)?
        } else if is_explicit_path {
            return Err(TlError::MissingConfig { path: path_buf });
        } else {
            Self::default()
        };

        cfg.paths.config_file = path_buf;
        cfg.apply_env_overrides_from(env_var)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Deterministic hash of the effective config for the activity log.
    ///
    /// FNV-1a over the canonical JSON form, stable across processes and releases.
    pub fn stable_hash(&self) -> Result<String> {
        let canonical = serde_json::to_string(self)?;
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for byte in canonical.as_bytes() {
            hash ^= u64::from(*byte);
            hash = hash.wrapping_mul(0x0100_0000_01b3);
        }
        Ok(format!("{hash:016x}"))
    }

    /// Render the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    fn apply_env_overrides_from<F>(&mut self, mut lookup: F) -> Result<()>
    where
        F: FnMut(&str) -> Option<String>,
    {
        // limits
        if let Some(raw) = lookup("TOOLONG_LIMITS_MAX_NAME_BYTES") {
            self.limits.max_name_bytes = parse_env("TOOLONG_LIMITS_MAX_NAME_BYTES", &raw)?;
        }
        if let Some(raw) = lookup("TOOLONG_LIMITS_MAX_PATH_BYTES") {
            self.limits.max_path_bytes = parse_env("TOOLONG_LIMITS_MAX_PATH_BYTES", &raw)?;
        }

        // remediation
        if let Some(raw) = lookup("TOOLONG_REMEDIATION_SAFE_NAME_BYTES") {
            self.remediation.safe_name_bytes =
                parse_env("TOOLONG_REMEDIATION_SAFE_NAME_BYTES", &raw)?;
        }
        if let Some(raw) = lookup("TOOLONG_REMEDIATION_COLLISION_STEM_BYTES") {
            self.remediation.collision_stem_bytes =
                parse_env("TOOLONG_REMEDIATION_COLLISION_STEM_BYTES", &raw)?;
        }
        if let Some(raw) = lookup("TOOLONG_REMEDIATION_MAX_COLLISION_ATTEMPTS") {
            self.remediation.max_collision_attempts =
                parse_env("TOOLONG_REMEDIATION_MAX_COLLISION_ATTEMPTS", &raw)?;
        }
        if let Some(raw) = lookup("TOOLONG_REMEDIATION_DIRECTORY_STRATEGY") {
            self.remediation.directory_strategy = match raw.trim() {
                "rename" => DirectoryStrategy::Rename,
                "relocate" => DirectoryStrategy::Relocate,
                other => {
                    return Err(TlError::ConfigParse {
                        context: "env",
                        details: format!(
                            "TOOLONG_REMEDIATION_DIRECTORY_STRATEGY={other:?}: expected rename or relocate"
                        ),
                    });
                }
            };
        }

        // scanner
        if let Some(raw) = lookup("TOOLONG_SCANNER_PROGRESS_INTERVAL") {
            self.scanner.progress_interval = parse_env("TOOLONG_SCANNER_PROGRESS_INTERVAL", &raw)?;
        }
        if let Some(raw) = lookup("TOOLONG_SCANNER_COUNT_BEFORE_SCAN") {
            self.scanner.count_before_scan = parse_env("TOOLONG_SCANNER_COUNT_BEFORE_SCAN", &raw)?;
        }

        // logging
        if let Some(raw) = lookup("TOOLONG_ACTIVITY_LOG_ENABLED") {
            self.logging.activity_log_enabled = parse_env("TOOLONG_ACTIVITY_LOG_ENABLED", &raw)?;
        }
        if let Some(raw) = lookup("TOOLONG_ACTIVITY_LOG") {
            self.paths.activity_log = PathBuf::from(raw);
        }
        if let Some(raw) = lookup("TOOLONG_ACTIVITY_LOG_FALLBACK") {
            self.paths.activity_log_fallback = PathBuf::from(raw);
        }

        Ok(())
    }

    /// Check cross-field constraints.
    pub fn validate(&self) -> Result<()> {
        let limits = &self.limits;
        let remediation = &self.remediation;

        if limits.max_name_bytes < 2 {
            return Err(TlError::InvalidConfig {
                details: format!(
                    "limits.max_name_bytes must be >= 2, got {}",
                    limits.max_name_bytes
                ),
            });
        }
        if limits.max_path_bytes <= limits.max_name_bytes {
            return Err(TlError::InvalidConfig {
                details: format!(
                    "limits.max_path_bytes ({}) must be > limits.max_name_bytes ({})",
                    limits.max_path_bytes, limits.max_name_bytes
                ),
            });
        }
        if remediation.safe_name_bytes == 0 || remediation.safe_name_bytes >= limits.max_name_bytes
        {
            return Err(TlError::InvalidConfig {
                details: format!(
                    "remediation.safe_name_bytes ({}) must be in [1, limits.max_name_bytes ({}))",
                    remediation.safe_name_bytes, limits.max_name_bytes
                ),
            });
        }
        if remediation.collision_stem_bytes >= remediation.safe_name_bytes {
            return Err(TlError::InvalidConfig {
                details: format!(
                    "remediation.collision_stem_bytes ({}) must be < remediation.safe_name_bytes ({})",
                    remediation.collision_stem_bytes, remediation.safe_name_bytes
                ),
            });
        }
        if remediation.max_collision_attempts == 0 {
            return Err(TlError::InvalidConfig {
                details: "remediation.max_collision_attempts must be >= 1".to_string(),
            });
        }
        if self.scanner.progress_interval == 0 {
            return Err(TlError::InvalidConfig {
                details: "scanner.progress_interval must be >= 1".to_string(),
            });
        }

        Ok(())
    }
}

fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|raw| !raw.trim().is_empty())
}

fn parse_env<T>(name: &str, raw: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse::<T>().map_err(|error| TlError::ConfigParse {
        context: "env",
        details: format!("{name}={raw:?}: {error}"),
    })
}
