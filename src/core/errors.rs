//! TL-prefixed error types with structured error codes.

#![allow(missing_docs)]

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Shared `Result` alias for the project.
pub type Result<T> = std::result::Result<T, TlError>;

/// Top-level error type for toolong.
#[derive(Debug, Error)]
pub enum TlError {
    #[error("[TL-1001] invalid configuration: {details}")]
    InvalidConfig { details: String },

    #[error("[TL-1002] missing configuration file: {path}")]
    MissingConfig { path: PathBuf },

    #[error("[TL-1003] configuration parse failure in {context}: {details}")]
    ConfigParse {
        context: &'static str,
        details: String,
    },

    #[error("[TL-2001] invalid scan root {path}: {details}")]
    InvalidRoot { path: PathBuf, details: String },

    #[error("[TL-2002] cannot read {path}, subtree skipped: {source}")]
    ScanIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[TL-3001] path length violations are not fixed automatically ({observed} bytes): {path}")]
    UnsupportedRemediation { path: PathBuf, observed: usize },

    #[error("[TL-3002] entry no longer exists: {path}")]
    SourceMissing { path: PathBuf },

    #[error("[TL-3003] name is not valid UTF-8: {path}")]
    NonUtf8Name { path: PathBuf },

    #[error("[TL-3004] no free name for {stem:?} in {directory} after {attempts} attempts")]
    NameSpaceExhausted {
        directory: PathBuf,
        stem: String,
        attempts: u32,
    },

    #[error("[TL-3005] {operation} failed for {path}: {source}")]
    Remediation {
        path: PathBuf,
        operation: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("[TL-4001] serialization failure in {context}: {details}")]
    Serialization {
        context: &'static str,
        details: String,
    },

    #[error("[TL-4002] IO failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[TL-4003] interrupted by user")]
    Interrupted,
}

impl TlError {
    /// Stable machine-parseable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfig { .. } => "TL-1001",
            Self::MissingConfig { .. } => "TL-1002",
            Self::ConfigParse { .. } => "TL-1003",
            Self::InvalidRoot { .. } => "TL-2001",
            Self::ScanIo { .. } => "TL-2002",
            Self::UnsupportedRemediation { .. } => "TL-3001",
            Self::SourceMissing { .. } => "TL-3002",
            Self::NonUtf8Name { .. } => "TL-3003",
            Self::NameSpaceExhausted { .. } => "TL-3004",
            Self::Remediation { .. } => "TL-3005",
            Self::Serialization { .. } => "TL-4001",
            Self::Io { .. } => "TL-4002",
            Self::Interrupted => "TL-4003",
        }
    }

    /// Whether retrying might resolve the failure.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ScanIo { .. } | Self::Remediation { .. } | Self::Io { .. }
        )
    }

    /// Convenience constructor for IO errors with a known path.
    #[must_use]
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Wrap a failed filesystem step of a fix, keyed by the violation's path.
    #[must_use]
    pub fn remediation(
        path: impl AsRef<Path>,
        operation: &'static str,
        source: std::io::Error,
    ) -> Self {
        Self::Remediation {
            path: path.as_ref().to_path_buf(),
            operation,
            source,
        }
    }
}

impl From<serde_json::Error> for TlError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization {
            context: "serde_json",
            details: value.to_string(),
        }
    }
}

impl From<toml::de::Error> for TlError {
    fn from(value: toml::de::Error) -> Self {
        Self::ConfigParse {
            context: "toml",
            details: value.to_string(),
        }
    }
}

impl From<toml::ser::Error> for TlError {
    fn from(value: toml::ser::Error) -> Self {
        Self::Serialization {
            context: "toml",
            details: value.to_string(),
        }
    }
}
