//! Error types for sapcheck
//!
//! Only engine-fatal conditions live here. Misconfigurations found on the
//! host are reported as [`Finding`](crate::check::Finding)s, never as errors.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for sapcheck operations
#[derive(Error, Debug)]
pub enum CheckError {
    /// The host is not a supported SUSE Linux Enterprise release
    #[error("Unsupported host: {0}")]
    UnsupportedHost(String),

    /// The file-set table has no entry for this release and tag
    #[error("No file set defined for OS release {os_major} and {tag}")]
    UnmappedFileSet { os_major: u32, tag: String },

    /// The version tier table does not cover this version
    #[error("No version tier defined for {tool} {version}")]
    NoVersionTier { tool: String, version: String },

    /// systemd reported a state the checker does not know
    #[error("Unknown {property} '{value}' reported for {unit}")]
    UnknownServiceState {
        unit: String,
        property: String,
        value: String,
    },

    /// A line in /etc/os-release or a sysconfig file could not be understood
    #[error("Cannot parse '{path}': {message}")]
    Parse { path: PathBuf, message: String },

    /// I/O error while reading host facts
    #[error("I/O error at '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An external command could not be run
    #[error("Command '{command}' failed: {message}")]
    Command { command: String, message: String },

    /// Report serialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CheckError {
    /// Create an I/O error with path context
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a parse error with path context
    pub fn parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an unknown service state error
    pub fn unknown_state(
        unit: impl Into<String>,
        property: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self::UnknownServiceState {
            unit: unit.into(),
            property: property.into(),
            value: value.into(),
        }
    }

    /// Whether the error means the checker itself is incomplete rather
    /// than the host being unusable
    pub fn is_rule_table_error(&self) -> bool {
        matches!(self, Self::UnmappedFileSet { .. } | Self::NoVersionTier { .. })
    }

    /// Get the path associated with this error, if any
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Self::Io { path, .. } | Self::Parse { path, .. } => Some(path),
            _ => None,
        }
    }
}

/// Result type alias for sapcheck operations
pub type Result<T> = std::result::Result<T, CheckError>;

/// Extension trait for adding path context to std::io::Result
pub trait IoResultExt<T> {
    /// Add path context to an I/O error
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|e| CheckError::io(path, e))
    }
}
