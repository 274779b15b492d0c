//! Error types for configuration loading.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Primary error type for configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file does not exist.
    #[error("configuration file {} not found", path.display())]
    NotFound {
        /// Path that was probed.
        path: PathBuf,
    },
    /// The configuration file could not be read.
    #[error("failed to read configuration file {}", path.display())]
    Io {
        /// Path that failed to read.
        path: PathBuf,
        /// Source IO error.
        source: io::Error,
    },
    /// The document is not valid JSON or does not match the expected shape.
    #[error("invalid configuration document {}", path.display())]
    Parse {
        /// Path of the offending document.
        path: PathBuf,
        /// Source JSON error.
        source: serde_json::Error,
    },
    /// A required field was absent.
    #[error("missing {section}.{field} in config")]
    MissingField {
        /// Section that should contain the field.
        section: &'static str,
        /// Name of the missing field.
        field: &'static str,
    },
    /// A field contained an invalid value.
    #[error("invalid value for '{field}' in '{section}': {reason}")]
    InvalidField {
        /// Section that failed validation.
        section: &'static str,
        /// Field that failed validation.
        field: &'static str,
        /// Offending value when available.
        value: Option<String>,
        /// Human-readable reason for the failure.
        reason: &'static str,
    },
}

impl ConfigError {
    pub(crate) fn invalid(
        section: &'static str,
        field: &'static str,
        value: Option<String>,
        reason: &'static str,
    ) -> Self {
        Self::InvalidField {
            section,
            field,
            value,
            reason,
        }
    }
}

/// Convenience alias for configuration results.
pub type ConfigResult<T> = Result<T, ConfigError>;
