//! CLI-level error type separating configuration problems from runtime failures.

use std::fmt::{self, Display, Formatter};

/// Exit status for any unsuccessful run.
pub(crate) const EXIT_FAILURE: i32 = 1;
/// Exit status when a second interrupt aborts the run.
pub(crate) const EXIT_INTERRUPTED: i32 = 130;

#[derive(Debug)]
pub(crate) enum CliError {
    /// The configuration file or arguments are unusable.
    Validation(String),
    /// A daemon or the local filesystem failed before the migration could run.
    Failure(anyhow::Error),
}

/// Convenience alias for functions returning a `CliError`.
pub(crate) type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn failure(error: impl Into<anyhow::Error>) -> Self {
        Self::Failure(error.into())
    }

    pub(crate) fn display_message(&self) -> String {
        match self {
            Self::Validation(message) => format!("invalid configuration: {message}"),
            Self::Failure(error) => format!("{error:#}"),
        }
    }
}

impl Display for CliError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str("cli error")
    }
}

impl std::error::Error for CliError {}
