//! Error types for adapter calls and migration planning.
//!
//! # Design
//! - Adapter errors carry the client and operation so a report line is self-explanatory.
//! - Transport failures keep their source boxed; callers render the chain with
//!   [`describe_error`] instead of re-logging at every layer.

use std::error::Error;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::model::{ClientKind, ContentHash};

/// Boxed source error used for transport-level failures.
pub type BoxError = Box<dyn Error + Send + Sync>;

/// Errors raised by a [`ClientAdapter`](crate::ClientAdapter).
#[derive(Debug, Error)]
pub enum AdapterError {
    /// An operation was attempted before `connect` succeeded.
    #[error("not connected to {client}; call connect() first")]
    NotConnected {
        /// Client the call was made against.
        client: ClientKind,
    },
    /// The daemon could not be reached or the transport failed mid-request.
    #[error("{client} connection failed during {operation}")]
    Connection {
        /// Client that failed.
        client: ClientKind,
        /// Operation identifier.
        operation: &'static str,
        /// Underlying transport error.
        #[source]
        source: BoxError,
    },
    /// The daemon rejected the configured credentials.
    #[error("{client} rejected the configured credentials")]
    Auth {
        /// Client that rejected the login.
        client: ClientKind,
    },
    /// Neither a `.torrent` nor a `.magnet` file exists for the hash.
    #[error("neither torrent nor magnet file found for hash {hash} in {}", directory.display())]
    NotFound {
        /// Hash that was looked up.
        hash: ContentHash,
        /// Directory that was searched.
        directory: PathBuf,
    },
    /// The daemon failed to serialise a torrent back into a `.torrent` file.
    #[error("failed to export torrent {hash}")]
    Export {
        /// Hash that was requested.
        hash: ContentHash,
        /// Underlying failure.
        #[source]
        source: BoxError,
    },
    /// The daemon answered with something the adapter could not interpret.
    #[error("{client} {operation} returned an unexpected response: {detail}")]
    Protocol {
        /// Client that answered.
        client: ClientKind,
        /// Operation identifier.
        operation: &'static str,
        /// Description of the unexpected payload or status.
        detail: String,
    },
    /// Local filesystem access failed.
    #[error("io failure during {operation} at {}", path.display())]
    Io {
        /// Operation identifier.
        operation: &'static str,
        /// Path involved in the failure.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The adapter does not implement the requested capability.
    #[error("{operation} is not supported by {client}")]
    Unsupported {
        /// Client that lacks the capability.
        client: ClientKind,
        /// Operation identifier.
        operation: &'static str,
    },
}

impl AdapterError {
    /// Wrap a transport error for the given client and operation.
    pub fn connection(
        client: ClientKind,
        operation: &'static str,
        source: impl Into<BoxError>,
    ) -> Self {
        Self::Connection {
            client,
            operation,
            source: source.into(),
        }
    }

    /// Build a protocol error from any displayable detail.
    pub fn protocol(client: ClientKind, operation: &'static str, detail: impl Into<String>) -> Self {
        Self::Protocol {
            client,
            operation,
            detail: detail.into(),
        }
    }

    /// Wrap an IO failure with its operation and path.
    pub fn io(operation: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }
}

/// Convenience alias for adapter results.
pub type AdapterResult<T> = Result<T, AdapterError>;

/// A hash string that is not a 40-character hexadecimal infohash.
#[derive(Debug, Error)]
#[error("invalid content hash '{value}': expected 40 hexadecimal characters")]
pub struct InvalidContentHash {
    /// Offending input.
    pub value: String,
}

/// Errors that abort a migration before any item is processed.
#[derive(Debug, Error)]
pub enum MigrateError {
    /// Fetching a listing from one of the daemons failed.
    #[error("failed to list torrents from {client}")]
    Listing {
        /// Client whose listing failed.
        client: ClientKind,
        /// Underlying adapter error.
        #[source]
        source: AdapterError,
    },
}

/// Convenience alias for migration results.
pub type MigrateResult<T> = Result<T, MigrateError>;

/// Render an error and its `source()` chain as a single line.
#[must_use]
pub fn describe_error(err: &(dyn Error + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
