//! Error types for the portion tailer.
//!
//! Every error is fatal: nothing in the library retries. The binary's `main`
//! is the only place that turns an [`Error`] into a process exit.

use std::path::PathBuf;
use thiserror::Error;

use crate::model::{Cursor, LogFileId};

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A failure reported by a [`LogSource`](crate::LogSource).
///
/// Carries the provider's own error code when it has one, a human readable
/// message and the underlying cause (transport, I/O, ...) if any.
#[derive(Error, Debug)]
#[error("{message}")]
pub struct ProviderError {
    code: Option<String>,
    message: String,
    #[source]
    cause: Option<BoxError>,
}

impl ProviderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
            cause: None,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_cause<E>(mut self, cause: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.cause = Some(Box::new(cause));
        self
    }

    /// Provider specific error code, e.g. `DBLogFileNotFoundFault`.
    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Coarse classification used when reporting a fatal error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Discovery or fetch against the log source failed.
    Provider,
    /// Creating or writing a local output file failed.
    Sink,
    /// The supplied configuration is unusable.
    Config,
}

/// The main error type for tailing operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Listing the log files of an instance failed.
    #[error("Couldn't get the logs list for instance {instance}: {source}")]
    Discovery {
        instance: String,
        #[source]
        source: ProviderError,
    },

    /// Discovery succeeded but reported no log file at all.
    #[error("No log files reported for instance {instance}")]
    NoLogFiles { instance: String },

    /// Downloading a portion of a log file failed.
    #[error("Couldn't get a portion of {file} at marker {cursor}: {source}")]
    Fetch {
        instance: String,
        file: LogFileId,
        cursor: Cursor,
        #[source]
        source: ProviderError,
    },

    /// Creating, writing or flushing an output file failed.
    #[error("Couldn't write to output file {}: {source}", .path.display())]
    Sink {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration values rejected before tailing starts.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Discovery { .. } | Error::NoLogFiles { .. } | Error::Fetch { .. } => {
                ErrorKind::Provider
            }
            Error::Sink { .. } => ErrorKind::Sink,
            Error::InvalidConfig { .. } => ErrorKind::Config,
        }
    }

    /// The provider error code behind this error, when there is one.
    pub fn provider_code(&self) -> Option<&str> {
        match self {
            Error::Discovery { source, .. } | Error::Fetch { source, .. } => source.code(),
            _ => None,
        }
    }

    pub(crate) fn sink(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Sink {
            path: path.into(),
            source,
        }
    }
}

/// A convenient Result type for tailing operations.
pub type Result<T> = std::result::Result<T, Error>;
