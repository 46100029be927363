//! Error types for encsniff.
//!
//! Only failures the caller can act on synchronously are errors. Mid-stream
//! read failures and classifier failures end the operation early and degrade
//! to a best-effort [`DetectionResult`](crate::DetectionResult) instead.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur when starting a detection operation.
#[derive(Debug, Error)]
pub enum DetectError {
    /// The byte source could not be opened.
    #[error("cannot open {}: {source}", path.display())]
    Open {
        /// The path (or handle description) that failed to open.
        path: PathBuf,
        /// The underlying open error.
        #[source]
        source: std::io::Error,
    },

    /// Invalid configuration parameter.
    #[error("invalid config: {message}")]
    InvalidConfig {
        /// Description of what was invalid.
        message: &'static str,
    },
}

impl DetectError {
    /// Builds an [`DetectError::Open`] for `path`.
    pub(crate) fn open(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DetectError::Open {
            path: path.into(),
            source,
        }
    }

    /// Returns the I/O error kind of an open failure.
    pub fn io_kind(&self) -> Option<std::io::ErrorKind> {
        match self {
            DetectError::Open { source, .. } => Some(source.kind()),
            DetectError::InvalidConfig { .. } => None,
        }
    }
}
