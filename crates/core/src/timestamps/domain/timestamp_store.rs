use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TimestampStoreError {
    #[error("failed to write timestamps to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read timestamps from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{path} is not a 1-D float64 array: {reason}")]
    Format { path: PathBuf, reason: String },
}

/// Persists a recording's timestamp sequence.
pub trait TimestampStore: Send {
    /// Writes the whole sequence to `path`, replacing any existing file.
    /// Either the complete sequence lands at `path` or nothing does.
    fn persist(&self, path: &Path, timestamps: &[f64]) -> Result<(), TimestampStoreError>;
}
