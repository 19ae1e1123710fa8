//! Error types for netmon-rs.

use std::io;
use std::path::PathBuf;

/// Result type for netmon-rs operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can stop the monitor.
///
/// Per-line parse failures, zero-length sampling windows and zero packet
/// deltas are handled where they occur and never show up here.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The counter table could not be read.
    #[error("counter source unavailable: {}: {source}", path.display())]
    SourceUnavailable {
        /// Location of the counter table.
        path: PathBuf,
        /// Underlying read error.
        #[source]
        source: io::Error,
    },

    /// Sampling frequency is not a positive, finite number.
    #[error("invalid sampling frequency: {0} (must be positive and finite)")]
    InvalidFrequency(f64),

    /// CSV record could not be written.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// I/O error (terminal setup, opening the CSV log).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Whether this error ends the sampler's lifecycle.
    pub fn is_source_unavailable(&self) -> bool {
        matches!(self, Error::SourceUnavailable { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_unavailable_display() {
        let err = Error::SourceUnavailable {
            path: PathBuf::from("/proc/net/dev"),
            source: io::Error::new(io::ErrorKind::NotFound, "no such file"),
        };
        assert!(err.is_source_unavailable());
        let msg = err.to_string();
        assert!(msg.contains("/proc/net/dev"));
        assert!(msg.contains("no such file"));
    }

    #[test]
    fn test_io_error_is_not_source_unavailable() {
        let err: Error = io::Error::other("tty gone").into();
        assert!(!err.is_source_unavailable());
    }
}
