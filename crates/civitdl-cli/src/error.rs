//! CLI-specific error types and exit codes.

use civitdl_core::{BatchSummary, FetchError, TransferError};
use thiserror::Error;

/// CLI-specific error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Some batch items did not download.
    #[error("{failed} of {total} item(s) failed, {cancelled} cancelled")]
    ItemsFailed {
        /// Items that failed.
        failed: usize,
        /// Items stopped by cancellation.
        cancelled: usize,
        /// Batch size.
        total: usize,
    },

    /// Argument error.
    #[error("Invalid arguments: {0}")]
    Arguments(String),

    /// IO error (batch file missing, unreadable, ...).
    #[error("IO error: {0}")]
    Io(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl CliError {
    /// Map error to the process exit code.
    ///
    /// Exit codes follow Unix conventions:
    /// - 1: Some items failed
    /// - 2: Misuse of shell command (invalid arguments)
    /// - 74, 78: see sysexits.h
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::ItemsFailed { .. } => 1,
            Self::Arguments(_) => 2, // EX_USAGE
            Self::Io(_) => 74,       // EX_IOERR
            Self::Config(_) => 78,   // EX_CONFIG
        }
    }

    /// The error for a finished batch, if it was not a full success.
    pub const fn from_summary(summary: &BatchSummary) -> Option<Self> {
        if summary.all_succeeded() {
            None
        } else {
            Some(Self::ItemsFailed {
                failed: summary.failed,
                cancelled: summary.cancelled,
                total: summary.total(),
            })
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

// Client construction failures are configuration problems
impl From<FetchError> for CliError {
    fn from(err: FetchError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<TransferError> for CliError {
    fn from(err: TransferError) -> Self {
        Self::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(
            CliError::ItemsFailed {
                failed: 1,
                cancelled: 0,
                total: 2
            }
            .exit_code(),
            1
        );
        assert_eq!(CliError::Arguments("x".into()).exit_code(), 2);
        assert_eq!(CliError::Io("x".into()).exit_code(), 74);
        assert_eq!(CliError::Config("x".into()).exit_code(), 78);
    }

    #[test]
    fn test_from_summary() {
        let ok = BatchSummary {
            succeeded: 3,
            failed: 0,
            cancelled: 0,
        };
        assert!(CliError::from_summary(&ok).is_none());

        let partial = BatchSummary {
            succeeded: 1,
            failed: 1,
            cancelled: 1,
        };
        let err = CliError::from_summary(&partial).unwrap();
        assert_eq!(err.exit_code(), 1);
        assert_eq!(err.to_string(), "1 of 3 item(s) failed, 1 cancelled");
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "download.txt");
        assert_eq!(CliError::from(io).exit_code(), 74);
    }
}
