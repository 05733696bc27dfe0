//! Error taxonomy for the download pipeline.
//!
//! Every pipeline stage owns one error enum. The orchestrator wraps them in
//! [`PipelineError`] so a failed batch item always carries the stage it
//! failed in. Like the rest of the core, these types are serializable and do
//! not hold `std::io::Error` directly; I/O failures are captured as strings.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Stage errors
// ============================================================================

/// Failure to parse a compound identifier or batch line.
#[derive(Clone, Debug, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum ParseError {
    /// The input is not of the form `<digits>@<digits>`.
    #[error("Malformed identifier '{raw}': {reason}")]
    MalformedIdentifier {
        /// The offending input.
        raw: String,
        /// Why it was rejected.
        reason: String,
    },
}

impl ParseError {
    /// Create a malformed identifier error.
    pub fn malformed(raw: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedIdentifier {
            raw: raw.into(),
            reason: reason.into(),
        }
    }
}

/// Failure while fetching catalog metadata.
#[derive(Clone, Debug, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum FetchError {
    /// Connection or transport level failure.
    #[error("Network failure: {message}")]
    NetworkFailure {
        /// Detailed error message.
        message: String,
    },

    /// The body could not be decoded as a catalog entry.
    #[error("Could not decode catalog response: {message}")]
    DecodeFailure {
        /// Decoder message.
        message: String,
    },

    /// The catalog answered with an error status not covered below.
    #[error("Catalog request failed with status {status}: {url}")]
    HttpStatus {
        /// HTTP status code.
        status: u16,
        /// Requested URL.
        url: String,
    },

    /// The catalog has no model with this id (HTTP 404).
    #[error("Model {catalog_id} not found in catalog")]
    ModelNotFound {
        /// The catalog id that was requested.
        catalog_id: String,
    },

    /// The catalog refused the credential, or one is required (HTTP 401/403).
    #[error("Authentication required for model {catalog_id} (HTTP {status})")]
    AuthRequired {
        /// The catalog id that was requested.
        catalog_id: String,
        /// 401 or 403.
        status: u16,
    },

    /// The catalog is rate limiting this client (HTTP 429).
    #[error("Rate limit exceeded, try again later")]
    RateLimited,
}

impl FetchError {
    /// Create a network failure.
    pub fn network(message: impl Into<String>) -> Self {
        Self::NetworkFailure {
            message: message.into(),
        }
    }

    /// Create a decode failure.
    pub fn decode(message: impl Into<String>) -> Self {
        Self::DecodeFailure {
            message: message.into(),
        }
    }

    /// Map a non-success HTTP status onto the matching variant.
    pub fn from_status(status: u16, catalog_id: &str, url: &str) -> Self {
        match status {
            404 => Self::ModelNotFound {
                catalog_id: catalog_id.to_string(),
            },
            401 | 403 => Self::AuthRequired {
                catalog_id: catalog_id.to_string(),
                status,
            },
            429 => Self::RateLimited,
            _ => Self::HttpStatus {
                status,
                url: url.to_string(),
            },
        }
    }

    /// Whether a retry has a chance of succeeding.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::NetworkFailure { .. } | Self::RateLimited => true,
            Self::HttpStatus { status, .. } => *status >= 500,
            Self::DecodeFailure { .. } | Self::ModelNotFound { .. } | Self::AuthRequired { .. } => {
                false
            }
        }
    }
}

/// Failure to pick a version and file out of a catalog entry.
#[derive(Clone, Debug, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum SelectionError {
    /// The requested version id is not numeric.
    #[error("Invalid version id '{version_id}'")]
    InvalidVersionID {
        /// The rejected version id.
        version_id: String,
    },

    /// No version of the model carries the requested id.
    #[error("Version {version_id} not found for model {catalog_id}")]
    VersionNotFound {
        /// Model id.
        catalog_id: u64,
        /// Requested version id.
        version_id: u64,
    },

    /// The version exists but lists no files.
    #[error("Version {version_id} of model {catalog_id} has no files")]
    NoFilesAvailable {
        /// Model id.
        catalog_id: u64,
        /// Matched version id.
        version_id: u64,
    },
}

/// Failure to prepare the destination directory chain.
#[derive(Clone, Debug, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum PlacementError {
    /// A directory could not be created.
    #[error("Failed to create directory {path}: {reason}")]
    CreateFailed {
        /// Directory that failed.
        path: PathBuf,
        /// Underlying reason.
        reason: String,
    },

    /// A catalog-supplied name is not a single plain path component.
    #[error("Invalid {what} '{value}': must be a single path component")]
    InvalidComponent {
        /// Which component (file name, base model).
        what: String,
        /// The rejected value.
        value: String,
    },
}

impl PlacementError {
    /// Create a directory creation failure from an I/O error.
    pub fn create_failed(path: impl Into<PathBuf>, err: &std::io::Error) -> Self {
        Self::CreateFailed {
            path: path.into(),
            reason: err.to_string(),
        }
    }
}

/// Failure while streaming an artifact to disk.
#[derive(Clone, Debug, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum TransferError {
    /// The stream broke mid-transfer. The partial file is kept for resumption.
    #[error("Transfer interrupted with {bytes_on_disk} bytes on disk: {message}")]
    Interrupted {
        /// Size of the partial file.
        bytes_on_disk: u64,
        /// Transport error message.
        message: String,
    },

    /// The finished file does not have the advertised size.
    #[error("Size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch {
        /// Size announced by the server.
        expected: u64,
        /// Size found on disk.
        actual: u64,
    },

    /// The server answered a range request with a different range.
    #[error("Range not honored: requested offset {requested}, server sent offset {received}")]
    RangeNotHonored {
        /// Offset asked for.
        requested: u64,
        /// Offset the server started at.
        received: u64,
    },

    /// The download URL answered with an error status.
    #[error("Download failed with HTTP status {status}")]
    HttpStatus {
        /// HTTP status code.
        status: u16,
    },

    /// The request could not be sent at all.
    #[error("Network error: {message}")]
    Network {
        /// Detailed error message.
        message: String,
    },

    /// Local file operation failed.
    #[error("I/O error: {message}")]
    Io {
        /// Detailed error message.
        message: String,
    },

    /// Stopped at a chunk boundary because the batch was cancelled.
    #[error("Transfer cancelled with {bytes_on_disk} bytes on disk")]
    Cancelled {
        /// Size of the partial file.
        bytes_on_disk: u64,
    },
}

impl TransferError {
    /// Create an I/O error from a `std::io::Error`.
    #[must_use]
    pub fn from_io_error(err: &std::io::Error) -> Self {
        Self::Io {
            message: format!("{:?}: {err}", err.kind()),
        }
    }

    /// Create a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Whether retrying (with resume) can make progress.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Interrupted { .. } | Self::Network { .. } => true,
            Self::HttpStatus { status } => *status >= 500 || *status == 429,
            Self::SizeMismatch { .. }
            | Self::RangeNotHonored { .. }
            | Self::Io { .. }
            | Self::Cancelled { .. } => false,
        }
    }
}

// ============================================================================
// Pipeline error
// ============================================================================

/// Pipeline stage an item failed in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Identifier or batch line parsing.
    Parse,
    /// Catalog lookup.
    Fetch,
    /// Version and file selection.
    Select,
    /// Destination directory preparation.
    Resolve,
    /// Byte transfer.
    Transfer,
    /// The batch was cancelled before or during the item.
    Cancelled,
}

impl Stage {
    /// Lower-case name used in logs and reports.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Parse => "parse",
            Self::Fetch => "fetch",
            Self::Select => "select",
            Self::Resolve => "resolve",
            Self::Transfer => "transfer",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Any failure of a single batch item.
#[derive(Clone, Debug, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "stage", content = "error", rename_all = "snake_case")]
pub enum PipelineError {
    /// Identifier could not be parsed.
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// Catalog lookup failed.
    #[error(transparent)]
    Fetch(#[from] FetchError),
    /// Version selection failed.
    #[error(transparent)]
    Select(#[from] SelectionError),
    /// Destination could not be prepared.
    #[error(transparent)]
    Resolve(#[from] PlacementError),
    /// Transfer failed.
    #[error(transparent)]
    Transfer(#[from] TransferError),
    /// The batch was cancelled before this item started.
    #[error("Cancelled before start")]
    Cancelled,
}

impl PipelineError {
    /// The stage this error belongs to.
    #[must_use]
    pub const fn stage(&self) -> Stage {
        match self {
            Self::Parse(_) => Stage::Parse,
            Self::Fetch(_) => Stage::Fetch,
            Self::Select(_) => Stage::Select,
            Self::Resolve(_) => Stage::Resolve,
            Self::Transfer(TransferError::Cancelled { .. }) | Self::Cancelled => Stage::Cancelled,
            Self::Transfer(_) => Stage::Transfer,
        }
    }
}
