//! Internal error types for catalog operations.
//!
//! These errors are internal to `civitdl-catalog` and are mapped to
//! `civitdl_core::FetchError` at the port boundary.

use thiserror::Error;

/// Result type alias for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Errors related to catalog API operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// API request failed with an HTTP error status.
    #[error("Catalog API request failed with status {status}: {url}")]
    ApiRequestFailed {
        /// HTTP status code
        status: u16,
        /// The URL that was requested
        url: String,
    },

    /// The configured base URL cannot carry path segments.
    #[error("Base URL '{url}' cannot be used as an API root")]
    InvalidBaseUrl {
        /// The offending URL
        url: String,
    },

    /// Network or HTTP client error.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// JSON parsing error.
    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),
}
