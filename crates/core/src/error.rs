//! Error types for metaprobe operations.
//!
//! This module defines the main error type [`MetaprobeError`]. Only failures of
//! the primary page fetch (and invalid input) are meant to reach callers of
//! [`crate::Scraper::scrape`]; image and favicon enrichment failures are turned
//! into absent fields inside the pipeline.
//!
//! # Example
//!
//! ```rust
//! use metaprobe_core::{MetaprobeError, Result};
//!
//! fn require_host(url: &url::Url) -> Result<String> {
//!     url.host_str()
//!         .map(str::to_string)
//!         .ok_or_else(|| MetaprobeError::InvalidUrl(format!("{url} has no host")))
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for metadata extraction.
///
/// # Example
///
/// ```rust,no_run
/// use metaprobe_core::scrape;
///
/// # async fn run() {
/// match scrape("https://example.com").await {
///     Ok(record) => println!("{}", record.publisher),
///     Err(e) if e.is_fetch_error() => eprintln!("could not fetch page: {e}"),
///     Err(e) => eprintln!("error: {e}"),
/// }
/// # }
/// ```
#[derive(Error, Debug)]
pub enum MetaprobeError {
    /// HTTP request errors from reqwest.
    ///
    /// This variant wraps network errors, DNS failures, connection issues,
    /// redirect loops and other transport problems.
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Request timeout.
    ///
    /// Returned when an HTTP request exceeds the configured timeout duration.
    #[error("Request timed out after {timeout} seconds")]
    Timeout { timeout: u64 },

    /// The server answered with a non-success status code.
    #[error("Request to {url} failed with status {status}")]
    HttpStatus { url: String, status: u16 },

    /// The response body exceeded the configured size limit.
    #[error("Response body exceeds the {limit} byte limit")]
    BodyTooLarge { limit: usize },

    /// Invalid URL provided.
    ///
    /// Returned when a URL cannot be parsed, is relative, or uses a scheme
    /// other than http/https.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Invalid CSS selector handed to the HTML parser.
    #[error("Failed to parse HTML: {0}")]
    HtmlParseError(String),

    /// Image bytes could not be identified or decoded.
    #[error("Failed to decode image: {0}")]
    ImageDecode(String),

    /// JSON rendering of a record failed.
    #[error("Failed to serialize record: {0}")]
    Serialization(#[from] serde_json::Error),

    /// File not found.
    ///
    /// Returned when reading a local HTML file that doesn't exist.
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// Local I/O errors.
    #[error("Failed to read input: {0}")]
    ReadError(#[from] std::io::Error),
}

impl MetaprobeError {
    /// Whether this error means the primary resource could not be fetched.
    ///
    /// These are the errors that have no degraded result: transport failures,
    /// timeouts, non-success statuses and oversized bodies.
    pub fn is_fetch_error(&self) -> bool {
        matches!(
            self,
            MetaprobeError::HttpError(_)
                | MetaprobeError::Timeout { .. }
                | MetaprobeError::HttpStatus { .. }
                | MetaprobeError::BodyTooLarge { .. }
        )
    }
}

/// Result type alias for MetaprobeError.
///
/// This is a convenience alias for `std::result::Result<T, MetaprobeError>`.
pub type Result<T> = std::result::Result<T, MetaprobeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MetaprobeError::InvalidUrl("not a url".to_string());
        assert!(err.to_string().contains("Invalid URL"));
    }

    #[test]
    fn test_timeout_error() {
        let err = MetaprobeError::Timeout { timeout: 15 };
        assert!(err.to_string().contains("15"));
        assert!(err.is_fetch_error());
    }

    #[test]
    fn test_http_status_error() {
        let err = MetaprobeError::HttpStatus { url: "https://example.com/".to_string(), status: 404 };
        assert!(err.to_string().contains("404"));
        assert!(err.to_string().contains("https://example.com/"));
        assert!(err.is_fetch_error());
    }

    #[test]
    fn test_non_fetch_errors() {
        assert!(!MetaprobeError::InvalidUrl("x".to_string()).is_fetch_error());
        assert!(!MetaprobeError::ImageDecode("bad magic".to_string()).is_fetch_error());
        assert!(!MetaprobeError::FileNotFound(PathBuf::from("/nope")).is_fetch_error());
    }
}
