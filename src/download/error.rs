//! Error types for the download module.
//!
//! Transport failures carry the URL being fetched; storage failures carry the
//! path being written, so every message names what it was working on.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while talking to the service or writing the file.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// Network-level error (DNS resolution, connection refused, TLS errors, etc.)
    #[error("network error downloading {url}: {source}")]
    Network {
        /// The URL that failed to download.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out before completion.
    #[error("timeout downloading {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// HTTP error response on the fetch request.
    #[error("HTTP {status} downloading {url}")]
    HttpStatus {
        /// The URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The body stream failed part-way through.
    #[error("error reading response body from {url}: {source}")]
    Stream {
        /// The URL whose body was being read.
        url: String,
        /// The underlying stream error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The provided URL is malformed or invalid.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The invalid URL string.
        url: String,
    },

    /// The HTTP session could not be constructed.
    #[error("failed to build HTTP client: {source}")]
    ClientBuild {
        /// The underlying builder error.
        #[source]
        source: reqwest::Error,
    },

    /// File system error during download (create file, write, rename, etc.)
    #[error("IO error writing to {path}: {source}")]
    Io {
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Downloaded file size does not match the declared content length.
    #[error(
        "integrity check failed for {path}: expected {expected_bytes} bytes, got {actual_bytes}"
    )]
    Integrity {
        /// In-progress path that failed verification.
        path: PathBuf,
        /// Expected size in bytes.
        expected_bytes: u64,
        /// Actual size in bytes.
        actual_bytes: u64,
    },
}

impl DownloadError {
    /// Creates a network error from a reqwest error, promoting timeouts.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            return Self::timeout(url);
        }
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Creates a body stream error.
    pub fn stream<E>(url: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Stream {
            url: url.into(),
            source: Box::new(source),
        }
    }

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Creates a client construction error.
    #[must_use]
    pub fn client_build(source: reqwest::Error) -> Self {
        Self::ClientBuild { source }
    }

    /// Creates an integrity mismatch error.
    pub fn integrity(path: impl Into<PathBuf>, expected_bytes: u64, actual_bytes: u64) -> Self {
        Self::Integrity {
            path: path.into(),
            expected_bytes,
            actual_bytes,
        }
    }

    /// Returns true for failures of the local filesystem rather than the network.
    #[must_use]
    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Io { .. } | Self::Integrity { .. })
    }
}

// No `From<reqwest::Error>` or `From<std::io::Error>`: every variant needs the
// URL or path that the source error lacks, so callers go through the helpers.

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_download_error_timeout_display() {
        let error = DownloadError::timeout("https://example.com/file.zip");
        assert!(error.to_string().contains("timeout"));
        assert!(error.to_string().contains("https://example.com/file.zip"));
    }

    #[test]
    fn test_download_error_http_status_display() {
        let error = DownloadError::http_status("https://example.com/file.zip", 404);
        let msg = error.to_string();
        assert!(msg.contains("404"), "Expected '404' in: {msg}");
        assert!(
            msg.contains("https://example.com/file.zip"),
            "Expected URL in: {msg}"
        );
    }

    #[test]
    fn test_download_error_io_display() {
        let io_error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let error = DownloadError::io(PathBuf::from("/tmp/test.zip.part"), io_error);
        let msg = error.to_string();
        assert!(msg.contains("/tmp/test.zip.part"), "Expected path in: {msg}");
    }

    #[test]
    fn test_download_error_stream_display_keeps_source() {
        let source = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "peer reset");
        let error = DownloadError::stream("https://example.com/big.iso", source);
        let msg = error.to_string();
        assert!(msg.contains("big.iso"), "Expected URL in: {msg}");
        assert!(msg.contains("peer reset"), "Expected source in: {msg}");
        assert!(std::error::Error::source(&error).is_some());
    }

    #[test]
    fn test_download_error_integrity_display() {
        let error = DownloadError::integrity("/tmp/x.part", 10, 7);
        let msg = error.to_string();
        assert!(msg.contains("expected 10 bytes, got 7"), "got: {msg}");
    }

    #[test]
    fn test_download_error_invalid_url_display() {
        let error = DownloadError::invalid_url("not-a-url");
        let msg = error.to_string();
        assert!(
            msg.contains("invalid URL"),
            "Expected 'invalid URL' in: {msg}"
        );
        assert!(msg.contains("not-a-url"), "Expected URL in: {msg}");
    }

    #[test]
    fn test_is_storage_classification() {
        assert!(DownloadError::integrity("/tmp/x", 1, 0).is_storage());
        assert!(
            DownloadError::io("/tmp/x", std::io::Error::other("disk full")).is_storage()
        );
        assert!(!DownloadError::timeout("https://x").is_storage());
        assert!(!DownloadError::http_status("https://x", 500).is_storage());
    }
}
