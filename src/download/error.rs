//! Error types for the download module.
//!
//! Only conditions the saver cannot resolve on its own end up here. Redirects,
//! HTTP error statuses and size mismatches are reported through
//! [`TransferOutcome`](super::TransferOutcome) instead.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Fatal errors raised while saving a URL to disk.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// Every attempt for a hop hit the read timeout.
    #[error("read timeout downloading {url} (gave up after {attempts} attempts)")]
    Timeout {
        /// The URL that kept timing out.
        url: String,
        /// Number of attempts made for this URL.
        attempts: u32,
    },

    /// Network-level error (DNS resolution, connection refused, TLS errors, etc.)
    #[error("network error downloading {url}: {source}")]
    Network {
        /// The URL that failed to download.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// File system error while writing the destination.
    #[error("IO error writing to {path}: {source}")]
    Io {
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The provided URL (or a redirect target) is malformed or not HTTP(S).
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The invalid URL string.
        url: String,
    },

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {source}")]
    Client {
        /// The underlying builder error.
        #[source]
        source: reqwest::Error,
    },

    /// The file is larger than allowed, or its size could not be determined.
    #[error(transparent)]
    FileSize(#[from] DownloadFileSizeError),
}

impl DownloadError {
    /// Creates a timeout error after `attempts` attempts.
    pub fn timeout(url: impl Into<String>, attempts: u32) -> Self {
        Self::Timeout {
            url: url.into(),
            attempts,
        }
    }

    /// Creates a network error from a reqwest error.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
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
    pub fn client(source: reqwest::Error) -> Self {
        Self::Client { source }
    }

    /// Returns true when the error is the exhausted read-timeout retry budget.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// A download was refused because of its size.
///
/// `file_size` is `None` when the size could not be determined up front.
/// Nothing in the saver raises this yet; it is the error a maximum-size guard
/// reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadFileSizeError {
    max_file_size: u64,
    file_size: Option<u64>,
}

impl DownloadFileSizeError {
    /// Creates a size error for the given limit and (optional) observed size.
    #[must_use]
    pub fn new(max_file_size: u64, file_size: Option<u64>) -> Self {
        Self {
            max_file_size,
            file_size,
        }
    }

    /// The configured maximum size in bytes.
    #[must_use]
    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    /// The observed size in bytes, if it was known.
    #[must_use]
    pub fn file_size(&self) -> Option<u64> {
        self.file_size
    }
}

impl fmt::Display for DownloadFileSizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.file_size {
            None => f.write_str("Attempted to download a file whose size couldn't be determined."),
            Some(_) => {
                f.write_str("Attempted to download a file that is larger than the maximum allowed.")
            }
        }
    }
}

impl std::error::Error for DownloadFileSizeError {}

// No `From<reqwest::Error>` / `From<std::io::Error>`: every variant needs the
// url or path the source error doesn't carry, so the constructors above are
// the only way in.
