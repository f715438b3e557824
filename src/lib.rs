//! Stream Saver Core Library
//!
//! Retrieves a single remote resource over HTTP(S) and streams it to a local
//! file, following redirects up to a hop budget and retrying read timeouts
//! with cubic backoff.
//!
//! # Architecture
//!
//! - [`download`] - transfer step, retry policy and the redirect-following saver
//! - [`checksum`] - streaming SHA-256 of downloaded files

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod checksum;
pub mod download;
mod user_agent;

#[cfg(test)]
mod test_support;

// Re-export commonly used types
pub use checksum::sha256_file;
pub use download::{
    DEFAULT_HOP_BUDGET, DEFAULT_MAX_ATTEMPTS, DownloadError, DownloadFileSizeError,
    DownloadReport, DownloadRequest, FailureReason, HttpClient, RetryPolicy, Saver, SizeCheck,
    TransferOutcome, attempt_download, save_from_url,
};
