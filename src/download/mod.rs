//! Streaming single-file downloads with bounded redirects and timeout retries.
//!
//! # Features
//!
//! - Streaming copy to disk (memory use independent of payload size)
//! - Redirects observed and followed up to a hop budget (default 3)
//! - Read timeouts retried with cubic backoff (default 5 attempts per hop)
//! - Declared `content-length` checked against the bytes written
//!
//! # Example
//!
//! ```no_run
//! use stream_saver::download::save_from_url;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let outcome = save_from_url("https://example.com/data.bin", "data.bin").await?;
//! let (ok, status) = outcome.into_pair();
//! println!("success={ok} status={status:?}");
//! # Ok(())
//! # }
//! ```

mod client;
mod constants;
mod error;
mod outcome;
mod request;
mod retry;
mod saver;

pub use client::{HttpClient, TransferStep};
pub use constants::{
    CONNECT_TIMEOUT_SECS, DEFAULT_BACKOFF_UNIT, DEFAULT_HOP_BUDGET, DEFAULT_MAX_ATTEMPTS,
    READ_TIMEOUT_SECS,
};
pub use error::{DownloadError, DownloadFileSizeError};
pub use outcome::{DownloadReport, FailureReason, TransferOutcome};
pub use request::{DownloadRequest, SizeCheck};
pub use retry::{RetryDecision, RetryPolicy};
pub use saver::{Saver, attempt_download, save_from_url};

// Note: we do NOT define module-local Result aliases.
// Use `Result<T, DownloadError>` explicitly in function signatures.
