//! The immutable description of one save-to-disk call.

use std::path::{Path, PathBuf};

use super::constants::{DEFAULT_HOP_BUDGET, DEFAULT_MAX_ATTEMPTS};

/// What to do when the bytes written differ from the declared `content-length`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SizeCheck {
    /// Report the transfer as [`TransferOutcome::SizeMismatch`](super::TransferOutcome::SizeMismatch).
    #[default]
    Enforce,
    /// Log a warning and report the transfer as a success anyway.
    WarnOnly,
}

/// A single download: where from, where to, and how much patience to spend.
///
/// # Example
///
/// ```
/// use stream_saver::download::{DownloadRequest, SizeCheck};
///
/// let request = DownloadRequest::new("https://example.com/data.bin", "data.bin")
///     .with_hop_budget(5)
///     .with_max_attempts(3)
///     .with_size_check(SizeCheck::WarnOnly);
/// assert_eq!(request.hop_budget(), 5);
/// assert_eq!(request.max_attempts(), 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    url: String,
    destination: PathBuf,
    hop_budget: u32,
    max_attempts: u32,
    size_check: SizeCheck,
}

impl DownloadRequest {
    /// Creates a request with the default hop budget (3) and attempt limit (5).
    pub fn new(url: impl Into<String>, destination: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            destination: destination.into(),
            hop_budget: DEFAULT_HOP_BUDGET,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            size_check: SizeCheck::default(),
        }
    }

    /// Sets how many redirects may be followed. Zero follows none.
    #[must_use]
    pub fn with_hop_budget(mut self, hop_budget: u32) -> Self {
        self.hop_budget = hop_budget;
        self
    }

    /// Sets the attempt limit per hop. Values below 1 are raised to 1.
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Sets the size mismatch policy.
    #[must_use]
    pub fn with_size_check(mut self, size_check: SizeCheck) -> Self {
        self.size_check = size_check;
        self
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    #[must_use]
    pub fn destination(&self) -> &Path {
        &self.destination
    }

    #[must_use]
    pub fn hop_budget(&self) -> u32 {
        self.hop_budget
    }

    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    #[must_use]
    pub fn size_check(&self) -> SizeCheck {
        self.size_check
    }
}
