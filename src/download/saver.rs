//! Save a URL to disk: read-timeout retries and redirect following.
//!
//! The saver drives [`HttpClient::transfer`] in a loop with two independent
//! counters:
//!
//! - **hops remaining** starts at the request's hop budget and is spent one
//!   per redirect followed;
//! - **attempt** starts at 1 for every hop and grows only on read timeouts.
//!
//! ```text
//!            +-----------+  TimedOut (attempt <= max)   sleep attempt^3
//!     url -->| transfer  |------------------------------------+
//!            +-----------+<-----------------------------------+
//!              |   |   |
//!              |   |   +-- Redirect (hops > 0) --> join Location, attempt = 1
//!              |   +------ Redirect (hops == 0) / HttpError --> Failure
//!              +---------- Completed / Truncated --> Success | SizeMismatch
//! ```
//!
//! Timeouts past the attempt limit and every transport error other than a
//! read timeout propagate as [`DownloadError`].

use std::path::Path;
use std::time::Duration;

use tracing::{debug, info, instrument, warn};
use url::Url;

use super::client::{HttpClient, TransferStep};
use super::constants::{
    CONNECT_TIMEOUT_SECS, DEFAULT_BACKOFF_UNIT, DEFAULT_HOP_BUDGET, DEFAULT_MAX_ATTEMPTS,
    READ_TIMEOUT_SECS,
};
use super::error::DownloadError;
use super::outcome::{DownloadReport, FailureReason, TransferOutcome};
use super::request::{DownloadRequest, SizeCheck};
use super::retry::{RetryDecision, RetryPolicy};

/// Runs downloads described by [`DownloadRequest`]s.
///
/// # Example
///
/// ```no_run
/// use stream_saver::download::{DownloadRequest, HttpClient, Saver};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let saver = Saver::new(HttpClient::new());
/// let request = DownloadRequest::new("https://example.com/data.bin", "data.bin");
/// let report = saver.save(&request).await?;
/// println!("{} after {} attempts", report.outcome, report.attempts);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Saver {
    client: HttpClient,
    backoff_unit: Duration,
}

impl Default for Saver {
    fn default() -> Self {
        Self::new(HttpClient::new())
    }
}

impl Saver {
    /// Creates a saver using `client` and the default one-second backoff unit.
    #[must_use]
    pub fn new(client: HttpClient) -> Self {
        Self {
            client,
            backoff_unit: DEFAULT_BACKOFF_UNIT,
        }
    }

    /// Overrides the time unit of the cubic backoff.
    #[must_use]
    pub fn with_backoff_unit(mut self, backoff_unit: Duration) -> Self {
        self.backoff_unit = backoff_unit;
        self
    }

    /// Downloads `request.url()` into `request.destination()`.
    ///
    /// # Errors
    ///
    /// - [`DownloadError::InvalidUrl`] if the URL or a redirect target is not
    ///   an absolute HTTP(S) URL
    /// - [`DownloadError::Timeout`] once a hop has used all its attempts
    /// - [`DownloadError::Network`] / [`DownloadError::Io`] on the first
    ///   transport or file system failure, without retry
    #[instrument(
        skip(self, request),
        fields(url = %request.url(), destination = %request.destination().display())
    )]
    pub async fn save(&self, request: &DownloadRequest) -> Result<DownloadReport, DownloadError> {
        let policy = RetryPolicy::new(request.max_attempts(), self.backoff_unit);
        let mut url = parse_http_url(request.url())?;
        let mut hops_remaining = request.hop_budget();
        let mut attempt: u32 = 1;
        let mut attempts: u32 = 0;
        let mut redirects_followed: u32 = 0;
        let mut backoff = Duration::ZERO;

        let outcome = loop {
            attempts += 1;
            debug!(url = %url, attempt, hops_remaining, "starting transfer attempt");

            match self.client.transfer(&url, request.destination()).await? {
                TransferStep::TimedOut => match policy.after_timeout(attempt) {
                    RetryDecision::Retry {
                        delay,
                        attempt: next_attempt,
                    } => {
                        warn!(
                            url = %url,
                            attempt,
                            next_attempt,
                            delay_ms = delay.as_millis(),
                            "read timeout, backing off"
                        );
                        tokio::time::sleep(delay).await;
                        backoff += delay;
                        attempt = next_attempt;
                    }
                    RetryDecision::GiveUp { reason } => {
                        warn!(url = %url, attempt, %reason, "giving up after read timeouts");
                        return Err(DownloadError::timeout(url.as_str(), attempt));
                    }
                },

                TransferStep::Redirect { status, .. } if hops_remaining == 0 => {
                    warn!(url = %url, status, "redirect budget exhausted");
                    break TransferOutcome::Failure {
                        status_code: Some(status),
                        reason: FailureReason::TooManyRedirects,
                    };
                }

                TransferStep::Redirect {
                    status,
                    location: None,
                } => {
                    warn!(url = %url, status, "redirect without Location header");
                    break TransferOutcome::Failure {
                        status_code: Some(status),
                        reason: FailureReason::MissingLocation,
                    };
                }

                TransferStep::Redirect {
                    status,
                    location: Some(location),
                } => {
                    let next_url = resolve_location(&url, &location)?;
                    debug!(from = %url, to = %next_url, status, "following redirect");
                    hops_remaining -= 1;
                    redirects_followed += 1;
                    attempt = 1;
                    url = next_url;
                }

                TransferStep::HttpError { status } => {
                    let reason = if (400..600).contains(&status) {
                        FailureReason::HttpStatus
                    } else {
                        FailureReason::UnexpectedStatus
                    };
                    break TransferOutcome::Failure {
                        status_code: Some(status),
                        reason,
                    };
                }

                TransferStep::Completed {
                    status,
                    bytes_copied,
                    expected_bytes,
                } => {
                    break check_size(
                        status,
                        bytes_copied,
                        expected_bytes,
                        request.size_check(),
                        request.destination(),
                    );
                }

                TransferStep::Truncated {
                    status,
                    bytes_copied,
                    expected_bytes,
                } => {
                    break check_size(
                        status,
                        bytes_copied,
                        Some(expected_bytes),
                        request.size_check(),
                        request.destination(),
                    );
                }
            }
        };

        info!(
            outcome = %outcome,
            final_url = %url,
            attempts,
            redirects_followed,
            backoff_ms = backoff.as_millis(),
            "download finished"
        );

        Ok(DownloadReport {
            outcome,
            final_url: url.into(),
            attempts,
            redirects_followed,
            backoff,
        })
    }
}

/// Compares the bytes written with the declared length and applies `size_check`.
///
/// An unknown declared length disables the comparison.
fn check_size(
    status: u16,
    bytes_copied: u64,
    expected_bytes: Option<u64>,
    size_check: SizeCheck,
    destination: &Path,
) -> TransferOutcome {
    match expected_bytes {
        Some(expected) if expected != bytes_copied => {
            warn!(
                path = %destination.display(),
                expected_bytes = expected,
                actual_bytes = bytes_copied,
                ?size_check,
                "bytes written do not match declared content-length"
            );
            match size_check {
                SizeCheck::Enforce => TransferOutcome::SizeMismatch {
                    status_code: status,
                    expected_bytes: expected,
                    actual_bytes: bytes_copied,
                },
                SizeCheck::WarnOnly => TransferOutcome::Success {
                    status_code: status,
                    bytes: bytes_copied,
                },
            }
        }
        Some(_) => TransferOutcome::Success {
            status_code: status,
            bytes: bytes_copied,
        },
        None => {
            debug!(
                bytes = bytes_copied,
                "no usable content-length, size check skipped"
            );
            TransferOutcome::Success {
                status_code: status,
                bytes: bytes_copied,
            }
        }
    }
}

fn parse_http_url(raw: &str) -> Result<Url, DownloadError> {
    let url = Url::parse(raw).map_err(|_| DownloadError::invalid_url(raw))?;
    ensure_http(url, raw)
}

/// Resolves a `Location` value (absolute or relative) against the current URL.
fn resolve_location(current: &Url, location: &str) -> Result<Url, DownloadError> {
    let url = current
        .join(location)
        .map_err(|_| DownloadError::invalid_url(location))?;
    ensure_http(url, location)
}

fn ensure_http(url: Url, raw: &str) -> Result<Url, DownloadError> {
    match url.scheme() {
        "http" | "https" => Ok(url),
        _ => Err(DownloadError::invalid_url(raw)),
    }
}

/// Downloads `url` into `destination` with explicit budgets.
///
/// Builds a fresh [`HttpClient`] with default timeouts for the call.
///
/// # Errors
///
/// Same as [`Saver::save`].
pub async fn attempt_download(
    url: &str,
    destination: impl AsRef<Path>,
    hop_budget: u32,
    max_attempts: u32,
) -> Result<TransferOutcome, DownloadError> {
    let client = HttpClient::try_new_with_timeouts(
        Duration::from_secs(CONNECT_TIMEOUT_SECS),
        Duration::from_secs(READ_TIMEOUT_SECS),
    )?;
    let request = DownloadRequest::new(url, destination.as_ref())
        .with_hop_budget(hop_budget)
        .with_max_attempts(max_attempts);
    Ok(Saver::new(client).save(&request).await?.outcome)
}

/// Downloads `url` into `destination` with the default budgets (3 hops, 5 attempts).
///
/// # Errors
///
/// Same as [`Saver::save`].
pub async fn save_from_url(
    url: &str,
    destination: impl AsRef<Path>,
) -> Result<TransferOutcome, DownloadError> {
    attempt_download(url, destination, DEFAULT_HOP_BUDGET, DEFAULT_MAX_ATTEMPTS).await
}
