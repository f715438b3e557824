//! Structured results handed back to the caller.

use std::fmt;
use std::time::Duration;

/// Why a transfer ended without a usable file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    /// The server answered with a 4xx or 5xx status.
    HttpStatus,
    /// A redirect arrived after the hop budget was spent.
    TooManyRedirects,
    /// A 3xx response carried no usable `Location` header.
    MissingLocation,
    /// A status that is neither 200, a redirect, nor an error (e.g. 204).
    UnexpectedStatus,
}

impl FailureReason {
    /// Returns a short stable label for display output.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::HttpStatus => "http status",
            Self::TooManyRedirects => "too many redirects",
            Self::MissingLocation => "redirect without location",
            Self::UnexpectedStatus => "unexpected status",
        }
    }
}

/// Result of a save-to-disk call.
///
/// Never partially populated: either the destination holds the full body
/// ([`Success`](Self::Success)), the body disagreed with its declared length
/// ([`SizeMismatch`](Self::SizeMismatch)), or nothing usable was written
/// ([`Failure`](Self::Failure)).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferOutcome {
    /// The body was streamed to the destination.
    Success {
        /// Final HTTP status (always 200 today).
        status_code: u16,
        /// Bytes written to the destination.
        bytes: u64,
    },
    /// The body was streamed, but the byte count disagrees with `content-length`.
    SizeMismatch {
        /// Final HTTP status.
        status_code: u16,
        /// Bytes the server declared.
        expected_bytes: u64,
        /// Bytes actually written.
        actual_bytes: u64,
    },
    /// The transfer did not produce a file.
    Failure {
        /// Status of the response that ended the transfer, when known.
        status_code: Option<u16>,
        /// What went wrong.
        reason: FailureReason,
    },
}

impl TransferOutcome {
    /// Returns true only for [`TransferOutcome::Success`].
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Returns the status code carried by the outcome, if any.
    #[must_use]
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Success { status_code, .. } | Self::SizeMismatch { status_code, .. } => {
                Some(*status_code)
            }
            Self::Failure { status_code, .. } => *status_code,
        }
    }

    /// Flattens the outcome into `(success flag, status code string)`.
    #[must_use]
    pub fn into_pair(self) -> (bool, Option<String>) {
        (self.is_success(), self.status_code().map(|code| code.to_string()))
    }
}

impl fmt::Display for TransferOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success { status_code, bytes } => {
                write!(f, "HTTP {status_code}: saved {bytes} bytes")
            }
            Self::SizeMismatch {
                status_code,
                expected_bytes,
                actual_bytes,
            } => write!(
                f,
                "HTTP {status_code}: size mismatch, expected {expected_bytes} bytes, got {actual_bytes}"
            ),
            Self::Failure {
                status_code: Some(code),
                reason,
            } => write!(f, "HTTP {code}: {}", reason.as_str()),
            Self::Failure {
                status_code: None,
                reason,
            } => f.write_str(reason.as_str()),
        }
    }
}

/// Everything the saver learned while producing an outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadReport {
    /// The result handed back to the caller.
    pub outcome: TransferOutcome,
    /// URL of the last request made (after following redirects).
    pub final_url: String,
    /// Transfer attempts made across all hops.
    pub attempts: u32,
    /// Redirects followed.
    pub redirects_followed: u32,
    /// Total time spent sleeping between timeout retries.
    pub backoff: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_pair() {
        let outcome = TransferOutcome::Success {
            status_code: 200,
            bytes: 12,
        };
        assert_eq!(outcome.into_pair(), (true, Some("200".to_string())));
    }

    #[test]
    fn test_size_mismatch_is_not_success() {
        let outcome = TransferOutcome::SizeMismatch {
            status_code: 200,
            expected_bytes: 100,
            actual_bytes: 10,
        };
        assert!(!outcome.is_success());
        assert_eq!(outcome.into_pair(), (false, Some("200".to_string())));
        assert!(outcome.to_string().contains("expected 100 bytes, got 10"));
    }

    #[test]
    fn test_failure_without_status_pair() {
        let outcome = TransferOutcome::Failure {
            status_code: None,
            reason: FailureReason::TooManyRedirects,
        };
        assert_eq!(outcome.into_pair(), (false, None));
        assert_eq!(outcome.to_string(), "too many redirects");
    }

    #[test]
    fn test_failure_display_includes_status() {
        let outcome = TransferOutcome::Failure {
            status_code: Some(302),
            reason: FailureReason::TooManyRedirects,
        };
        assert_eq!(outcome.to_string(), "HTTP 302: too many redirects");
    }
}
