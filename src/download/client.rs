//! HTTP client wrapper and the single-attempt transfer step.
//!
//! [`HttpClient::transfer`] makes exactly one request and classifies the
//! response into a [`TransferStep`]. It never follows redirects and never
//! retries; both decisions belong to [`Saver`](super::Saver).

use std::path::Path;
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header::{CONTENT_LENGTH, LOCATION};
use reqwest::{Client, StatusCode, redirect};
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::time::timeout;
use tracing::{debug, instrument, warn};
use url::Url;

use super::constants::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS};
use super::error::DownloadError;
use crate::user_agent;

/// What a single transfer attempt observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferStep {
    /// A 200 response whose body was streamed to the destination.
    Completed {
        /// HTTP status of the response.
        status: u16,
        /// Bytes written to the destination.
        bytes_copied: u64,
        /// Declared `content-length`, if the header was present.
        expected_bytes: Option<u64>,
    },
    /// A 200 response whose body ended before its declared length.
    Truncated {
        /// HTTP status of the response.
        status: u16,
        /// Bytes written before the connection ended.
        bytes_copied: u64,
        /// Declared `content-length`.
        expected_bytes: u64,
    },
    /// A 3xx response. Nothing was written.
    Redirect {
        /// HTTP status of the response.
        status: u16,
        /// Raw `Location` header value, if present and valid UTF-8.
        location: Option<String>,
    },
    /// Any other non-200 status. Nothing was written.
    HttpError {
        /// HTTP status of the response.
        status: u16,
    },
    /// A read (headers or body) exceeded the read timeout.
    TimedOut,
}

/// HTTP client for single-attempt streaming transfers.
///
/// Built once and reused for every attempt and hop of a download. Automatic
/// redirects are disabled so that 3xx responses reach [`TransferStep::Redirect`].
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    read_timeout: Duration,
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient {
    /// Creates a new HTTP client with default timeouts.
    ///
    /// Default configuration:
    /// - Connect timeout: 30 seconds
    /// - Read timeout: 5 minutes per read
    /// - Redirects: not followed
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the static
    /// configuration. This should never happen in practice.
    #[must_use]
    pub fn new() -> Self {
        Self::new_with_timeouts(
            Duration::from_secs(CONNECT_TIMEOUT_SECS),
            Duration::from_secs(READ_TIMEOUT_SECS),
        )
    }

    /// Creates a new HTTP client with explicit timeout values.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the supplied
    /// timeout configuration.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new_with_timeouts(connect_timeout: Duration, read_timeout: Duration) -> Self {
        Self::try_new_with_timeouts(connect_timeout, read_timeout)
            .expect("failed to build HTTP client with static configuration")
    }

    /// Creates a new HTTP client, reporting builder failures instead of panicking.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::Client`] if the TLS backend or resolver cannot
    /// be initialised.
    #[instrument(level = "debug")]
    pub fn try_new_with_timeouts(
        connect_timeout: Duration,
        read_timeout: Duration,
    ) -> Result<Self, DownloadError> {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .redirect(redirect::Policy::none())
            .no_proxy()
            .user_agent(user_agent::default_download_user_agent())
            .build()
            .map_err(DownloadError::client)?;
        Ok(Self {
            client,
            read_timeout,
        })
    }

    /// Returns the per-read timeout.
    #[must_use]
    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    /// Makes one request to `url` and, on 200, streams the body to `destination`.
    ///
    /// The destination is opened (create + truncate) only for a 200 response,
    /// and the handle is flushed and released before this returns, whatever
    /// the result.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::Network`] for transport failures other than a
    /// read timeout, and [`DownloadError::Io`] if the destination cannot be
    /// written. Timeouts are reported as [`TransferStep::TimedOut`].
    #[instrument(skip(self), fields(url = %url, destination = %destination.display()))]
    pub async fn transfer(
        &self,
        url: &Url,
        destination: &Path,
    ) -> Result<TransferStep, DownloadError> {
        let request = self.client.get(url.clone()).send();
        let response = match timeout(self.read_timeout, request).await {
            Err(_) => {
                debug!("read timeout waiting for response headers");
                return Ok(TransferStep::TimedOut);
            }
            Ok(Err(e)) if is_read_timeout(&e) => {
                debug!(error = %e, "read timeout waiting for response headers");
                return Ok(TransferStep::TimedOut);
            }
            Ok(Err(e)) => return Err(DownloadError::network(url.as_str(), e)),
            Ok(Ok(response)) => response,
        };

        let status = response.status();
        debug!(status = status.as_u16(), "received response");

        if status.is_redirection() {
            let location = response
                .headers()
                .get(LOCATION)
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned);
            return Ok(TransferStep::Redirect {
                status: status.as_u16(),
                location,
            });
        }

        if status != StatusCode::OK {
            return Ok(TransferStep::HttpError {
                status: status.as_u16(),
            });
        }

        let expected_bytes = declared_content_length(&response);
        let file = File::create(destination)
            .await
            .map_err(|e| DownloadError::io(destination, e))?;

        let (bytes_copied, end) =
            stream_to_file(file, response, self.read_timeout, destination).await?;

        match end {
            CopyEnd::Finished => Ok(TransferStep::Completed {
                status: status.as_u16(),
                bytes_copied,
                expected_bytes,
            }),
            CopyEnd::TimedOut => {
                debug!(bytes_copied, "read timeout while streaming body");
                Ok(TransferStep::TimedOut)
            }
            CopyEnd::Interrupted(source) => match expected_bytes {
                Some(expected) if bytes_copied < expected => {
                    warn!(
                        bytes_copied,
                        expected_bytes = expected,
                        error = %source,
                        "body ended before declared content-length"
                    );
                    Ok(TransferStep::Truncated {
                        status: status.as_u16(),
                        bytes_copied,
                        expected_bytes: expected,
                    })
                }
                _ => Err(DownloadError::network(url.as_str(), source)),
            },
        }
    }

}

/// How the body copy stopped.
enum CopyEnd {
    Finished,
    TimedOut,
    Interrupted(reqwest::Error),
}

/// Streams the response body into `file` chunk by chunk.
///
/// Returns the bytes written and how the copy ended. The writer is flushed
/// and the file handle dropped on every path that returns `Ok`.
async fn stream_to_file(
    file: File,
    response: reqwest::Response,
    read_timeout: Duration,
    file_path: &Path,
) -> Result<(u64, CopyEnd), DownloadError> {
    let mut writer = BufWriter::new(file);
    let mut stream = response.bytes_stream();
    let mut bytes_copied: u64 = 0;

    let end = loop {
        let Ok(next) = timeout(read_timeout, stream.next()).await else {
            break CopyEnd::TimedOut;
        };
        match next {
            None => break CopyEnd::Finished,
            Some(Ok(chunk)) => {
                writer
                    .write_all(&chunk)
                    .await
                    .map_err(|e| DownloadError::io(file_path, e))?;
                bytes_copied += chunk.len() as u64;
            }
            Some(Err(e)) if is_read_timeout(&e) => break CopyEnd::TimedOut,
            Some(Err(e)) => break CopyEnd::Interrupted(e),
        }
    };

    writer
        .flush()
        .await
        .map_err(|e| DownloadError::io(file_path, e))?;
    drop(writer);

    Ok((bytes_copied, end))
}

/// A timeout that happened after the connection was established.
fn is_read_timeout(error: &reqwest::Error) -> bool {
    error.is_timeout() && !error.is_connect()
}

/// Parses `content-length`. Absent yields `None`.
///
/// A malformed value never gets here: hyper rejects the response head and
/// `send()` fails with a network error.
fn declared_content_length(response: &reqwest::Response) -> Option<u64> {
    response
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
}
