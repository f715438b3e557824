//! Constants for the download module (timeouts, redirect and retry budgets).

use std::time::Duration;

/// Default HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default HTTP read timeout (5 minutes for large files).
///
/// Applies to each individual read: waiting for the status line and headers,
/// and waiting for every body chunk.
pub const READ_TIMEOUT_SECS: u64 = 300;

/// Default number of redirects followed before giving up.
pub const DEFAULT_HOP_BUDGET: u32 = 3;

/// Default number of transfer attempts per hop (including the first one).
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Time unit multiplied by `attempt^3` to get the backoff before a retry.
pub const DEFAULT_BACKOFF_UNIT: Duration = Duration::from_secs(1);
