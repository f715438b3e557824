//! Shared helpers for integration tests.

#![allow(dead_code)]

pub mod log_capture;
pub mod raw_http;
pub mod socket_guard;

use std::time::Duration;

use stream_saver::{HttpClient, Saver};

/// Read timeout used by tests that simulate slow servers.
pub const TEST_READ_TIMEOUT: Duration = Duration::from_millis(250);

/// A saver with a short read timeout and a 1ms backoff unit, so retry
/// sequences finish quickly while keeping the cubic arithmetic observable.
#[must_use]
pub fn fast_saver() -> Saver {
    Saver::new(HttpClient::new_with_timeouts(
        Duration::from_secs(5),
        TEST_READ_TIMEOUT,
    ))
    .with_backoff_unit(Duration::from_millis(1))
}
