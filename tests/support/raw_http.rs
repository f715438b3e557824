//! A hand-written HTTP/1.1 responder for wire conditions wiremock cannot produce:
//! bodies shorter than their `Content-Length`, close-delimited bodies without a
//! length, and servers that stall halfway through a body.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use super::socket_guard::should_skip_socket_bound_test;

/// What the server does after writing the canned bytes.
#[derive(Debug, Clone, Copy)]
pub enum AfterWrite {
    /// Close the connection immediately.
    Close,
    /// Keep the connection open, silent, for the given time.
    Stall(Duration),
}

/// Builds a 200 response head with an optional `Content-Length`.
#[must_use]
pub fn ok_head(content_length: Option<u64>) -> Vec<u8> {
    let mut head = String::from("HTTP/1.1 200 OK\r\nConnection: close\r\n");
    if let Some(length) = content_length {
        head.push_str(&format!("Content-Length: {length}\r\n"));
    }
    head.push_str("\r\n");
    head.into_bytes()
}

/// Serves `response` verbatim to every connection, then applies `after`.
///
/// Returns `None` when localhost sockets are unavailable.
pub async fn spawn_raw_server(response: Vec<u8>, after: AfterWrite) -> Option<SocketAddr> {
    if should_skip_socket_bound_test() {
        return None;
    }
    let listener = TcpListener::bind("127.0.0.1:0").await.ok()?;
    let addr = listener.local_addr().ok()?;

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let response = response.clone();
            tokio::spawn(async move {
                let mut request = [0_u8; 4096];
                let _ = socket.read(&mut request).await;
                let _ = socket.write_all(&response).await;
                let _ = socket.flush().await;
                if let AfterWrite::Stall(duration) = after {
                    tokio::time::sleep(duration).await;
                }
            });
        }
    });

    Some(addr)
}
