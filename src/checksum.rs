//! Streaming SHA-256 of a file on disk.

use std::path::Path;

use sha2::{Digest, Sha256};
use tokio::fs::File;
use tokio::io::AsyncReadExt;
use tracing::instrument;

use crate::download::DownloadError;

/// Read buffer size for hashing (64 KiB).
const CHECKSUM_BUFFER_SIZE: usize = 64 * 1024;

/// Returns the lowercase hex SHA-256 of the file at `path`.
///
/// Reads the file in fixed-size chunks, so memory use does not depend on the
/// file size.
///
/// # Errors
///
/// Returns [`DownloadError::Io`] if the file cannot be opened or read.
#[instrument(level = "debug", fields(path = %path.display()))]
pub async fn sha256_file(path: &Path) -> Result<String, DownloadError> {
    let mut file = File::open(path)
        .await
        .map_err(|e| DownloadError::io(path, e))?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0_u8; CHECKSUM_BUFFER_SIZE];

    loop {
        let read = file
            .read(&mut buffer)
            .await
            .map_err(|e| DownloadError::io(path, e))?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}
