//! HTTP download support for the fetch stage.
//!
//! Only compiled with the `fetch` feature; the rest of the catalog works
//! without it for projects whose raw files arrive offline.

use crate::manifest::write_atomic;
use std::path::Path;
use thiserror::Error;
use tracing::info;

/// Errors raised while downloading a source file.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request could not be made or the body could not be read.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("'{url}' answered {status}")]
    Status {
        /// The requested URL.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The downloaded bytes could not be written.
    #[error("write failed: {0}")]
    Write(String),
}

/// Downloads `url` into `dest` atomically.
///
/// The body is buffered and written via temp-file + rename, so a failed
/// download never leaves a partial file for hash verification to trip
/// over.
pub async fn download(url: &str, dest: &Path) -> Result<(), FetchError> {
    let response = reqwest::get(url).await?;
    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let bytes = response.bytes().await?;
    write_atomic(dest, &bytes).map_err(|e| FetchError::Write(e.to_string()))?;

    info!(url = %url, dest = %dest.display(), bytes = bytes.len(), "downloaded");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_download_rejects_unresolvable_host() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("x.csv");
        let result = download("http://invalid.invalid/x.csv", &dest).await;
        assert!(matches!(result, Err(FetchError::Http(_))));
        assert!(!dest.exists());
    }
}
