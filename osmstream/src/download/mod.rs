//! PBF file download helper.
//!
//! Streams an `.osm.pbf` archive from an HTTP mirror to a local file. This
//! is a prerequisite step and never overlaps a processing pass.

use std::fs::File;
use std::io;
use std::path::Path;
use std::time::Duration;

use thiserror::Error;
use tracing::info;

/// Time allowed to establish the connection. The transfer itself is not
/// bounded; planet extracts run to hundreds of gigabytes.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Download failures.
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("failed to write downloaded file: {0}")]
    Io(#[from] io::Error),
}

/// Downloads `url` to `dest`, streaming the body straight to disk.
///
/// Returns the number of bytes written. Any existing file at `dest` is
/// truncated.
pub fn fetch_pbf(url: &str, dest: impl AsRef<Path>) -> Result<u64, DownloadError> {
    let dest = dest.as_ref();
    info!(url, dest = %dest.display(), "starting PBF download");

    let client = reqwest::blocking::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .build()
        .map_err(|e| DownloadError::Http(format!("failed to create HTTP client: {e}")))?;

    let mut response = client
        .get(url)
        .send()
        .map_err(|e| DownloadError::Http(format!("request failed: {e}")))?;

    if !response.status().is_success() {
        return Err(DownloadError::Http(format!(
            "HTTP {} from {}",
            response.status(),
            url
        )));
    }

    let mut file = File::create(dest)?;
    let bytes = io::copy(&mut response, &mut file)
        .map_err(|e| DownloadError::Http(format!("transfer failed: {e}")))?;
    file.sync_all()?;

    info!(bytes, dest = %dest.display(), "PBF download complete");
    Ok(bytes)
}
