//! HTTP archive fetching.

use crate::archive::{ArchiveFrame, load_frames};
use crate::error::Result;
use crate::json::JsonContainer;

/// HTTP client for archive files.
///
/// One GET per archive; failures are returned, never retried.
#[derive(Debug, Clone, Default)]
pub struct ArchiveClient {
    http: reqwest::Client,
}

impl ArchiveClient {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Download the raw archive bytes.
    pub async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>> {
        tracing::info!("Fetching archive {}", url);
        let response = self.http.get(url).send().await?.error_for_status()?;
        let bytes = response.bytes().await?;
        tracing::info!("Fetched {} bytes from {}", bytes.len(), url);
        Ok(bytes.to_vec())
    }

    /// Download, parse and decode every frame of the archive at `url`.
    pub async fn fetch_frames(&self, url: &str, group: &str) -> Result<Vec<(String, ArchiveFrame)>> {
        let bytes = self.fetch_bytes(url).await?;
        let container = JsonContainer::from_slice(&bytes)?;
        load_frames(&container, group)
    }
}
