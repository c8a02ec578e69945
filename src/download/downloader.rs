//! Streaming downloader with nested quality and transport waterfalls

use crate::core::descriptor::{MediaDescriptor, MediaKind, Quality};
use crate::core::queue::{QueueEvent, QueueStore};
use crate::download::transport::{default_transports, Transport};
use crate::download::waterfall::first_success;
use crate::error::GrabError;
use futures_util::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Progress callback, invoked with a 0-100 percentage
pub type ProgressFn = dyn Fn(u8) + Send + Sync;

/// Streaming downloader configuration
#[derive(Clone)]
pub struct DownloaderConfig {
    /// Ordered transport waterfall
    pub transports: Vec<Transport>,
    /// Stuck watchdog delay for bulk items
    pub watchdog_delay: Duration,
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            transports: default_transports(),
            watchdog_delay: Duration::from_secs(6),
        }
    }
}

/// Payload assembled from a successful download
#[derive(Debug)]
pub struct DownloadedMedia {
    pub bytes: Vec<u8>,
    /// Quality rung that actually produced the bytes; absent for audio
    pub quality: Option<Quality>,
}

/// Streaming downloader
pub struct StreamingDownloader {
    client: reqwest::Client,
    config: DownloaderConfig,
}

impl StreamingDownloader {
    /// Create a downloader with the default transport waterfall
    pub fn new() -> Self {
        Self::with_config(DownloaderConfig::default())
    }

    /// Create a downloader with explicit configuration
    pub fn with_config(config: DownloaderConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    pub fn watchdog_delay(&self) -> Duration {
        self.config.watchdog_delay
    }

    /// Download the requested kind at the requested quality.
    ///
    /// Quality waterfall on the outside, transport waterfall per candidate:
    /// every candidate URL runs through the full transport chain before the
    /// next lower quality is attempted. Exhaustion of both yields
    /// `GrabError::Exhausted` carrying the last underlying error.
    pub async fn fetch(
        &self,
        descriptor: &MediaDescriptor,
        kind: MediaKind,
        quality: Quality,
        on_progress: Arc<ProgressFn>,
    ) -> Result<DownloadedMedia, GrabError> {
        let candidates = descriptor.candidates(kind, quality);
        if candidates.is_empty() {
            return Err(GrabError::NoMediaUrl);
        }

        info!(
            "Starting {} download, {} quality candidate(s)",
            kind,
            candidates.len()
        );

        first_success("quality", candidates, |(candidate_quality, url)| {
            let on_progress = on_progress.clone();
            async move {
                let bytes = self.fetch_via_transports(&url, on_progress).await?;
                Ok(DownloadedMedia {
                    bytes,
                    quality: candidate_quality,
                })
            }
        })
        .await
        .map_err(|exhausted| GrabError::Exhausted {
            last: exhausted.last_message(),
        })
    }

    /// Run one candidate URL through the ordered transport waterfall
    async fn fetch_via_transports(
        &self,
        url: &str,
        on_progress: Arc<ProgressFn>,
    ) -> Result<Vec<u8>, GrabError> {
        first_success("transport", self.config.transports.clone(), |transport| {
            let on_progress = on_progress.clone();
            async move {
                debug!("Trying transport {}", transport.name());
                self.fetch_once(&transport.apply(url), on_progress).await
            }
        })
        .await
        .map_err(|exhausted| {
            exhausted.into_error(|| GrabError::Generic("no transports configured".to_string()))
        })
    }

    /// Single streaming fetch with byte-level progress
    async fn fetch_once(
        &self,
        url: &str,
        on_progress: Arc<ProgressFn>,
    ) -> Result<Vec<u8>, GrabError> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            warn!("Transport returned status {} for {}", status, url);
            return Err(GrabError::Generic(format!("status {}", status)));
        }

        let total = response.content_length().unwrap_or(0);
        let mut stream = response.bytes_stream();
        let mut bytes: Vec<u8> = Vec::new();
        let mut loaded: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            loaded += chunk.len() as u64;
            bytes.extend_from_slice(&chunk);

            // Without a declared length the payload is buffered whole and
            // progress stays at its last reported value until completion.
            if total > 0 {
                let percent = (loaded.saturating_mul(100) / total).min(100) as u8;
                on_progress(percent);
            }
        }

        if bytes.is_empty() {
            return Err(GrabError::Generic("empty response body".to_string()));
        }

        debug!("Fetched {} bytes from {}", bytes.len(), url);
        Ok(bytes)
    }
}

impl Default for StreamingDownloader {
    fn default() -> Self {
        Self::new()
    }
}

/// Stuck-download watchdog for a bulk item.
///
/// Waits out the delay and raises the manual-bypass flag when the item is
/// still at exactly zero progress; the download itself keeps running.
pub async fn run_watchdog(store: Arc<QueueStore>, item_id: String, delay: Duration) {
    tokio::time::sleep(delay).await;
    store.apply(&item_id, QueueEvent::StuckDetected);
}
