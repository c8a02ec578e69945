//! Session orchestration: resolve, enrich, download, record
//!
//! A session owns the resolver, downloader, enricher and history log and
//! drives one user action end to end. Single-item and bulk flows share all
//! of it; they differ only in how failures surface (error vs. queue event).

use crate::core::descriptor::{MediaDescriptor, MediaKind, Quality};
use crate::core::history::{HistoryEntry, HistoryLog};
use crate::core::queue::{QueueEvent, QueueStore};
use crate::download::downloader::{run_watchdog, StreamingDownloader};
use crate::enrich::Enricher;
use crate::error::GrabError;
use crate::resolve::resolver::{ProviderResolver, Resolve};
use crate::utils::filename::{output_filename, unique_filename};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

/// User-facing knobs for one session
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Directory downloads are saved into
    pub output_dir: PathBuf,
    pub kind: MediaKind,
    /// Requested quality ceiling for video downloads
    pub quality: Quality,
    /// Location of the persisted history file
    pub history_path: PathBuf,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            output_dir: dirs::download_dir().unwrap_or_else(|| PathBuf::from(".")),
            kind: MediaKind::Video,
            quality: Quality::Hd,
            history_path: HistoryLog::default_path(),
        }
    }
}

/// A download that reached disk
#[derive(Debug)]
pub struct SavedMedia {
    pub path: PathBuf,
    pub bytes_written: usize,
    /// Quality actually obtained; absent for audio
    pub quality: Option<Quality>,
}

/// One user session over the full pipeline
pub struct Session {
    resolver: Arc<dyn Resolve>,
    downloader: StreamingDownloader,
    enricher: Enricher,
    history: Mutex<HistoryLog>,
    config: SessionConfig,
}

impl Session {
    /// Build a session with the default provider and transport stacks
    pub fn new(config: SessionConfig) -> Self {
        Self::with_parts(
            Arc::new(ProviderResolver::new()),
            StreamingDownloader::new(),
            Enricher::from_env(),
            config,
        )
    }

    /// Build a session from explicit parts
    pub fn with_parts(
        resolver: Arc<dyn Resolve>,
        downloader: StreamingDownloader,
        enricher: Enricher,
        config: SessionConfig,
    ) -> Self {
        let history = Mutex::new(HistoryLog::load(&config.history_path));
        Self {
            resolver,
            downloader,
            enricher,
            history,
            config,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn resolver(&self) -> Arc<dyn Resolve> {
        self.resolver.clone()
    }

    /// Resolve one source URL into a descriptor
    pub async fn resolve_single(&self, url: &str) -> Result<MediaDescriptor, GrabError> {
        self.resolver.resolve(url).await
    }

    /// Attach a best-effort annotation; absence of one is not an error
    pub async fn enrich(&self, descriptor: &mut MediaDescriptor) {
        if !self.enricher.is_enabled() {
            return;
        }
        descriptor.annotation = self
            .enricher
            .annotate(&descriptor.title, &descriptor.author)
            .await;
    }

    pub fn enricher(&self) -> &Enricher {
        &self.enricher
    }

    /// Download one resolved media to disk and record it in history.
    ///
    /// Exhaustion surfaces as `GrabError::Exhausted`; the caller decides
    /// whether to offer the manual-bypass path.
    pub async fn download_single(
        &self,
        descriptor: &MediaDescriptor,
        on_progress: Arc<dyn Fn(u8) + Send + Sync>,
    ) -> Result<SavedMedia, GrabError> {
        let fetched = self
            .downloader
            .fetch(descriptor, self.config.kind, self.config.quality, on_progress)
            .await?;

        let saved = self.save_bytes(&fetched.bytes, self.config.kind, fetched.quality)?;
        self.record(descriptor, saved.quality)?;
        info!("Saved {} ({} bytes)", saved.path.display(), saved.bytes_written);
        Ok(saved)
    }

    /// Download one resolved queue item, driving its events in the store.
    ///
    /// Returns `Ok(None)` when every route was exhausted: the item reverts to
    /// ready with its bypass affordance raised, and the queue keeps going.
    pub async fn download_queue_item(
        &self,
        store: Arc<QueueStore>,
        id: &str,
    ) -> Result<Option<SavedMedia>, GrabError> {
        let Some(item) = store.get(id) else {
            return Ok(None);
        };
        let Some(descriptor) = item.descriptor() else {
            return Err(GrabError::NoMediaUrl);
        };

        store.apply(id, QueueEvent::DownloadStarted);
        tokio::spawn(run_watchdog(
            store.clone(),
            id.to_string(),
            self.downloader.watchdog_delay(),
        ));

        let progress_store = store.clone();
        let progress_id = id.to_string();
        let on_progress: Arc<dyn Fn(u8) + Send + Sync> = Arc::new(move |percent| {
            progress_store.apply(&progress_id, QueueEvent::DownloadProgress(percent));
        });

        match self
            .downloader
            .fetch(&descriptor, self.config.kind, self.config.quality, on_progress)
            .await
        {
            Ok(fetched) => {
                let saved = self.save_bytes(&fetched.bytes, self.config.kind, fetched.quality)?;
                self.record(&descriptor, saved.quality)?;
                store.apply(id, QueueEvent::DownloadCompleted);
                Ok(Some(saved))
            }
            Err(e) if e.needs_bypass() => {
                warn!("Routes exhausted for {}: {}", item.url, e);
                store.apply(id, QueueEvent::DownloadExhausted);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Download every ready queue item in order, containing failures.
    ///
    /// One item's failure (including local ones like an unwritable output
    /// directory) marks that item failed and moves on; siblings are always
    /// attempted. Returns the number of completed downloads.
    pub async fn download_ready(&self, store: Arc<QueueStore>) -> usize {
        let ready: Vec<String> = store
            .snapshot()
            .iter()
            .filter(|it| it.status == crate::core::queue::ItemStatus::Ready)
            .map(|it| it.id.clone())
            .collect();

        let mut completed = 0;
        for id in &ready {
            match self.download_queue_item(store.clone(), id).await {
                Ok(Some(_)) => completed += 1,
                Ok(None) => {}
                Err(e) => {
                    warn!("Download failed for item {}: {}", id, e);
                    store.apply(id, QueueEvent::DownloadFailed(e.to_string()));
                }
            }
        }
        completed
    }

    /// Most-recent-first history snapshot
    pub fn history(&self) -> Vec<HistoryEntry> {
        self.history.lock().unwrap().entries().to_vec()
    }

    /// Drop the persisted history
    pub fn clear_history(&self) -> Result<(), GrabError> {
        self.history.lock().unwrap().clear()
    }

    fn save_bytes(
        &self,
        bytes: &[u8],
        kind: MediaKind,
        quality: Option<Quality>,
    ) -> Result<SavedMedia, GrabError> {
        std::fs::create_dir_all(&self.config.output_dir)?;
        let filename = unique_filename(&self.config.output_dir, &output_filename(kind));
        let path = self.config.output_dir.join(filename);
        std::fs::write(&path, bytes)?;
        Ok(SavedMedia {
            path,
            bytes_written: bytes.len(),
            quality,
        })
    }

    fn record(
        &self,
        descriptor: &MediaDescriptor,
        quality: Option<Quality>,
    ) -> Result<(), GrabError> {
        self.history
            .lock()
            .unwrap()
            .append(HistoryEntry::from_download(
                descriptor,
                self.config.kind,
                quality,
            ))
    }
}
