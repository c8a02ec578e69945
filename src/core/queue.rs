//! Bulk queue state machine and shared store

use crate::core::descriptor::{Engagement, MediaDescriptor};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

/// Lifecycle status of a queue item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Pending,
    Analyzing,
    Ready,
    Downloading,
    Completed,
    Failed,
}

/// One deduplicated input URL in bulk mode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueItem {
    /// Opaque identity
    pub id: String,
    /// Source page URL
    pub url: String,
    pub status: ItemStatus,
    /// Download progress percent; meaningful only while downloading
    pub progress: u8,
    pub title: Option<String>,
    pub cover: Option<String>,
    pub author: Option<String>,
    pub sd_url: Option<String>,
    pub hd720_url: Option<String>,
    pub hd_url: Option<String>,
    pub music_url: Option<String>,
    /// Last failure reason
    pub error: Option<String>,
    /// Whether the manual-bypass affordance should be shown
    pub show_bypass: bool,
}

impl QueueItem {
    /// Create a fresh pending item
    pub fn new(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            status: ItemStatus::Pending,
            progress: 0,
            title: None,
            cover: None,
            author: None,
            sd_url: None,
            hd720_url: None,
            hd_url: None,
            music_url: None,
            error: None,
            show_bypass: false,
        }
    }

    /// Rebuild a descriptor from the resolved fields, once ready
    pub fn descriptor(&self) -> Option<MediaDescriptor> {
        let sd_url = self.sd_url.clone().or_else(|| self.hd_url.clone())?;
        Some(MediaDescriptor {
            id: self.id.clone(),
            title: self.title.clone().unwrap_or_default(),
            author: self.author.clone().unwrap_or_default(),
            cover: self.cover.clone().unwrap_or_default(),
            sd_url,
            hd720_url: self.hd720_url.clone(),
            hd_url: self.hd_url.clone(),
            music_url: self.music_url.clone(),
            stats: Engagement::unavailable(),
            provider: String::new(),
            annotation: None,
        })
    }
}

/// Resolved fields carried by a successful resolution event
#[derive(Debug, Clone)]
pub struct ResolvedFields {
    pub title: String,
    pub cover: String,
    pub author: String,
    pub sd_url: String,
    pub hd720_url: Option<String>,
    pub hd_url: Option<String>,
    pub music_url: Option<String>,
}

impl From<&MediaDescriptor> for ResolvedFields {
    fn from(d: &MediaDescriptor) -> Self {
        Self {
            title: d.title.clone(),
            cover: d.cover.clone(),
            author: d.author.clone(),
            sd_url: d.sd_url.clone(),
            hd720_url: d.hd720_url.clone(),
            hd_url: d.hd_url.clone(),
            music_url: d.music_url.clone(),
        }
    }
}

/// State-machine events applied to a queue item
#[derive(Debug, Clone)]
pub enum QueueEvent {
    /// Item picked up for resolution
    Dispatched,
    /// Provider resolution succeeded with at least one playable URL
    Resolved(ResolvedFields),
    /// Provider resolution failed with a human-readable reason
    ResolveFailed(String),
    /// Download started
    DownloadStarted,
    /// Byte-level progress update
    DownloadProgress(u8),
    /// Download completed and the file was saved
    DownloadCompleted,
    /// Download failed for a local reason (e.g. the file write) with a
    /// human-readable message; a bypass link would not help here
    DownloadFailed(String),
    /// Every quality/transport combination failed; item stays retryable
    DownloadExhausted,
    /// Watchdog fired: progress still zero after the stuck timeout
    StuckDetected,
}

/// Pure reducer: `(item, event) -> item`.
///
/// Invariants enforced here: progress is non-zero only while downloading, and
/// `show_bypass` is set only by the watchdog or a terminal download failure.
pub fn reduce(mut item: QueueItem, event: QueueEvent) -> QueueItem {
    match event {
        QueueEvent::Dispatched => {
            item.status = ItemStatus::Analyzing;
            item.error = None;
            item.show_bypass = false;
            item.progress = 0;
        }
        QueueEvent::Resolved(fields) => {
            item.status = ItemStatus::Ready;
            item.title = Some(fields.title);
            item.cover = Some(fields.cover);
            item.author = Some(fields.author);
            item.sd_url = Some(fields.sd_url);
            item.hd720_url = fields.hd720_url;
            item.hd_url = fields.hd_url;
            item.music_url = fields.music_url;
        }
        QueueEvent::ResolveFailed(reason) => {
            item.status = ItemStatus::Failed;
            item.error = Some(reason);
            item.progress = 0;
        }
        QueueEvent::DownloadStarted => {
            item.status = ItemStatus::Downloading;
            item.progress = 0;
        }
        QueueEvent::DownloadProgress(percent) => {
            if item.status == ItemStatus::Downloading {
                item.progress = percent.min(100);
            }
        }
        QueueEvent::DownloadCompleted => {
            item.status = ItemStatus::Completed;
            item.progress = 100;
        }
        QueueEvent::DownloadFailed(reason) => {
            item.status = ItemStatus::Failed;
            item.error = Some(reason);
            item.progress = 0;
        }
        QueueEvent::DownloadExhausted => {
            // Back to ready so the item can be retried later.
            item.status = ItemStatus::Ready;
            item.show_bypass = true;
            item.progress = 0;
        }
        QueueEvent::StuckDetected => {
            if item.status == ItemStatus::Downloading && item.progress == 0 {
                item.show_bypass = true;
            }
        }
    }
    item
}

/// Callback invoked with the full collection after every change
pub type StoreObserver = dyn Fn(&[QueueItem]) + Send + Sync;

/// Owned store for the bulk queue.
///
/// Every update is an atomic whole-collection replace keyed by item identity,
/// so concurrent completions never clobber each other's unrelated fields.
#[derive(Default)]
pub struct QueueStore {
    items: Mutex<Vec<QueueItem>>,
    observer: Mutex<Option<Arc<StoreObserver>>>,
}

impl QueueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer notified after every change
    pub fn observe(&self, observer: Arc<StoreObserver>) {
        *self.observer.lock().unwrap() = Some(observer);
    }

    /// Replace the whole collection
    pub fn seed(&self, items: Vec<QueueItem>) {
        {
            let mut guard = self.items.lock().unwrap();
            *guard = items;
        }
        self.notify();
    }

    /// Apply an event to the item with the given id.
    ///
    /// A missing id is a no-op: a removed item stops receiving updates.
    pub fn apply(&self, id: &str, event: QueueEvent) {
        {
            let mut guard = self.items.lock().unwrap();
            let next: Vec<QueueItem> = guard
                .iter()
                .map(|it| {
                    if it.id == id {
                        reduce(it.clone(), event.clone())
                    } else {
                        it.clone()
                    }
                })
                .collect();
            *guard = next;
        }
        self.notify();
    }

    /// Remove an item immediately; in-flight work for it becomes a no-op
    pub fn remove(&self, id: &str) {
        {
            let mut guard = self.items.lock().unwrap();
            guard.retain(|it| it.id != id);
        }
        self.notify();
    }

    /// Snapshot of the current collection
    pub fn snapshot(&self) -> Vec<QueueItem> {
        self.items.lock().unwrap().clone()
    }

    /// Look up a single item by id
    pub fn get(&self, id: &str) -> Option<QueueItem> {
        self.items.lock().unwrap().iter().find(|it| it.id == id).cloned()
    }

    fn notify(&self) {
        let observer = self.observer.lock().unwrap().clone();
        if let Some(observer) = observer {
            let snapshot = self.items.lock().unwrap().clone();
            observer(&snapshot);
        }
    }
}
