//! Bounded persisted download history

use crate::core::descriptor::{MediaDescriptor, MediaKind, Quality};
use crate::error::GrabError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::warn;

/// Maximum number of retained entries
pub const HISTORY_CAP: usize = 15;

/// Immutable record of one completed download
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: String,
    pub title: String,
    pub author: String,
    pub cover: String,
    /// Completion time, unix milliseconds
    pub timestamp: i64,
    pub kind: MediaKind,
    /// Quality actually obtained; absent for audio
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<Quality>,
}

impl HistoryEntry {
    /// Materialize an entry from a descriptor and the obtained kind/quality
    pub fn from_download(
        descriptor: &MediaDescriptor,
        kind: MediaKind,
        quality: Option<Quality>,
    ) -> Self {
        Self {
            id: descriptor.id.clone(),
            title: descriptor.title.clone(),
            author: descriptor.author.clone(),
            cover: descriptor.cover.clone(),
            timestamp: chrono::Utc::now().timestamp_millis(),
            kind,
            quality,
        }
    }
}

/// Append-only log of the most recent downloads, persisted as one JSON file.
///
/// Read once at startup; rewritten wholesale on every append or clear.
#[derive(Debug)]
pub struct HistoryLog {
    path: PathBuf,
    entries: Vec<HistoryEntry>,
}

impl HistoryLog {
    /// Load the log from disk; a missing or corrupt file yields an empty log
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!("Discarding unreadable history file: {}", e);
                Vec::new()
            }),
            Err(_) => Vec::new(),
        };
        Self { path, entries }
    }

    /// Default location under the user data directory
    pub fn default_path() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("ttgrab")
            .join("history.json")
    }

    /// Most-recent-first view of the retained entries
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    /// Prepend an entry, enforce the cap, and rewrite the file
    pub fn append(&mut self, entry: HistoryEntry) -> Result<(), GrabError> {
        self.entries.insert(0, entry);
        self.entries.truncate(HISTORY_CAP);
        self.persist()
    }

    /// Drop every entry and remove the backing file
    pub fn clear(&mut self) -> Result<(), GrabError> {
        self.entries.clear();
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
        }
        Ok(())
    }

    fn persist(&self) -> Result<(), GrabError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string(&self.entries)?;
        std::fs::write(&self.path, raw)?;
        Ok(())
    }
}
