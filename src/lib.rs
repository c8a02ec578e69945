//! # ttgrab - TikTok Downloader
//!
//! Watermark-free TikTok downloader written in Rust.
//!
//! ## Features
//!
//! - Multi-provider extraction with ordered fallback
//! - Bulk mode with bounded concurrency and per-item status tracking
//! - Streaming downloads with progress through a chain of relay transports
//! - Manual-bypass fallback when every automated route is blocked
//! - Optional AI annotation of resolved videos
//! - Bounded, persisted download history
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use ttgrab::{Session, SessionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let session = Session::new(SessionConfig::default());
//!
//!     let descriptor = session
//!         .resolve_single("https://www.tiktok.com/@user/video/123")
//!         .await?;
//!     let saved = session
//!         .download_single(&descriptor, Arc::new(|_percent| {}))
//!         .await?;
//!     println!("Saved: {}", saved.path.display());
//!
//!     Ok(())
//! }
//! ```

pub mod batch;
pub mod cli;
pub mod core;
pub mod download;
pub mod enrich;
pub mod error;
pub mod fallback;
pub mod resolve;
pub mod utils;

// Re-export main types
pub use crate::core::{
    HistoryEntry, HistoryLog, ItemStatus, MediaDescriptor, MediaKind, Quality, QueueEvent,
    QueueItem, QueueStore, SavedMedia, Session, SessionConfig,
};
pub use error::GrabError;

/// Result type alias for ttgrab operations
pub type Result<T> = std::result::Result<T, GrabError>;
