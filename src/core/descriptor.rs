//! Resolved media structures

use serde::{Deserialize, Serialize};

/// Media kind selectable for download
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Video,
    Audio,
}

impl MediaKind {
    /// File extension for the saved payload
    pub fn extension(&self) -> &'static str {
        match self {
            MediaKind::Video => "mp4",
            MediaKind::Audio => "mp3",
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaKind::Video => write!(f, "video"),
            MediaKind::Audio => write!(f, "audio"),
        }
    }
}

/// Closed quality ordering: `Hd > Hd720 > Sd`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    Sd,
    #[serde(rename = "720p")]
    Hd720,
    Hd,
}

impl Quality {
    /// Waterfall order for a requested quality: best at or below it
    pub fn fallback_chain(self) -> &'static [Quality] {
        match self {
            Quality::Hd => &[Quality::Hd, Quality::Hd720, Quality::Sd],
            Quality::Hd720 => &[Quality::Hd720, Quality::Sd],
            Quality::Sd => &[Quality::Sd],
        }
    }
}

impl std::fmt::Display for Quality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Quality::Sd => write!(f, "sd"),
            Quality::Hd720 => write!(f, "720p"),
            Quality::Hd => write!(f, "hd"),
        }
    }
}

/// Engagement counters, preserved as the literal strings the provider sent.
///
/// One provider supplies formatted numbers, another the literal "N/A"; no
/// numeric coercion happens downstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Engagement {
    pub likes: String,
    pub comments: String,
    pub shares: String,
}

impl Engagement {
    /// Counters a provider does not supply
    pub fn unavailable() -> Self {
        Self {
            likes: "N/A".to_string(),
            comments: "N/A".to_string(),
            shares: "N/A".to_string(),
        }
    }
}

/// Optional AI-generated annotation attached after resolution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiAnnotation {
    /// Related hashtags
    pub tags: Vec<String>,
    /// Popularity score, 0-100
    pub viral_score: u8,
    /// One summary sentence
    pub summary: String,
}

/// Raw normalized output of a single provider's parser
#[derive(Debug, Clone)]
pub struct RawMedia {
    pub title: String,
    pub author: String,
    pub cover: String,
    pub video_url: String,
    pub hd_video_url: Option<String>,
    pub music_url: Option<String>,
    pub stats: Engagement,
}

/// Result of a successful resolution.
///
/// Only constructible with a playable primary media URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaDescriptor {
    /// Opaque identity
    pub id: String,
    pub title: String,
    /// Author handle/nickname
    pub author: String,
    /// Cover image reference
    pub cover: String,
    /// Standard-quality direct media URL
    pub sd_url: String,
    /// 720p direct media URL, when the provider supplies one
    pub hd720_url: Option<String>,
    /// Best-quality direct media URL, when the provider supplies one
    pub hd_url: Option<String>,
    /// Separate audio track URL
    pub music_url: Option<String>,
    pub stats: Engagement,
    /// Name of the provider that resolved this media
    pub provider: String,
    /// Best-effort AI annotation; absent when enrichment failed or was skipped
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotation: Option<AiAnnotation>,
}

impl MediaDescriptor {
    /// Build a descriptor from a provider's normalized output.
    ///
    /// Returns `None` when the primary media URL is empty, upholding the
    /// invariant that a descriptor always has at least one playable URL.
    pub fn from_provider(raw: RawMedia, provider: &str) -> Option<Self> {
        if raw.video_url.trim().is_empty() {
            return None;
        }

        let non_empty = |u: Option<String>| u.filter(|s| !s.trim().is_empty());

        Some(Self {
            id: format!("media-{}", chrono::Utc::now().timestamp_millis()),
            title: raw.title,
            author: raw.author,
            cover: raw.cover,
            sd_url: raw.video_url,
            hd720_url: non_empty(raw.hd_video_url.clone()),
            hd_url: non_empty(raw.hd_video_url),
            music_url: non_empty(raw.music_url),
            stats: raw.stats,
            provider: provider.to_string(),
            annotation: None,
        })
    }

    /// URL present at exactly the given quality, if any
    pub fn url_at(&self, quality: Quality) -> Option<&str> {
        match quality {
            Quality::Hd => self.hd_url.as_deref(),
            Quality::Hd720 => self.hd720_url.as_deref(),
            Quality::Sd => Some(self.sd_url.as_str()),
        }
    }

    /// Ordered download candidates for the requested kind and quality.
    ///
    /// For video this is the quality waterfall (best at or below the request,
    /// absent rungs skipped); for audio it is the track URL alone, or nothing.
    /// Adjacent rungs sharing one URL collapse into the higher rung, so a
    /// blocked URL is never retried through the full transport chain twice.
    pub fn candidates(&self, kind: MediaKind, quality: Quality) -> Vec<(Option<Quality>, String)> {
        match kind {
            MediaKind::Audio => self
                .music_url
                .iter()
                .map(|u| (None, u.clone()))
                .collect(),
            MediaKind::Video => {
                let mut candidates: Vec<(Option<Quality>, String)> = quality
                    .fallback_chain()
                    .iter()
                    .filter_map(|q| self.url_at(*q).map(|u| (Some(*q), u.to_string())))
                    .collect();
                candidates.dedup_by(|next, kept| next.1 == kept.1);
                candidates
            }
        }
    }

    /// The single best-known direct URL surfaced on the manual-bypass path
    pub fn bypass_url(&self, kind: MediaKind) -> &str {
        match kind {
            MediaKind::Audio => self.music_url.as_deref().unwrap_or(&self.sd_url),
            MediaKind::Video => &self.sd_url,
        }
    }
}
