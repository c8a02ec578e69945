//! Manual-bypass fallback after download exhaustion
//!
//! When every quality/transport combination has failed, the media is still
//! resolvable in a browser: the prompt carries the best-known direct URL so
//! the user can open it manually. The controller is a tiny state machine the
//! single-item flow drives; bulk items carry the equivalent flag per item.

use crate::core::descriptor::{MediaDescriptor, MediaKind};

/// Everything needed to offer the manual path for one media
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManualPrompt {
    pub title: String,
    pub author: String,
    pub cover: String,
    /// Best-known direct URL to open in a browser
    pub url: String,
    pub kind: MediaKind,
}

impl ManualPrompt {
    /// Build the prompt for an exhausted download
    pub fn for_media(descriptor: &MediaDescriptor, kind: MediaKind) -> Self {
        Self {
            title: descriptor.title.clone(),
            author: descriptor.author.clone(),
            cover: descriptor.cover.clone(),
            url: descriptor.bypass_url(kind).to_string(),
            kind,
        }
    }
}

/// Fallback state for the single-item flow
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FallbackState {
    #[default]
    Idle,
    /// Exhaustion reached; the manual path is on offer
    Prompting(ManualPrompt),
}

/// Drives the manual-bypass prompt lifecycle
#[derive(Debug, Default)]
pub struct FallbackController {
    state: FallbackState,
}

impl FallbackController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record exhaustion and surface the manual prompt
    pub fn exhaust(&mut self, descriptor: &MediaDescriptor, kind: MediaKind) -> &ManualPrompt {
        self.state = FallbackState::Prompting(ManualPrompt::for_media(descriptor, kind));
        match &self.state {
            FallbackState::Prompting(prompt) => prompt,
            FallbackState::Idle => unreachable!(),
        }
    }

    /// Dismiss the prompt without downloading
    pub fn dismiss(&mut self) {
        self.state = FallbackState::Idle;
    }

    /// Current prompt, if exhaustion was reached and not dismissed
    pub fn prompt(&self) -> Option<&ManualPrompt> {
        match &self.state {
            FallbackState::Prompting(prompt) => Some(prompt),
            FallbackState::Idle => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::descriptor::{Engagement, RawMedia};

    fn descriptor(music: Option<&str>) -> MediaDescriptor {
        MediaDescriptor::from_provider(
            RawMedia {
                title: "Clip".to_string(),
                author: "creator".to_string(),
                cover: "https://cdn/c.jpg".to_string(),
                video_url: "https://cdn/sd.mp4".to_string(),
                hd_video_url: Some("https://cdn/hd.mp4".to_string()),
                music_url: music.map(|s| s.to_string()),
                stats: Engagement::unavailable(),
            },
            "test",
        )
        .unwrap()
    }

    #[test]
    fn test_exhaust_surfaces_prompt_with_direct_url() {
        let mut controller = FallbackController::new();
        assert!(controller.prompt().is_none());

        let prompt = controller.exhaust(&descriptor(None), MediaKind::Video);
        assert_eq!(prompt.url, "https://cdn/sd.mp4");
        assert_eq!(prompt.title, "Clip");
        assert!(controller.prompt().is_some());
    }

    #[test]
    fn test_audio_prompt_prefers_track_url() {
        let mut controller = FallbackController::new();
        let prompt = controller.exhaust(&descriptor(Some("https://cdn/a.mp3")), MediaKind::Audio);
        assert_eq!(prompt.url, "https://cdn/a.mp3");
        assert_eq!(prompt.kind, MediaKind::Audio);
    }

    #[test]
    fn test_audio_prompt_without_track_falls_back_to_video() {
        let mut controller = FallbackController::new();
        let prompt = controller.exhaust(&descriptor(None), MediaKind::Audio);
        assert_eq!(prompt.url, "https://cdn/sd.mp4");
    }

    #[test]
    fn test_dismiss_returns_to_idle() {
        let mut controller = FallbackController::new();
        controller.exhaust(&descriptor(None), MediaKind::Video);
        controller.dismiss();
        assert!(controller.prompt().is_none());
    }
}
