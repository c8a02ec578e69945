//! Extraction providers and their schema normalizers
//!
//! Providers are not interchangeable in schema: adding one means adding both
//! an endpoint and a parser. Each provider owns exactly one normalization
//! function from its response shape to [`RawMedia`].

use crate::core::descriptor::{Engagement, RawMedia};
use serde_json::Value;

/// One extraction provider: an endpoint plus its response normalizer
pub trait Provider: Send + Sync {
    /// Display name for logs and descriptors
    fn name(&self) -> &'static str;

    /// Endpoint base URL
    fn endpoint(&self) -> &str;

    /// Normalize the provider's JSON response; `None` when unusable
    fn parse(&self, response: &Value) -> Option<RawMedia>;

    /// Full request URL for a source page URL
    fn request_url(&self, source_url: &str) -> String {
        let encoded = urlencoding::encode(source_url);
        if self.endpoint().contains("?url=") {
            format!("{}{}", self.endpoint(), encoded)
        } else {
            format!("{}?url={}", self.endpoint(), encoded)
        }
    }
}

/// Primary provider: TikWM
pub struct TikwmProvider {
    endpoint: String,
}

impl TikwmProvider {
    pub fn new() -> Self {
        Self::with_endpoint("https://www.tikwm.com/api/")
    }

    /// Override the endpoint, e.g. to point at a mock server
    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }
}

impl Default for TikwmProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl Provider for TikwmProvider {
    fn name(&self) -> &'static str {
        "TikWM Core"
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn parse(&self, response: &Value) -> Option<RawMedia> {
        if response.get("code").and_then(Value::as_i64) != Some(0) {
            return None;
        }
        let data = response.get("data")?;

        let text = |v: Option<&Value>| v.and_then(Value::as_str).map(str::to_string);
        // TikWM counters are numeric; keep them as formatted strings.
        let counter = |key: &str| {
            data.get(key)
                .and_then(Value::as_u64)
                .map(format_count)
                .unwrap_or_else(|| "0".to_string())
        };

        Some(RawMedia {
            title: text(data.get("title")).unwrap_or_else(|| "TikTok Content".to_string()),
            author: text(data.pointer("/author/nickname"))
                .or_else(|| text(data.pointer("/author/unique_id")))
                .unwrap_or_else(|| "Unknown Creator".to_string()),
            cover: text(data.get("cover"))
                .or_else(|| text(data.get("origin_cover")))
                .unwrap_or_default(),
            video_url: text(data.get("play")).unwrap_or_default(),
            hd_video_url: text(data.get("hdplay")).or_else(|| text(data.get("play"))),
            music_url: text(data.get("music")),
            stats: Engagement {
                likes: counter("digg_count"),
                comments: counter("comment_count"),
                shares: counter("share_count"),
            },
        })
    }
}

/// Secondary provider: V-Tik
pub struct VtikProvider {
    endpoint: String,
}

impl VtikProvider {
    pub fn new() -> Self {
        Self::with_endpoint("https://api.v-tik.com/api/video/info?url=")
    }

    /// Override the endpoint, e.g. to point at a mock server
    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }
}

impl Default for VtikProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl Provider for VtikProvider {
    fn name(&self) -> &'static str {
        "V-Tik Node"
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn parse(&self, response: &Value) -> Option<RawMedia> {
        if response.get("status").and_then(Value::as_str) != Some("success") {
            return None;
        }
        let data = response.get("data")?;

        let text = |v: Option<&Value>| v.and_then(Value::as_str).map(str::to_string);

        Some(RawMedia {
            title: text(data.get("description")).unwrap_or_else(|| "TikTok Content".to_string()),
            author: text(data.pointer("/author/nickname")).unwrap_or_else(|| "Creator".to_string()),
            cover: text(data.get("cover_url")).unwrap_or_default(),
            video_url: text(data.get("video_url")).unwrap_or_default(),
            hd_video_url: text(data.get("video_url_hd")).or_else(|| text(data.get("video_url"))),
            music_url: text(data.get("audio_url")),
            // This provider does not supply counters at all.
            stats: Engagement::unavailable(),
        })
    }
}

/// The fixed, ordered provider list used by the resolver
pub fn default_providers() -> Vec<Box<dyn Provider>> {
    vec![
        Box::new(TikwmProvider::new()),
        Box::new(VtikProvider::new()),
    ]
}

/// Group digits with thousands separators, matching what the original
/// provider surface displayed
fn format_count(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1000), "1,000");
        assert_eq!(format_count(1234567), "1,234,567");
    }

    #[test]
    fn test_tikwm_parse_success() {
        let provider = TikwmProvider::new();
        let response = json!({
            "code": 0,
            "data": {
                "title": "Dance clip",
                "author": { "nickname": "creator", "unique_id": "creator_id" },
                "cover": "https://cdn/cover.jpg",
                "play": "https://cdn/play.mp4",
                "hdplay": "https://cdn/hd.mp4",
                "music": "https://cdn/track.mp3",
                "digg_count": 12000,
                "comment_count": 340,
                "share_count": 5
            }
        });

        let raw = provider.parse(&response).unwrap();
        assert_eq!(raw.title, "Dance clip");
        assert_eq!(raw.author, "creator");
        assert_eq!(raw.video_url, "https://cdn/play.mp4");
        assert_eq!(raw.hd_video_url.as_deref(), Some("https://cdn/hd.mp4"));
        assert_eq!(raw.stats.likes, "12,000");
        assert_eq!(raw.stats.comments, "340");
    }

    #[test]
    fn test_tikwm_parse_defaults_and_failure() {
        let provider = TikwmProvider::new();
        assert!(provider.parse(&json!({ "code": -1 })).is_none());
        assert!(provider.parse(&json!({ "code": 0 })).is_none());

        let sparse = provider
            .parse(&json!({ "code": 0, "data": { "play": "https://cdn/p.mp4" } }))
            .unwrap();
        assert_eq!(sparse.title, "TikTok Content");
        assert_eq!(sparse.author, "Unknown Creator");
        assert_eq!(sparse.stats.likes, "0");
        // hdplay absent: the standard URL doubles as the hd candidate.
        assert_eq!(sparse.hd_video_url.as_deref(), Some("https://cdn/p.mp4"));
    }

    #[test]
    fn test_vtik_parse_keeps_literal_na_counters() {
        let provider = VtikProvider::new();
        let response = json!({
            "status": "success",
            "data": {
                "description": "A clip",
                "author": { "nickname": "someone" },
                "cover_url": "https://cdn/c.jpg",
                "video_url": "https://cdn/v.mp4",
                "audio_url": "https://cdn/a.mp3"
            }
        });

        let raw = provider.parse(&response).unwrap();
        assert_eq!(raw.stats.likes, "N/A");
        assert_eq!(raw.stats.comments, "N/A");
        assert_eq!(raw.stats.shares, "N/A");
        assert_eq!(raw.music_url.as_deref(), Some("https://cdn/a.mp3"));
    }

    #[test]
    fn test_vtik_parse_rejects_non_success() {
        let provider = VtikProvider::new();
        assert!(provider.parse(&json!({ "status": "error" })).is_none());
    }

    #[test]
    fn test_request_url_building() {
        let tikwm = TikwmProvider::new();
        assert_eq!(
            tikwm.request_url("https://www.tiktok.com/@a/video/1"),
            "https://www.tikwm.com/api/?url=https%3A%2F%2Fwww.tiktok.com%2F%40a%2Fvideo%2F1"
        );

        let vtik = VtikProvider::new();
        assert!(vtik
            .request_url("https://www.tiktok.com/@a/video/1")
            .starts_with("https://api.v-tik.com/api/video/info?url=https%3A%2F%2F"));
    }

    #[test]
    fn test_default_provider_order() {
        let providers = default_providers();
        assert_eq!(providers.len(), 2);
        assert_eq!(providers[0].name(), "TikWM Core");
        assert_eq!(providers[1].name(), "V-Tik Node");
    }
}
