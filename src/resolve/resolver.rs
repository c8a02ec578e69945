//! Resolution of a source page URL into a media descriptor

use crate::core::descriptor::MediaDescriptor;
use crate::download::waterfall::first_success;
use crate::error::GrabError;
use crate::resolve::providers::{default_providers, Provider};
use crate::utils::url::is_platform_url;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

/// Per-provider request deadline
pub const PROVIDER_TIMEOUT: Duration = Duration::from_secs(8);

/// Turns a source page URL into a normalized media descriptor
#[async_trait]
pub trait Resolve: Send + Sync {
    async fn resolve(&self, url: &str) -> Result<MediaDescriptor, GrabError>;
}

/// Resolver backed by the ordered provider waterfall
pub struct ProviderResolver {
    client: reqwest::Client,
    providers: Vec<Box<dyn Provider>>,
    channel_endpoint: String,
    timeout: Duration,
}

impl ProviderResolver {
    pub fn new() -> Self {
        Self::with_providers(default_providers())
    }

    /// Build a resolver over an explicit provider list
    pub fn with_providers(providers: Vec<Box<dyn Provider>>) -> Self {
        Self {
            client: reqwest::Client::new(),
            providers,
            channel_endpoint: "https://www.tikwm.com/api/user/posts".to_string(),
            timeout: PROVIDER_TIMEOUT,
        }
    }

    /// Override the per-provider timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override the channel listing endpoint, e.g. to point at a mock server
    pub fn with_channel_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.channel_endpoint = endpoint.into();
        self
    }

    async fn resolve_with(
        &self,
        provider: &dyn Provider,
        url: &str,
    ) -> Result<MediaDescriptor, GrabError> {
        debug!("Trying provider {}", provider.name());

        let response = self
            .client
            .get(provider.request_url(url))
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GrabError::Timeout(provider.name().to_string())
                } else {
                    GrabError::Http(e)
                }
            })?;

        let body: Value = response.json().await?;
        let raw = provider
            .parse(&body)
            .ok_or_else(|| GrabError::Generic(format!("{} returned no payload", provider.name())))?;

        MediaDescriptor::from_provider(raw, provider.name())
            .ok_or_else(|| GrabError::Generic(format!("{} payload had no video URL", provider.name())))
    }

    /// List recent post URLs for a creator handle.
    ///
    /// Uses the primary provider's channel surface; the listing shares the
    /// resolver's timeout but not its waterfall, there is only one source.
    pub async fn list_channel(&self, handle: &str, count: usize) -> Result<Vec<String>, GrabError> {
        let request_url = format!(
            "{}?unique_id={}&count={}",
            self.channel_endpoint,
            urlencoding::encode(handle),
            count
        );

        let body: Value = self
            .client
            .get(request_url)
            .timeout(self.timeout)
            .send()
            .await?
            .json()
            .await?;

        if body.get("code").and_then(Value::as_i64) != Some(0) {
            return Err(GrabError::Generic(format!(
                "channel listing failed for @{}",
                handle
            )));
        }

        let videos = body
            .pointer("/data/videos")
            .and_then(Value::as_array)
            .ok_or_else(|| GrabError::Generic("channel listing had no videos".to_string()))?;

        let urls = videos
            .iter()
            .filter_map(|video| {
                let id = video.get("video_id").and_then(Value::as_str)?;
                let author = video
                    .pointer("/author/unique_id")
                    .and_then(Value::as_str)
                    .unwrap_or(handle);
                Some(format!("https://www.tiktok.com/@{}/video/{}", author, id))
            })
            .collect();

        Ok(urls)
    }
}

impl Default for ProviderResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Resolve for ProviderResolver {
    async fn resolve(&self, url: &str) -> Result<MediaDescriptor, GrabError> {
        // Reject before spending any network budget.
        if !is_platform_url(url) {
            return Err(GrabError::InvalidUrl(url.to_string()));
        }

        info!("Resolving {}", url);

        let providers: Vec<&dyn Provider> =
            self.providers.iter().map(|p| p.as_ref()).collect();

        first_success("provider", providers, |provider| async move {
            self.resolve_with(provider, url).await
        })
        .await
        .map_err(|_| GrabError::AllSourcesFailed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::descriptor::Quality;
    use crate::resolve::providers::{TikwmProvider, VtikProvider};
    use serde_json::json;

    fn tikwm_body() -> String {
        json!({
            "code": 0,
            "data": {
                "title": "Clip",
                "author": { "nickname": "creator" },
                "cover": "https://cdn/c.jpg",
                "play": "https://cdn/sd.mp4",
                "hdplay": "https://cdn/hd.mp4",
                "music": "https://cdn/a.mp3",
                "digg_count": 10,
                "comment_count": 2,
                "share_count": 1
            }
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_rejects_foreign_url_before_any_request() {
        let resolver = ProviderResolver::new();
        let err = resolver
            .resolve("https://example.com/watch?v=1")
            .await
            .unwrap_err();
        assert!(matches!(err, GrabError::InvalidUrl(_)));
    }

    #[tokio::test]
    async fn test_primary_success_short_circuits_secondary() {
        let mut server = mockito::Server::new_async().await;
        let primary = server
            .mock("GET", "/tikwm/")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(tikwm_body())
            .create_async()
            .await;
        let secondary = server
            .mock("GET", "/vtik")
            .match_query(mockito::Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let resolver = ProviderResolver::with_providers(vec![
            Box::new(TikwmProvider::with_endpoint(format!("{}/tikwm/", server.url()))),
            Box::new(VtikProvider::with_endpoint(format!("{}/vtik?url=", server.url()))),
        ]);

        let descriptor = resolver
            .resolve("https://www.tiktok.com/@a/video/1")
            .await
            .unwrap();

        assert_eq!(descriptor.provider, "TikWM Core");
        assert_eq!(descriptor.title, "Clip");
        assert_eq!(descriptor.url_at(Quality::Hd).as_deref(), Some("https://cdn/hd.mp4"));
        primary.assert_async().await;
        secondary.assert_async().await;
    }

    #[tokio::test]
    async fn test_secondary_takes_over_after_primary_failure() {
        let mut server = mockito::Server::new_async().await;
        let _primary = server
            .mock("GET", "/tikwm/")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(json!({ "code": -1, "msg": "rate limited" }).to_string())
            .create_async()
            .await;
        let secondary = server
            .mock("GET", "/vtik")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(
                json!({
                    "status": "success",
                    "data": {
                        "description": "Backup clip",
                        "author": { "nickname": "creator" },
                        "video_url": "https://cdn/v.mp4"
                    }
                })
                .to_string(),
            )
            .create_async()
            .await;

        let resolver = ProviderResolver::with_providers(vec![
            Box::new(TikwmProvider::with_endpoint(format!("{}/tikwm/", server.url()))),
            Box::new(VtikProvider::with_endpoint(format!("{}/vtik?url=", server.url()))),
        ]);

        let descriptor = resolver
            .resolve("https://www.tiktok.com/@a/video/1")
            .await
            .unwrap();

        assert_eq!(descriptor.provider, "V-Tik Node");
        assert_eq!(descriptor.title, "Backup clip");
        assert_eq!(descriptor.stats.likes, "N/A");
        secondary.assert_async().await;
    }

    #[tokio::test]
    async fn test_all_providers_failing_maps_to_all_sources_failed() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/tikwm/")
            .match_query(mockito::Matcher::Any)
            .with_status(500)
            .create_async()
            .await;

        let resolver = ProviderResolver::with_providers(vec![Box::new(
            TikwmProvider::with_endpoint(format!("{}/tikwm/", server.url())),
        )]);

        let err = resolver
            .resolve("https://www.tiktok.com/@a/video/1")
            .await
            .unwrap_err();
        assert!(matches!(err, GrabError::AllSourcesFailed));
    }

    #[tokio::test]
    async fn test_channel_listing_builds_post_urls() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/posts")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(
                json!({
                    "code": 0,
                    "data": {
                        "videos": [
                            { "video_id": "111", "author": { "unique_id": "creator" } },
                            { "video_id": "222", "author": { "unique_id": "creator" } }
                        ]
                    }
                })
                .to_string(),
            )
            .create_async()
            .await;

        let resolver = ProviderResolver::new()
            .with_channel_endpoint(format!("{}/posts", server.url()));

        let urls = resolver.list_channel("creator", 10).await.unwrap();
        assert_eq!(
            urls,
            vec![
                "https://www.tiktok.com/@creator/video/111".to_string(),
                "https://www.tiktok.com/@creator/video/222".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_channel_listing_error_code() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/posts")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(json!({ "code": -1 }).to_string())
            .create_async()
            .await;

        let resolver = ProviderResolver::new()
            .with_channel_endpoint(format!("{}/posts", server.url()));

        assert!(resolver.list_channel("nobody", 10).await.is_err());
    }
}
