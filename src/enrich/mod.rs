//! Best-effort AI enrichment and the chat assistant
//!
//! Enrichment rides on a generative-text REST endpoint. Annotation is strictly
//! best-effort: any failure (missing key, HTTP error, malformed payload)
//! degrades to no annotation and never blocks a resolution or download.

use crate::core::descriptor::AiAnnotation;
use crate::error::GrabError;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

/// Environment variable holding the enrichment API key
pub const API_KEY_VAR: &str = "TTGRAB_API_KEY";

/// Deadline for one enrichment request; a slow endpoint degrades to no
/// annotation instead of stalling the caller
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

const DEFAULT_ENDPOINT: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent";

/// One prior turn of the assistant conversation
#[derive(Debug, Clone)]
pub struct ChatTurn {
    /// "user" or "model"
    pub role: &'static str,
    pub text: String,
}

impl ChatTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: "user",
            text: text.into(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: "model",
            text: text.into(),
        }
    }
}

/// Annotation payload as the model returns it
#[derive(Deserialize)]
struct AnnotationPayload {
    tags: Vec<String>,
    #[serde(rename = "viralScore")]
    viral_score: u8,
    summary: String,
}

/// Client for the generative-text endpoint
pub struct Enricher {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl Enricher {
    /// Build a client keyed from the environment; unkeyed clients still
    /// construct but never produce annotations
    pub fn from_env() -> Self {
        Self::new(std::env::var(API_KEY_VAR).ok())
    }

    pub fn new(api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key,
            timeout: REQUEST_TIMEOUT,
        }
    }

    /// Override the endpoint, e.g. to point at a mock server
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Override the per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.api_key.is_some()
    }

    /// Annotate a resolved media with tags, a viral score and a summary.
    ///
    /// Never fails: all errors collapse to `None`.
    pub async fn annotate(&self, title: &str, author: &str) -> Option<AiAnnotation> {
        let prompt = format!(
            "Analyze this TikTok video. Title: \"{}\". Creator: \"{}\". \
             Respond with JSON only: {{\"tags\": [3 related hashtags], \
             \"viralScore\": number 0-100, \"summary\": one sentence}}.",
            title, author
        );

        match self.generate(&[ChatTurn::user(prompt)]).await {
            Ok(text) => match parse_annotation(&text) {
                Some(annotation) => Some(annotation),
                None => {
                    debug!("Annotation payload was not parseable");
                    None
                }
            },
            Err(e) => {
                debug!("Annotation skipped: {}", e);
                None
            }
        }
    }

    /// One assistant reply for the given conversation so far
    pub async fn assistant(&self, history: &[ChatTurn], message: &str) -> Result<String, GrabError> {
        let mut turns: Vec<ChatTurn> = history.to_vec();
        turns.push(ChatTurn::user(message));
        self.generate(&turns).await
    }

    async fn generate(&self, turns: &[ChatTurn]) -> Result<String, GrabError> {
        let key = self
            .api_key
            .as_deref()
            .ok_or_else(|| GrabError::Enrichment(format!("{} is not set", API_KEY_VAR)))?;

        let contents: Vec<Value> = turns
            .iter()
            .map(|turn| json!({ "role": turn.role, "parts": [{ "text": turn.text }] }))
            .collect();

        let response = self
            .client
            .post(format!("{}?key={}", self.endpoint, key))
            .timeout(self.timeout)
            .json(&json!({ "contents": contents }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(GrabError::Enrichment(format!(
                "endpoint returned status {}",
                response.status()
            )));
        }

        let body: Value = response.json().await?;
        body.pointer("/candidates/0/content/parts/0/text")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| GrabError::Enrichment("response had no text candidate".to_string()))
    }
}

/// Pull the annotation out of the model text, tolerating code fences
fn parse_annotation(text: &str) -> Option<AiAnnotation> {
    let trimmed = text
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();

    let payload: AnnotationPayload = serde_json::from_str(trimmed).ok()?;
    Some(AiAnnotation {
        tags: payload.tags,
        viral_score: payload.viral_score.min(100),
        summary: payload.summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate_body(text: &str) -> String {
        json!({
            "candidates": [
                { "content": { "parts": [{ "text": text }] } }
            ]
        })
        .to_string()
    }

    #[test]
    fn test_parse_annotation_plain_and_fenced() {
        let raw = r##"{"tags": ["#fyp"], "viralScore": 88, "summary": "A clip."}"##;
        let plain = parse_annotation(raw).unwrap();
        assert_eq!(plain.tags, vec!["#fyp"]);
        assert_eq!(plain.viral_score, 88);

        let fenced = format!("```json\n{}\n```", raw);
        assert!(parse_annotation(&fenced).is_some());

        assert!(parse_annotation("not json at all").is_none());
    }

    #[tokio::test]
    async fn test_annotate_success() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", "/generate")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(candidate_body(
                r##"{"tags": ["#dance", "#fyp"], "viralScore": 72, "summary": "Dance clip."}"##,
            ))
            .create_async()
            .await;

        let enricher = Enricher::new(Some("test-key".to_string()))
            .with_endpoint(format!("{}/generate", server.url()));

        let annotation = enricher.annotate("Dance", "creator").await.unwrap();
        assert_eq!(annotation.tags.len(), 2);
        assert_eq!(annotation.viral_score, 72);
        assert_eq!(annotation.summary, "Dance clip.");
    }

    #[tokio::test]
    async fn test_annotate_server_error_degrades_to_none() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", "/generate")
            .match_query(mockito::Matcher::Any)
            .with_status(500)
            .create_async()
            .await;

        let enricher = Enricher::new(Some("test-key".to_string()))
            .with_endpoint(format!("{}/generate", server.url()));

        assert!(enricher.annotate("Dance", "creator").await.is_none());
    }

    #[tokio::test]
    async fn test_annotate_unresponsive_endpoint_degrades_to_none() {
        // Accepts the connection but never answers; the request deadline has
        // to fire so the caller is not stalled behind enrichment.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            loop {
                if let Ok((socket, _)) = listener.accept().await {
                    held.push(socket);
                }
            }
        });

        let enricher = Enricher::new(Some("test-key".to_string()))
            .with_endpoint(format!("http://{}/generate", addr))
            .with_timeout(Duration::from_millis(100));

        let started = std::time::Instant::now();
        assert!(enricher.annotate("Dance", "creator").await.is_none());
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_annotate_without_key_skips_network() {
        let enricher = Enricher::new(None);
        assert!(!enricher.is_enabled());
        assert!(enricher.annotate("Dance", "creator").await.is_none());
    }

    #[tokio::test]
    async fn test_assistant_round_trip() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", "/generate")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(candidate_body("Paste the link and pick a quality."))
            .create_async()
            .await;

        let enricher = Enricher::new(Some("test-key".to_string()))
            .with_endpoint(format!("{}/generate", server.url()));

        let history = vec![ChatTurn::user("hi"), ChatTurn::model("Hello!")];
        let reply = enricher
            .assistant(&history, "how do I download?")
            .await
            .unwrap();
        assert_eq!(reply, "Paste the link and pick a quality.");
    }

    #[tokio::test]
    async fn test_assistant_without_key_errors() {
        let enricher = Enricher::new(None);
        let err = enricher.assistant(&[], "hello").await.unwrap_err();
        assert!(matches!(err, GrabError::Enrichment(_)));
    }
}
