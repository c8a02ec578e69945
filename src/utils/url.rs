//! URL utilities for validating and extracting TikTok links

use regex::Regex;
use std::sync::LazyLock;
use url::Url;

/// Substring marker used when sifting links out of pasted free text
const PLATFORM_MARKER: &str = "tiktok.com";

static SEPARATOR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\s,]+").unwrap());

/// Check if URL points at the supported platform
pub fn is_platform_url(url: &str) -> bool {
    if let Ok(parsed) = Url::parse(url) {
        if let Some(host) = parsed.host_str() {
            let host = host.to_lowercase();
            return host == PLATFORM_MARKER || host.ends_with(".tiktok.com");
        }
    }
    false
}

/// Split pasted text on whitespace/commas and keep platform links.
///
/// Deliberately permissive (marker match, not full parse) so that the
/// duplicate accounting matches what the user actually pasted; strict
/// validation happens again before any network call.
pub fn extract_links(raw: &str) -> Vec<String> {
    SEPARATOR_RE
        .split(raw)
        .filter(|piece| !piece.is_empty() && piece.contains(PLATFORM_MARKER))
        .map(|piece| piece.to_string())
        .collect()
}

/// Extract the creator handle from an `@handle` string or a profile URL
pub fn extract_handle(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }

    let handle = if let Some(at) = trimmed.split('@').nth(1) {
        at.split('/').next().unwrap_or(at)
    } else {
        trimmed
    };

    if handle.is_empty() {
        None
    } else {
        Some(handle.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_platform_url() {
        assert!(is_platform_url("https://www.tiktok.com/@user/video/123"));
        assert!(is_platform_url("https://tiktok.com/@user/video/123"));
        assert!(is_platform_url("https://vt.tiktok.com/ZS8abc/"));
        assert!(!is_platform_url("https://example.com/video/123"));
        assert!(!is_platform_url("https://notiktok.community/x"));
        assert!(!is_platform_url("not-a-url"));
        assert!(!is_platform_url(""));
    }

    #[test]
    fn test_extract_links() {
        let raw = "https://www.tiktok.com/@a/video/1\nhttps://www.tiktok.com/@b/video/2, https://example.com/c";
        let links = extract_links(raw);
        assert_eq!(
            links,
            vec![
                "https://www.tiktok.com/@a/video/1".to_string(),
                "https://www.tiktok.com/@b/video/2".to_string(),
            ]
        );
    }

    #[test]
    fn test_extract_links_empty_and_noise() {
        assert!(extract_links("").is_empty());
        assert!(extract_links("hello world, nothing here").is_empty());
        assert_eq!(
            extract_links("  ,, https://tiktok.com/@a/video/9  ,").len(),
            1
        );
    }

    #[test]
    fn test_extract_handle() {
        assert_eq!(extract_handle("@creator"), Some("creator".to_string()));
        assert_eq!(
            extract_handle("https://www.tiktok.com/@creator/video/1"),
            Some("creator".to_string())
        );
        assert_eq!(extract_handle("creator"), Some("creator".to_string()));
        assert_eq!(extract_handle(""), None);
        assert_eq!(extract_handle("@"), None);
    }
}
