//! Error types for ttgrab

use thiserror::Error;

/// Main error type for ttgrab operations
#[derive(Debug, Error)]
pub enum GrabError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("No platform links found in input")]
    NoLinksFound,

    #[error("Multiple links pasted in single mode, use --bulk")]
    MultipleLinks,

    #[error("All extraction sources failed")]
    AllSourcesFailed,

    #[error("No usable media URL for the requested kind")]
    NoMediaUrl,

    #[error("All download routes exhausted: {last}")]
    Exhausted { last: String },

    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Enrichment unavailable: {0}")]
    Enrichment(String),

    #[error("Generic error: {0}")]
    Generic(String),
}

impl GrabError {
    /// Check if the failure is fatal to the current user action.
    ///
    /// Everything else degrades to a retry or manual-bypass affordance.
    pub fn is_fatal_input(&self) -> bool {
        matches!(
            self,
            GrabError::InvalidUrl(_) | GrabError::NoLinksFound | GrabError::MultipleLinks
        )
    }

    /// Check if the failure should surface the manual-bypass path
    pub fn needs_bypass(&self) -> bool {
        matches!(self, GrabError::Exhausted { .. } | GrabError::NoMediaUrl)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_input_errors() {
        assert!(GrabError::InvalidUrl("x".to_string()).is_fatal_input());
        assert!(GrabError::NoLinksFound.is_fatal_input());
        assert!(GrabError::MultipleLinks.is_fatal_input());
        assert!(!GrabError::AllSourcesFailed.is_fatal_input());
        assert!(!GrabError::Exhausted {
            last: "x".to_string()
        }
        .is_fatal_input());
    }

    #[test]
    fn test_needs_bypass() {
        assert!(GrabError::Exhausted {
            last: "blocked".to_string()
        }
        .needs_bypass());
        assert!(GrabError::NoMediaUrl.needs_bypass());
        assert!(!GrabError::AllSourcesFailed.needs_bypass());
    }
}
