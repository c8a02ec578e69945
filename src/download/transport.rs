//! Transport strategies for fetching media bytes
//!
//! Resolution providers hand back CDN URLs that frequently refuse direct
//! fetches; the relay transports proxy the response bytes through a public
//! endpoint that accepts a percent-encoded absolute URL.

/// One way of reaching a media URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transport {
    /// Plain fetch of the URL itself
    Direct,
    /// Relay endpoint prefixed to the percent-encoded target URL
    Relay {
        name: &'static str,
        prefix: String,
    },
}

impl Transport {
    /// Display name for logs
    pub fn name(&self) -> &'static str {
        match self {
            Transport::Direct => "direct",
            Transport::Relay { name, .. } => name,
        }
    }

    /// Build the URL actually fetched for the given target
    pub fn apply(&self, url: &str) -> String {
        match self {
            Transport::Direct => url.to_string(),
            Transport::Relay { prefix, .. } => {
                format!("{}{}", prefix, urlencoding::encode(url))
            }
        }
    }
}

/// The ordered default waterfall: direct first, then the two public relays
pub fn default_transports() -> Vec<Transport> {
    vec![
        Transport::Direct,
        Transport::Relay {
            name: "allorigins",
            prefix: "https://api.allorigins.win/raw?url=".to_string(),
        },
        Transport::Relay {
            name: "corsproxy",
            prefix: "https://corsproxy.io/?".to_string(),
        },
    ]
}
