//! Ordered-fallback policy shared by the provider, quality and transport layers

use crate::error::GrabError;
use std::future::Future;
use tracing::warn;

/// Outcome of exhausting every candidate in a waterfall
#[derive(Debug)]
pub struct Exhausted {
    /// Number of candidates attempted
    pub attempts: usize,
    /// The last underlying error, if any candidate was attempted at all
    pub last_error: Option<GrabError>,
}

impl Exhausted {
    /// Convert into a domain error, using `on_empty` when no candidate existed
    pub fn into_error(self, on_empty: impl FnOnce() -> GrabError) -> GrabError {
        match self.last_error {
            Some(e) => e,
            None => on_empty(),
        }
    }

    /// Human-readable description of the last underlying error
    pub fn last_message(&self) -> String {
        self.last_error
            .as_ref()
            .map(|e| e.to_string())
            .unwrap_or_else(|| "no candidates".to_string())
    }
}

/// Try candidates strictly in order and return the first success.
///
/// Each step runs only after the previous one failed; a failure is logged and
/// never aborts the remaining candidates. Exhaustion carries the last error.
pub async fn first_success<C, T, F, Fut>(
    label: &str,
    candidates: Vec<C>,
    mut attempt: F,
) -> Result<T, Exhausted>
where
    F: FnMut(C) -> Fut,
    Fut: Future<Output = Result<T, GrabError>>,
{
    let mut attempts = 0;
    let mut last_error = None;

    for candidate in candidates {
        attempts += 1;
        match attempt(candidate).await {
            Ok(value) => return Ok(value),
            Err(e) => {
                warn!("{} candidate {} failed: {}", label, attempts, e);
                last_error = Some(e);
            }
        }
    }

    Err(Exhausted {
        attempts,
        last_error,
    })
}
