//! Feed error taxonomy.

use thiserror::Error;

/// Why a feed fetch produced no usable data.
///
/// Transport problems and explicitly empty payloads are distinct on
/// purpose: the runtime keeps last-known-good state for both, but only
/// an empty payload raises the "no data" flag.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("feed request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("feed returned status {0}")]
    Status(u16),

    #[error("feed payload was not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("feed returned an empty payload")]
    EmptyPayload,
}

impl FeedError {
    /// True when the feed itself reported "nothing to show", as
    /// opposed to us failing to reach it.
    pub fn is_empty_payload(&self) -> bool {
        matches!(self, FeedError::EmptyPayload)
    }
}
