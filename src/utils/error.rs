//! Error types for the routine aggregator
//!
//! Parsing deliberately has no error type: malformed cells and sparse rows
//! degrade to omission plus a diagnostic, never to an `Err`.

use thiserror::Error;

/// Errors that can occur during HTTP fetching operations
#[derive(Error, Debug)]
pub enum FetchError {
    /// HTTP request error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Server error with status code
    #[error("Server error: {0}")]
    ServerError(u16),

    /// Request timeout
    #[error("Request timeout")]
    Timeout,

    /// Maximum retry attempts exceeded
    #[error("Maximum retry attempts exceeded")]
    MaxRetriesExceeded,

    /// Response body was not valid UTF-8 text or expected JSON
    #[error("Decoding error: {0}")]
    Decode(String),

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl FetchError {
    /// Whether the failure looks like a connectivity problem rather than a
    /// data problem. Drives the fallback chain: network-style failures try
    /// the exported backup before the persisted snapshot.
    pub fn is_network_related(&self) -> bool {
        match self {
            Self::Timeout | Self::MaxRetriesExceeded => true,
            Self::Http(e) => e.is_connect() || e.is_timeout() || e.is_request(),
            Self::ServerError(status) => matches!(status, 502..=504),
            Self::Decode(_) | Self::InvalidUrl(_) => false,
        }
    }
}

/// Errors surfaced by the sync orchestrator
///
/// `NoDataAvailable` is the only error a caller ever sees from a full sync:
/// it means the live fetch, the exported backup and the persisted snapshot
/// all came up empty.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Primary fetch failure (carried for context once fallbacks fail too)
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Every data source was exhausted
    #[error("{}", if *.offline {
        "no data available: offline and no cached snapshot exists"
    } else {
        "no data available: remote fetch failed and no backup or cached snapshot exists"
    })]
    NoDataAvailable {
        /// True when the environment reported itself offline
        offline: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_classification() {
        assert!(FetchError::Timeout.is_network_related());
        assert!(FetchError::MaxRetriesExceeded.is_network_related());
        assert!(FetchError::ServerError(503).is_network_related());
        assert!(!FetchError::ServerError(404).is_network_related());
        assert!(!FetchError::Decode("bad payload".into()).is_network_related());
        assert!(!FetchError::InvalidUrl("not a url".into()).is_network_related());
    }

    #[test]
    fn test_no_data_message_distinguishes_offline() {
        let offline = SyncError::NoDataAvailable { offline: true };
        let online = SyncError::NoDataAvailable { offline: false };
        assert!(offline.to_string().contains("offline"));
        assert!(online.to_string().contains("remote fetch failed"));
    }
}
