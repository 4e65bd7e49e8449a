//! Unified error handling for the classroutine crate
//!
//! Domain-specific errors live in [`crate::utils::error`]; this module wraps
//! them in a single [`Error`] enum usable across module boundaries, with a
//! coarse [`ErrorCategory`] for handling strategies.
//!
//! Note the deliberate asymmetry with the rest of the crate: extraction never
//! produces errors (it degrades with diagnostics) and the offline store is
//! fail-soft, so in practice only fetching and the orchestrator's final
//! fallback exhaustion surface through this type.

use std::io;
use thiserror::Error;

pub use crate::utils::error::{FetchError, SyncError};

/// Classification of errors for handling strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Network-related errors (HTTP, timeout, connectivity)
    Network,
    /// Serialization and data decoding errors
    Parsing,
    /// Storage and I/O errors
    Storage,
    /// Configuration and validation errors
    Config,
    /// Sync orchestration errors (fallback exhaustion)
    Sync,
    /// Other/unknown errors
    Other,
}

/// Unified error type for the classroutine crate
#[derive(Error, Debug)]
pub enum Error {
    /// Fetch-specific errors
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Sync orchestration errors
    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),

    /// Generic error with context
    #[error("{context}")]
    Other {
        context: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a generic error with context
    pub fn other(context: impl Into<String>) -> Self {
        Self::Other {
            context: context.into(),
            source: None,
        }
    }

    /// Get the error category for handling strategies
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Fetch(e) => {
                if e.is_network_related() {
                    ErrorCategory::Network
                } else {
                    ErrorCategory::Parsing
                }
            }
            Self::Http(_) => ErrorCategory::Network,
            Self::Sync(_) => ErrorCategory::Sync,
            Self::Io(_) => ErrorCategory::Storage,
            Self::Json(_) => ErrorCategory::Parsing,
            Self::Config(_) => ErrorCategory::Config,
            Self::Other { .. } => ErrorCategory::Other,
        }
    }

    /// Check if this error is recoverable (worth retrying later)
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Fetch(e) => e.is_network_related(),
            Self::Http(_) | Self::Io(_) => true,
            // Fallback exhaustion recovers once connectivity returns
            Self::Sync(SyncError::NoDataAvailable { .. }) => true,
            Self::Sync(SyncError::Fetch(e)) => e.is_network_related(),
            Self::Json(_) | Self::Config(_) | Self::Other { .. } => false,
        }
    }
}

// Conversion from anyhow::Error for binary-level glue code
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other {
            context: err.to_string(),
            source: None,
        }
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;
