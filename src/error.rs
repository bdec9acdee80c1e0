//! Error types for the Wayfarer content service

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the Wayfarer content service
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // =========================================================================
    // Cache-Aside Errors
    // =========================================================================
    /// Ranking source could not be reached or the ranking query failed
    #[error("Ranking source unavailable: {0}")]
    SourceUnavailable(String),

    /// Cache store read failed (distinct from a miss, which is not an error)
    #[error("Cache read failed for key '{key}': {reason}")]
    CacheReadFailed { key: String, reason: String },

    /// Cache store rejected a write
    #[error("Cache write failed for key '{key}': {reason}")]
    CacheWriteFailed { key: String, reason: String },

    /// Stored bytes failed to decode
    #[error("Corrupt cache entry under key '{key}': {reason}")]
    CacheCorrupt { key: String, reason: String },

    // =========================================================================
    // Ambient Errors
    // =========================================================================
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Build a `CacheReadFailed` for the given key.
    pub fn read_failed(key: &str, reason: impl Into<String>) -> Self {
        Self::CacheReadFailed {
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    /// Build a `CacheWriteFailed` for the given key.
    pub fn write_failed(key: &str, reason: impl Into<String>) -> Self {
        Self::CacheWriteFailed {
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    /// Build a `CacheCorrupt` for the given key.
    pub fn corrupt(key: &str, reason: impl Into<String>) -> Self {
        Self::CacheCorrupt {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}
