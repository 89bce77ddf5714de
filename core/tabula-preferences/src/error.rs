//! Error types for the preferences layer.

use thiserror::Error;

/// Result type for preferences operations.
pub type PreferencesResult<T> = Result<T, PreferencesError>;

/// Errors that can occur while restoring or persisting preferences.
#[derive(Debug, Error)]
pub enum PreferencesError {
    /// IO error (file system).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The preferences key cannot be used by the adapter.
    #[error("invalid preferences key: {0:?}")]
    InvalidKey(String),

    /// Adapter-specific failure.
    #[error("adapter error: {0}")]
    Adapter(String),
}
