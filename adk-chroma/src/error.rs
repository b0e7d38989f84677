//! Error types for the `adk-chroma` crate.

use thiserror::Error;

/// Errors that can occur in Chroma vector store operations.
#[derive(Debug, Error)]
pub enum ChromaError {
    /// The query asks for a capability this adapter does not provide.
    #[error("Unsupported query: {0}")]
    UnsupportedQuery(String),

    /// A metadata value could not be flattened into a scalar.
    #[error("Invalid metadata for key '{key}': {message}")]
    InvalidMetadata {
        /// The offending metadata key.
        key: String,
        /// A description of the failure.
        message: String,
    },

    /// The backend returned parallel arrays that do not line up.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The backend rejected a request.
    #[error("Chroma backend error ({status}): {message}")]
    Backend {
        /// HTTP status, or a backend-specific code for non-HTTP backends.
        status: u16,
        /// A description of the failure.
        message: String,
    },

    /// A transport-level failure talking to the Chroma server.
    #[cfg(feature = "http")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A request or response body could not be (de)serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl ChromaError {
    /// Shorthand for a [`ChromaError::Backend`] error.
    pub fn backend(status: u16, message: impl Into<String>) -> Self {
        Self::Backend { status, message: message.into() }
    }
}

/// A convenience result type for Chroma operations.
pub type Result<T> = std::result::Result<T, ChromaError>;
