//! Connection and collection configuration for the Chroma adapter.

use serde::{Deserialize, Serialize};

use crate::error::{ChromaError, Result};

/// Default Chroma server URL.
pub const DEFAULT_URL: &str = "http://localhost:8000";

/// Default Chroma tenant.
pub const DEFAULT_TENANT: &str = "default_tenant";

/// Default Chroma database.
pub const DEFAULT_DATABASE: &str = "default_database";

/// Configuration for connecting a [`ChromaVectorStore`](crate::ChromaVectorStore)
/// to a Chroma server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChromaConfig {
    /// Base URL of the Chroma server.
    pub url: String,
    /// Tenant that owns the database.
    pub tenant: String,
    /// Database that holds the collection.
    pub database: String,
    /// Name of the collection the store reads and writes.
    pub collection: String,
    /// Optional token sent as the `x-chroma-token` header.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
    /// Request timeout in seconds, applied by the HTTP client.
    pub timeout_secs: u64,
}

impl Default for ChromaConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            tenant: DEFAULT_TENANT.to_string(),
            database: DEFAULT_DATABASE.to_string(),
            collection: String::new(),
            auth_token: None,
            timeout_secs: 30,
        }
    }
}

impl ChromaConfig {
    /// Create a new builder for constructing a [`ChromaConfig`].
    pub fn builder() -> ChromaConfigBuilder {
        ChromaConfigBuilder::default()
    }
}

/// Builder for constructing a validated [`ChromaConfig`].
#[derive(Debug, Clone, Default)]
pub struct ChromaConfigBuilder {
    config: ChromaConfig,
}

impl ChromaConfigBuilder {
    /// Set the Chroma server URL.
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.config.url = url.into();
        self
    }

    /// Set the tenant.
    pub fn tenant(mut self, tenant: impl Into<String>) -> Self {
        self.config.tenant = tenant.into();
        self
    }

    /// Set the database.
    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.config.database = database.into();
        self
    }

    /// Set the collection name.
    pub fn collection(mut self, collection: impl Into<String>) -> Self {
        self.config.collection = collection.into();
        self
    }

    /// Set the auth token.
    pub fn auth_token(mut self, token: impl Into<String>) -> Self {
        self.config.auth_token = Some(token.into());
        self
    }

    /// Set the request timeout in seconds.
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.config.timeout_secs = secs;
        self
    }

    /// Build the [`ChromaConfig`], validating that parameters are usable.
    ///
    /// # Errors
    ///
    /// Returns [`ChromaError::ConfigError`] if:
    /// - `url` or `collection` is empty
    /// - `timeout_secs == 0`
    pub fn build(self) -> Result<ChromaConfig> {
        if self.config.url.trim().is_empty() {
            return Err(ChromaError::ConfigError("url must not be empty".to_string()));
        }
        if self.config.collection.trim().is_empty() {
            return Err(ChromaError::ConfigError("collection must not be empty".to_string()));
        }
        if self.config.timeout_secs == 0 {
            return Err(ChromaError::ConfigError(
                "timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(self.config)
    }
}
