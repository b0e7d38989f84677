//! Chroma REST client.
//!
//! This module is only available when the `http` feature is enabled (on by
//! default). It talks to the Chroma v2 API with `reqwest`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::debug;

use crate::client::{
    AddRecords, ChromaClient, ChromaCollection, DeleteRequest, QueryRequest, QueryResponse,
};
use crate::config::ChromaConfig;
use crate::error::{ChromaError, Result};

/// Header carrying the Chroma auth token.
const TOKEN_HEADER: &str = "x-chroma-token";

/// Distance space requested for new collections. Similarity scores are
/// derived as `1 - distance`, which is only a bounded similarity for cosine.
const DISTANCE_SPACE: &str = "cosine";

/// A [`ChromaClient`] speaking the Chroma v2 REST API.
///
/// # Example
///
/// ```rust,ignore
/// use adk_chroma::{ChromaConfig, HttpChromaClient, ChromaClient};
///
/// let config = ChromaConfig::builder().collection("docs").build()?;
/// let client = HttpChromaClient::new(&config)?;
/// client.heartbeat().await?;
/// ```
#[derive(Debug, Clone)]
pub struct HttpChromaClient {
    client: reqwest::Client,
    base_url: String,
    database_url: String,
}

impl HttpChromaClient {
    /// Create a client from a [`ChromaConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`ChromaError::ConfigError`] if the auth token is not a valid
    /// header value, or [`ChromaError::Http`] if the HTTP client cannot be built.
    pub fn new(config: &ChromaConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if let Some(token) = &config.auth_token {
            let value = HeaderValue::from_str(token)
                .map_err(|e| ChromaError::ConfigError(format!("invalid auth token: {e}")))?;
            headers.insert(TOKEN_HEADER, value);
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()?;

        let base_url = config.url.trim_end_matches('/').to_string();
        let database_url = format!(
            "{base_url}/api/v2/tenants/{}/databases/{}",
            config.tenant, config.database
        );
        Ok(Self { client, base_url, database_url })
    }
}

// ── Chroma API request/response types ──────────────────────────────

#[derive(Serialize)]
struct CreateCollectionRequest<'a> {
    name: &'a str,
    metadata: Map<String, Value>,
    get_or_create: bool,
}

#[derive(Deserialize)]
struct CollectionModel {
    id: String,
    name: String,
}

#[derive(Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Send a request, turning non-2xx statuses into [`ChromaError::Backend`].
async fn send(request: reqwest::RequestBuilder) -> Result<reqwest::Response> {
    let response = request.send().await?;
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<ErrorResponse>(&body)
        .ok()
        .and_then(|e| match (e.error, e.message) {
            (Some(error), Some(message)) => Some(format!("{error}: {message}")),
            (error, message) => error.or(message),
        })
        .unwrap_or(body);
    Err(ChromaError::backend(status.as_u16(), detail))
}

#[async_trait]
impl ChromaClient for HttpChromaClient {
    async fn create_collection(&self, name: &str) -> Result<Arc<dyn ChromaCollection>> {
        let mut metadata = Map::new();
        metadata.insert("hnsw:space".to_string(), json!(DISTANCE_SPACE));
        let body = CreateCollectionRequest { name, metadata, get_or_create: true };

        let url = format!("{}/collections", self.database_url);
        let model: CollectionModel = send(self.client.post(&url).json(&body)).await?.json().await?;
        debug!(collection = %model.name, id = %model.id, "opened chroma collection");

        Ok(Arc::new(HttpCollection {
            client: self.client.clone(),
            url: format!("{url}/{}", model.id),
            name: model.name,
        }))
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        let url = format!("{}/collections/{name}", self.database_url);
        send(self.client.delete(&url)).await?;
        debug!(collection = name, "deleted chroma collection");
        Ok(())
    }

    async fn heartbeat(&self) -> Result<()> {
        send(self.client.get(format!("{}/api/v2/heartbeat", self.base_url))).await?;
        Ok(())
    }
}

/// A collection handle on a Chroma server.
#[derive(Debug)]
pub struct HttpCollection {
    client: reqwest::Client,
    url: String,
    name: String,
}

#[async_trait]
impl ChromaCollection for HttpCollection {
    fn name(&self) -> &str {
        &self.name
    }

    async fn add(&self, records: AddRecords) -> Result<()> {
        debug!(collection = %self.name, count = records.len(), "adding records");
        send(self.client.post(format!("{}/add", self.url)).json(&records)).await?;
        Ok(())
    }

    async fn delete(&self, request: DeleteRequest) -> Result<()> {
        debug!(collection = %self.name, count = request.ids.len(), "deleting records");
        send(self.client.post(format!("{}/delete", self.url)).json(&request)).await?;
        Ok(())
    }

    async fn query(&self, request: QueryRequest) -> Result<QueryResponse> {
        debug!(collection = %self.name, n_results = request.n_results, "querying");
        let response = send(self.client.post(format!("{}/query", self.url)).json(&request)).await?;
        Ok(response.json().await?)
    }

    async fn count(&self) -> Result<usize> {
        let response = send(self.client.get(format!("{}/count", self.url))).await?;
        Ok(response.json().await?)
    }
}
