//! Backend client seam.
//!
//! [`ChromaClient`] and [`ChromaCollection`] describe the subset of the
//! Chroma API the adapter relies on. The request and response structs mirror
//! Chroma's JSON bodies: records travel as parallel arrays aligned by index.
//!
//! Two implementations ship with the crate: the REST client in
//! [`crate::http`] and the in-process [`crate::inmemory`] backend.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;
use crate::node::Metadata;

/// A backend-native filter expression, e.g. `{"author": "ann"}` or
/// `{"$contains": "rust"}` for document filters.
pub type Where = Map<String, Value>;

/// Fields a query can ask the backend to return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Include {
    /// Distance of each result to the query.
    Distances,
    /// Metadata of each result.
    Metadatas,
    /// Stored document text of each result.
    Documents,
    /// Stored embedding of each result. Not returned unless requested.
    Embeddings,
}

/// A batch of records to add, as parallel arrays.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AddRecords {
    /// Record ids.
    pub ids: Vec<String>,
    /// Record embeddings. A `None` entry is forwarded as `null` and left to
    /// the backend to reject.
    pub embeddings: Vec<Option<Vec<f32>>>,
    /// Record metadata.
    pub metadatas: Vec<Metadata>,
    /// Record documents.
    pub documents: Vec<String>,
}

impl AddRecords {
    /// Number of records in the batch.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether the batch is empty.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// A delete scoped by ids and optional filters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeleteRequest {
    /// Ids to delete.
    pub ids: Vec<String>,
    /// Optional metadata filter.
    #[serde(rename = "where", skip_serializing_if = "Option::is_none")]
    pub where_metadata: Option<Where>,
    /// Optional document-content filter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub where_document: Option<Where>,
}

/// A similarity query. The outer vectors hold one entry per query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryRequest {
    /// Query vectors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_embeddings: Option<Vec<Vec<f32>>>,
    /// Query texts, for backends that embed server-side.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_texts: Option<Vec<String>>,
    /// Results per query.
    pub n_results: usize,
    /// Optional metadata filter.
    #[serde(rename = "where", skip_serializing_if = "Option::is_none")]
    pub where_metadata: Option<Where>,
    /// Optional document-content filter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub where_document: Option<Where>,
    /// Fields to return.
    pub include: Vec<Include>,
}

/// Query results. Each outer vector is indexed by query, each inner one by
/// result rank.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    /// Result ids.
    pub ids: Vec<Vec<String>>,
    /// Result distances, when included.
    #[serde(default)]
    pub distances: Option<Vec<Vec<f32>>>,
    /// Result metadata, when included.
    #[serde(default)]
    pub metadatas: Option<Vec<Vec<Option<Metadata>>>>,
    /// Result documents, when included.
    #[serde(default)]
    pub documents: Option<Vec<Vec<Option<String>>>>,
    /// Result embeddings, when included.
    #[serde(default)]
    pub embeddings: Option<Vec<Vec<Option<Vec<f32>>>>>,
}

/// A client able to open collections on a Chroma backend.
#[async_trait]
pub trait ChromaClient: Send + Sync {
    /// Create the named collection, or open it if it already exists.
    async fn create_collection(&self, name: &str) -> Result<Arc<dyn ChromaCollection>>;

    /// Delete the named collection and all its records.
    async fn delete_collection(&self, name: &str) -> Result<()>;

    /// Check that the backend is reachable.
    async fn heartbeat(&self) -> Result<()>;
}

/// A handle to a single collection.
#[async_trait]
pub trait ChromaCollection: Send + Sync {
    /// The collection name.
    fn name(&self) -> &str;

    /// Add a batch of records.
    async fn add(&self, records: AddRecords) -> Result<()>;

    /// Delete records matching the request.
    async fn delete(&self, request: DeleteRequest) -> Result<()>;

    /// Run a similarity query.
    async fn query(&self, request: QueryRequest) -> Result<QueryResponse>;

    /// Number of records in the collection.
    async fn count(&self) -> Result<usize>;
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn query_request_omits_absent_filters() {
        let request = QueryRequest {
            query_embeddings: Some(vec![vec![1.0]]),
            n_results: 3,
            include: vec![Include::Distances, Include::Embeddings],
            ..QueryRequest::default()
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            json!({
                "query_embeddings": [[1.0]],
                "n_results": 3,
                "include": ["distances", "embeddings"],
            })
        );
    }

    #[test]
    fn delete_request_renames_where() {
        let mut filter = Where::new();
        filter.insert("author".into(), json!("ann"));
        let request = DeleteRequest {
            ids: vec!["a".into()],
            where_metadata: Some(filter),
            where_document: None,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json, json!({"ids": ["a"], "where": {"author": "ann"}}));
    }

    #[test]
    fn query_response_tolerates_missing_fields() {
        let response: QueryResponse =
            serde_json::from_value(json!({"ids": [["a"]], "distances": [[0.1]]})).unwrap();
        assert_eq!(response.ids, vec![vec!["a".to_string()]]);
        assert!(response.embeddings.is_none());
    }
}
