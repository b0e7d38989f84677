//! Chroma-backed [`VectorStore`].
//!
//! [`ChromaVectorStore`] translates between [`Node`]s and canonical query
//! types on one side and Chroma's parallel-array records on the other. The
//! collection is created lazily on first use and re-acquired after deletes.
//!
//! # Example
//!
//! ```rust,ignore
//! use adk_chroma::{ChromaConfig, ChromaVectorStore, VectorStore, VectorStoreQuery};
//!
//! let config = ChromaConfig::builder().url("http://localhost:8000").collection("docs").build()?;
//! let store = ChromaVectorStore::from_config(&config)?;
//! let ids = store.add(&nodes).await?;
//! let result = store.query(&VectorStoreQuery::from_embedding(embedding).with_top_k(5), None).await?;
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::{debug, error};

use crate::client::{
    AddRecords, ChromaClient, ChromaCollection, DeleteRequest, Include, QueryRequest,
    QueryResponse,
};
use crate::collection::CollectionCache;
use crate::error::{ChromaError, Result};
use crate::metadata::{DEFAULT_TEXT_KEY, node_to_metadata};
use crate::node::{MetadataMode, Node};
use crate::query::{
    DeleteOptions, MetadataFilters, QueryOptions, VectorStoreQuery, VectorStoreQueryMode,
    VectorStoreQueryResult,
};
use crate::vectorstore::VectorStore;

/// Fields every query asks for. Chroma omits embeddings unless asked.
const QUERY_INCLUDE: [Include; 4] =
    [Include::Distances, Include::Metadatas, Include::Documents, Include::Embeddings];

/// Convert a Chroma distance into a similarity score.
///
/// Computed as `1 - distance`, which is the cosine similarity when the
/// collection uses cosine distance (`hnsw:space = cosine`, the space the
/// HTTP client requests on creation). Collections configured with `l2` or
/// `ip` still go through the same formula; the result is then only a
/// monotonic ranking signal, not a bounded similarity.
pub fn distance_to_similarity(distance: f32) -> f32 {
    1.0 - distance
}

/// A [`VectorStore`] backed by a [Chroma](https://www.trychroma.com/) collection.
pub struct ChromaVectorStore {
    client: Arc<dyn ChromaClient>,
    collection_name: String,
    collection: CollectionCache,
    text_key: String,
    flat_metadata: bool,
}

impl ChromaVectorStore {
    /// Create a store over the named collection. Nothing is sent to the
    /// backend until the first operation.
    pub fn new(client: Arc<dyn ChromaClient>, collection_name: impl Into<String>) -> Self {
        Self {
            client,
            collection_name: collection_name.into(),
            collection: CollectionCache::new(),
            text_key: DEFAULT_TEXT_KEY.to_string(),
            flat_metadata: true,
        }
    }

    /// Create a store talking to a Chroma server over HTTP.
    #[cfg(feature = "http")]
    pub fn from_config(config: &crate::config::ChromaConfig) -> Result<Self> {
        let client = crate::http::HttpChromaClient::new(config)?;
        Ok(Self::new(Arc::new(client), config.collection.clone()))
    }

    /// Set the key the node text is serialized under in record metadata.
    pub fn with_text_key(mut self, text_key: impl Into<String>) -> Self {
        self.text_key = text_key.into();
        self
    }

    /// Choose whether nested metadata is rejected (`true`, the default) or
    /// stringified.
    pub fn with_flat_metadata(mut self, flat_metadata: bool) -> Self {
        self.flat_metadata = flat_metadata;
        self
    }

    /// The backend client.
    pub fn client(&self) -> &Arc<dyn ChromaClient> {
        &self.client
    }

    /// The collection name.
    pub fn collection_name(&self) -> &str {
        &self.collection_name
    }

    /// The metadata text key.
    pub fn text_key(&self) -> &str {
        &self.text_key
    }

    /// Whether nested metadata is rejected.
    pub fn flat_metadata(&self) -> bool {
        self.flat_metadata
    }

    /// Return the collection handle, creating the collection on first use.
    pub async fn collection(&self) -> Result<Arc<dyn ChromaCollection>> {
        self.collection.acquire(self.client.as_ref(), &self.collection_name).await
    }

    /// Forget the cached collection handle.
    pub async fn invalidate_collection(&self) {
        self.collection.invalidate().await;
    }

    fn log_failure(&self, operation: &'static str, e: ChromaError) -> ChromaError {
        error!(
            collection = %self.collection_name,
            operation,
            error = %e,
            details = ?e,
            "chroma operation failed"
        );
        e
    }

    fn build_query_request(
        query: &VectorStoreQuery,
        options: Option<QueryOptions>,
    ) -> Result<QueryRequest> {
        if query.doc_ids.is_some() {
            return Err(ChromaError::UnsupportedQuery(
                "querying by document ids is not supported by Chroma".to_string(),
            ));
        }
        if query.mode != VectorStoreQueryMode::Default {
            return Err(ChromaError::UnsupportedQuery(format!(
                "query mode {:?} is not supported by Chroma",
                query.mode
            )));
        }

        Ok(QueryRequest {
            query_embeddings: query.query_embedding.clone().map(|e| vec![e]),
            query_texts: query.query_str.clone().map(|s| vec![s]),
            n_results: query.similarity_top_k,
            where_metadata: query.filters.as_ref().and_then(MetadataFilters::to_where),
            where_document: options.and_then(|o| o.where_document),
            include: QUERY_INCLUDE.to_vec(),
        })
    }
}

/// Take the first query's batch of a response field, checking its length.
fn first_batch<T>(
    field: &str,
    batch: Option<Vec<Vec<T>>>,
    expected: usize,
) -> Result<Option<Vec<T>>> {
    let Some(batch) = batch else {
        return Ok(None);
    };
    let first = batch.into_iter().next().unwrap_or_default();
    if first.len() != expected {
        return Err(ChromaError::InvalidResponse(format!(
            "{field} has {} entries but ids has {expected}",
            first.len()
        )));
    }
    Ok(Some(first))
}

/// Zip the parallel arrays of a single-query response into nodes.
fn reassemble(response: QueryResponse) -> Result<VectorStoreQueryResult> {
    let ids = response.ids.into_iter().next().unwrap_or_default();
    let count = ids.len();

    let distances = first_batch("distances", response.distances, count)?.ok_or_else(|| {
        ChromaError::InvalidResponse("response is missing distances".to_string())
    })?;
    let mut metadatas = first_batch("metadatas", response.metadatas, count)?.map(Vec::into_iter);
    let mut documents = first_batch("documents", response.documents, count)?.map(Vec::into_iter);
    let mut embeddings =
        first_batch("embeddings", response.embeddings, count)?.map(Vec::into_iter);

    let mut result = VectorStoreQueryResult {
        nodes: Vec::with_capacity(count),
        similarities: Vec::with_capacity(count),
        ids: Vec::with_capacity(count),
    };
    for (id, distance) in ids.into_iter().zip(distances) {
        let metadata: Map<String, Value> = metadatas
            .as_mut()
            .and_then(Iterator::next)
            .flatten()
            .unwrap_or_default()
            .into_iter()
            .map(|(k, v)| (k, Value::from(v)))
            .collect();
        let text = documents.as_mut().and_then(Iterator::next).flatten().unwrap_or_default();
        let embedding = embeddings.as_mut().and_then(Iterator::next).flatten();

        result.nodes.push(Node { id: id.clone(), text, embedding, metadata, ref_doc_id: None });
        result.similarities.push(distance_to_similarity(distance));
        result.ids.push(id);
    }
    Ok(result)
}

#[async_trait]
impl VectorStore for ChromaVectorStore {
    fn stores_text(&self) -> bool {
        true
    }

    async fn add(&self, nodes: &[Node]) -> Result<Vec<String>> {
        if nodes.is_empty() {
            return Ok(Vec::new());
        }

        let mut records = AddRecords {
            ids: Vec::with_capacity(nodes.len()),
            embeddings: Vec::with_capacity(nodes.len()),
            metadatas: Vec::with_capacity(nodes.len()),
            documents: Vec::with_capacity(nodes.len()),
        };
        for node in nodes {
            records.ids.push(node.id.clone());
            records.embeddings.push(node.embedding.clone());
            records.metadatas.push(node_to_metadata(node, true, &self.text_key, self.flat_metadata)?);
            records.documents.push(node.content(MetadataMode::None));
        }
        let ids = records.ids.clone();

        let collection = self.collection().await.map_err(|e| self.log_failure("add", e))?;
        collection.add(records).await.map_err(|e| self.log_failure("add", e))?;

        debug!(collection = %self.collection_name, count = ids.len(), "added nodes to chroma");
        Ok(ids)
    }

    async fn delete(&self, ref_doc_id: &str, options: Option<DeleteOptions>) -> Result<()> {
        let options = options.unwrap_or_default();
        let request = DeleteRequest {
            ids: vec![ref_doc_id.to_string()],
            where_metadata: options.where_metadata,
            where_document: options.where_document,
        };

        let collection = self.collection().await.map_err(|e| self.log_failure("delete", e))?;
        collection.delete(request).await.map_err(|e| self.log_failure("delete", e))?;
        self.collection.invalidate().await;

        debug!(collection = %self.collection_name, ref_doc_id, "deleted from chroma");
        Ok(())
    }

    async fn query(
        &self,
        query: &VectorStoreQuery,
        options: Option<QueryOptions>,
    ) -> Result<VectorStoreQueryResult> {
        let request = Self::build_query_request(query, options)?;

        let collection = self.collection().await.map_err(|e| self.log_failure("query", e))?;
        let response = collection.query(request).await.map_err(|e| self.log_failure("query", e))?;
        let result = reassemble(response).map_err(|e| self.log_failure("query", e))?;

        debug!(collection = %self.collection_name, result_count = result.len(), "chroma query completed");
        Ok(result)
    }
}

impl std::fmt::Debug for ChromaVectorStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChromaVectorStore")
            .field("collection_name", &self.collection_name)
            .field("collection", &self.collection)
            .field("text_key", &self.text_key)
            .field("flat_metadata", &self.flat_metadata)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::node::{Metadata, MetadataValue};
    use crate::query::MetadataFilter;

    #[test]
    fn similarity_is_one_minus_distance() {
        assert!((distance_to_similarity(0.2) - 0.8).abs() < 1e-6);
        assert_eq!(distance_to_similarity(0.0), 1.0);
    }

    #[test]
    fn request_includes_embeddings_and_folds_filters() {
        let query = VectorStoreQuery::from_embedding(vec![0.1, 0.2])
            .with_top_k(4)
            .with_filters(MetadataFilters::new(vec![MetadataFilter::new("a", 1)]));
        let request = ChromaVectorStore::build_query_request(&query, None).unwrap();
        assert_eq!(request.n_results, 4);
        assert_eq!(request.query_embeddings, Some(vec![vec![0.1, 0.2]]));
        assert!(request.query_texts.is_none());
        assert_eq!(request.include, QUERY_INCLUDE.to_vec());
        assert_eq!(request.where_metadata.map(Value::Object), Some(json!({"a": 1})));
    }

    #[test]
    fn request_omits_empty_filters_and_passes_document_filter() {
        let query = VectorStoreQuery::from_text("rust")
            .with_filters(MetadataFilters::default());
        let options = QueryOptions { where_document: json!({"$contains": "rust"}).as_object().cloned() };
        let request = ChromaVectorStore::build_query_request(&query, Some(options)).unwrap();
        assert!(request.where_metadata.is_none());
        assert_eq!(request.query_texts, Some(vec!["rust".to_string()]));
        assert!(request.where_document.is_some());
    }

    #[test]
    fn reassemble_zips_by_position() {
        let response = QueryResponse {
            ids: vec![vec!["a".into(), "b".into()]],
            distances: Some(vec![vec![0.2, 0.5]]),
            metadatas: Some(vec![vec![
                Some(Metadata::from([("k".into(), MetadataValue::from("v"))])),
                None,
            ]]),
            documents: Some(vec![vec![Some("first".into()), Some("second".into())]]),
            embeddings: Some(vec![vec![Some(vec![1.0]), Some(vec![2.0])]]),
        };
        let result = reassemble(response).unwrap();
        assert_eq!(result.ids, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(result.nodes[0].text, "first");
        assert_eq!(result.nodes[0].metadata["k"], "v");
        assert!(result.nodes[1].metadata.is_empty());
        assert_eq!(result.nodes[1].embedding, Some(vec![2.0]));
        assert!((result.similarities[0] - 0.8).abs() < 1e-6);
        assert!((result.similarities[1] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn reassemble_rejects_mismatched_lengths() {
        let response = QueryResponse {
            ids: vec![vec!["a".into(), "b".into()]],
            distances: Some(vec![vec![0.2]]),
            ..QueryResponse::default()
        };
        let err = reassemble(response).unwrap_err();
        assert!(matches!(err, ChromaError::InvalidResponse(msg) if msg.contains("distances")));
    }

    #[test]
    fn reassemble_handles_empty_response() {
        let result = reassemble(QueryResponse::default()).unwrap_err();
        assert!(matches!(result, ChromaError::InvalidResponse(_)));

        let empty = QueryResponse { ids: vec![vec![]], distances: Some(vec![vec![]]), ..QueryResponse::default() };
        assert!(reassemble(empty).unwrap().is_empty());
    }
}
