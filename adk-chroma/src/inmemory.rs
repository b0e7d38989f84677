//! In-memory Chroma backend using cosine distance.
//!
//! This module provides [`InMemoryChromaClient`], a backend implementing
//! [`ChromaClient`] over a `HashMap` protected by a `tokio::sync::RwLock`.
//! It understands the same request shapes as a Chroma server and is suitable
//! for development, testing, and small-scale use cases.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

use crate::client::{
    AddRecords, ChromaClient, ChromaCollection, DeleteRequest, Include, QueryRequest,
    QueryResponse, Where,
};
use crate::error::{ChromaError, Result};
use crate::node::Metadata;

#[derive(Debug, Clone)]
struct Record {
    embedding: Vec<f32>,
    metadata: Metadata,
    document: String,
}

type Collections = HashMap<String, HashMap<String, Record>>;

/// An in-memory Chroma backend.
///
/// Collections are stored as nested `HashMap`s: collection name → record ID → record.
/// Cloning the client shares the underlying storage.
///
/// # Example
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use adk_chroma::{ChromaVectorStore, InMemoryChromaClient};
///
/// let store = ChromaVectorStore::new(Arc::new(InMemoryChromaClient::new()), "docs");
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryChromaClient {
    collections: Arc<RwLock<Collections>>,
}

impl InMemoryChromaClient {
    /// Create a new empty in-memory backend.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ChromaClient for InMemoryChromaClient {
    async fn create_collection(&self, name: &str) -> Result<Arc<dyn ChromaCollection>> {
        let mut collections = self.collections.write().await;
        collections.entry(name.to_string()).or_default();
        debug!(collection = name, "opened in-memory collection");
        Ok(Arc::new(InMemoryCollection {
            name: name.to_string(),
            collections: Arc::clone(&self.collections),
        }))
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        let mut collections = self.collections.write().await;
        collections.remove(name);
        Ok(())
    }

    async fn heartbeat(&self) -> Result<()> {
        Ok(())
    }
}

/// A handle to one collection of an [`InMemoryChromaClient`].
#[derive(Debug)]
pub struct InMemoryCollection {
    name: String,
    collections: Arc<RwLock<Collections>>,
}

impl InMemoryCollection {
    fn missing(&self) -> ChromaError {
        ChromaError::backend(404, format!("collection '{}' does not exist", self.name))
    }
}

/// Cosine distance (`1 - cosine similarity`) between two vectors.
///
/// Returns 1.0 if either vector has zero magnitude.
fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }
    1.0 - dot / (norm_a * norm_b)
}

/// Evaluate a metadata filter: plain equality per key, plus `$eq`, `$ne`,
/// `$and` and `$or`.
fn matches_where(metadata: &Metadata, filter: &Where) -> bool {
    filter.iter().all(|(key, expected)| match key.as_str() {
        "$and" => sub_filters(expected).all(|f| matches_where(metadata, f)),
        "$or" => sub_filters(expected).any(|f| matches_where(metadata, f)),
        _ => {
            let actual = metadata.get(key).cloned().map(Value::from);
            match expected {
                Value::Object(op) if op.contains_key("$ne") => actual.as_ref() != op.get("$ne"),
                Value::Object(op) if op.contains_key("$eq") => actual.as_ref() == op.get("$eq"),
                value => actual.as_ref() == Some(value),
            }
        }
    })
}

fn sub_filters(value: &Value) -> impl Iterator<Item = &Where> {
    value.as_array().into_iter().flatten().filter_map(Value::as_object)
}

/// Evaluate a document filter: `$contains` and `$not_contains`.
fn matches_document(document: &str, filter: &Where) -> bool {
    filter.iter().all(|(op, needle)| {
        let needle = needle.as_str().unwrap_or_default();
        match op.as_str() {
            "$contains" => document.contains(needle),
            "$not_contains" => !document.contains(needle),
            _ => false,
        }
    })
}

fn record_matches(
    record: &Record,
    where_metadata: Option<&Where>,
    where_document: Option<&Where>,
) -> bool {
    where_metadata.is_none_or(|f| matches_where(&record.metadata, f))
        && where_document.is_none_or(|f| matches_document(&record.document, f))
}

#[async_trait]
impl ChromaCollection for InMemoryCollection {
    fn name(&self) -> &str {
        &self.name
    }

    async fn add(&self, records: AddRecords) -> Result<()> {
        let count = records.len();
        if records.embeddings.len() != count
            || records.metadatas.len() != count
            || records.documents.len() != count
        {
            return Err(ChromaError::backend(400, "add arrays must all have the same length"));
        }

        let mut collections = self.collections.write().await;
        let store = collections.get_mut(&self.name).ok_or_else(|| self.missing())?;

        let rows = records
            .ids
            .into_iter()
            .zip(records.embeddings)
            .zip(records.metadatas.into_iter().zip(records.documents));
        let mut staged = Vec::with_capacity(count);
        for ((id, embedding), (metadata, document)) in rows {
            let embedding = embedding.ok_or_else(|| {
                ChromaError::backend(400, format!("record '{id}' has no embedding"))
            })?;
            staged.push((id, Record { embedding, metadata, document }));
        }
        store.extend(staged);
        Ok(())
    }

    async fn delete(&self, request: DeleteRequest) -> Result<()> {
        let mut collections = self.collections.write().await;
        let store = collections.get_mut(&self.name).ok_or_else(|| self.missing())?;

        let where_metadata = request.where_metadata.as_ref();
        let where_document = request.where_document.as_ref();
        for id in &request.ids {
            if store.get(id).is_some_and(|r| record_matches(r, where_metadata, where_document)) {
                store.remove(id);
            }
        }
        Ok(())
    }

    async fn query(&self, request: QueryRequest) -> Result<QueryResponse> {
        let Some(query_embeddings) = request.query_embeddings else {
            return Err(ChromaError::backend(
                400,
                "in-memory backend has no embedding function; supply query_embeddings",
            ));
        };

        let collections = self.collections.read().await;
        let store = collections.get(&self.name).ok_or_else(|| self.missing())?;

        let include = |field| request.include.contains(&field);
        let mut response = QueryResponse {
            distances: include(Include::Distances).then(Vec::new),
            metadatas: include(Include::Metadatas).then(Vec::new),
            documents: include(Include::Documents).then(Vec::new),
            embeddings: include(Include::Embeddings).then(Vec::new),
            ..QueryResponse::default()
        };

        let where_metadata = request.where_metadata.as_ref();
        let where_document = request.where_document.as_ref();
        for embedding in &query_embeddings {
            let mut scored: Vec<(&String, &Record, f32)> = store
                .iter()
                .filter(|(_, r)| record_matches(r, where_metadata, where_document))
                .map(|(id, r)| (id, r, cosine_distance(&r.embedding, embedding)))
                .collect();
            scored.sort_by(|a, b| a.2.partial_cmp(&b.2).unwrap_or(std::cmp::Ordering::Equal));
            scored.truncate(request.n_results);

            response.ids.push(scored.iter().map(|(id, _, _)| (*id).clone()).collect());
            if let Some(d) = response.distances.as_mut() {
                d.push(scored.iter().map(|(_, _, dist)| *dist).collect());
            }
            if let Some(m) = response.metadatas.as_mut() {
                m.push(scored.iter().map(|(_, r, _)| Some(r.metadata.clone())).collect());
            }
            if let Some(docs) = response.documents.as_mut() {
                docs.push(scored.iter().map(|(_, r, _)| Some(r.document.clone())).collect());
            }
            if let Some(e) = response.embeddings.as_mut() {
                e.push(scored.iter().map(|(_, r, _)| Some(r.embedding.clone())).collect());
            }
        }

        Ok(response)
    }

    async fn count(&self) -> Result<usize> {
        let collections = self.collections.read().await;
        collections.get(&self.name).map(HashMap::len).ok_or_else(|| self.missing())
    }
}
