//! Vector store trait implemented by retrieval backends.

use async_trait::async_trait;

use crate::error::Result;
use crate::node::Node;
use crate::query::{DeleteOptions, QueryOptions, VectorStoreQuery, VectorStoreQueryResult};

/// A storage backend for embedded [`Node`]s with similarity search.
///
/// # Example
///
/// ```rust,ignore
/// use adk_chroma::{VectorStore, VectorStoreQuery};
///
/// let ids = store.add(&nodes).await?;
/// let result = store.query(&VectorStoreQuery::from_embedding(embedding).with_top_k(5), None).await?;
/// store.delete(&ids[0], None).await?;
/// ```
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Whether the store keeps node text alongside the vectors.
    fn stores_text(&self) -> bool;

    /// Add nodes and return their ids in input order.
    async fn add(&self, nodes: &[Node]) -> Result<Vec<String>>;

    /// Delete the records for `ref_doc_id`, optionally narrowed by filters.
    async fn delete(&self, ref_doc_id: &str, options: Option<DeleteOptions>) -> Result<()>;

    /// Return the nodes most similar to the query.
    async fn query(
        &self,
        query: &VectorStoreQuery,
        options: Option<QueryOptions>,
    ) -> Result<VectorStoreQueryResult>;
}
