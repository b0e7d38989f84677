//! Canonical similarity-query request and result types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::client::Where;
use crate::node::{MetadataValue, Node};

/// Default number of results returned by a query.
pub const DEFAULT_SIMILARITY_TOP_K: usize = 2;

/// How a query should be answered.
///
/// The Chroma adapter only answers [`VectorStoreQueryMode::Default`]
/// (dense vector similarity).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VectorStoreQueryMode {
    /// Dense vector similarity.
    #[default]
    Default,
    /// Sparse (keyword-weighted) retrieval.
    Sparse,
    /// Dense and sparse combined.
    Hybrid,
    /// Full-text search.
    TextSearch,
    /// Maximal marginal relevance.
    Mmr,
    /// Support vector machine ranking.
    Svm,
    /// Logistic regression ranking.
    LogisticRegression,
    /// Linear regression ranking.
    LinearRegression,
}

/// A single `key == value` constraint on node metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataFilter {
    /// Metadata key.
    pub key: String,
    /// Required value.
    pub value: MetadataValue,
}

impl MetadataFilter {
    /// Create an equality constraint.
    pub fn new(key: impl Into<String>, value: impl Into<MetadataValue>) -> Self {
        Self { key: key.into(), value: value.into() }
    }
}

/// An ordered list of equality constraints, all of which must hold.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetadataFilters {
    /// The constraints, in the order supplied.
    pub filters: Vec<MetadataFilter>,
}

impl MetadataFilters {
    /// Create a filter list.
    pub fn new(filters: Vec<MetadataFilter>) -> Self {
        Self { filters }
    }

    /// Fold the constraints into a single flat equality map.
    ///
    /// When two constraints share a key the later one wins. Returns `None`
    /// for an empty list so callers omit the filter instead of sending `{}`.
    pub fn to_where(&self) -> Option<Where> {
        if self.filters.is_empty() {
            return None;
        }
        let map = self.filters.iter().fold(Where::new(), |mut acc, filter| {
            acc.insert(filter.key.clone(), Value::from(filter.value.clone()));
            acc
        });
        Some(map)
    }
}

/// A similarity query against a vector store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorStoreQuery {
    /// Query vector, if already embedded.
    pub query_embedding: Option<Vec<f32>>,
    /// Raw query text, for backends that embed server-side.
    pub query_str: Option<String>,
    /// Maximum number of results.
    pub similarity_top_k: usize,
    /// Query mode.
    pub mode: VectorStoreQueryMode,
    /// Optional metadata equality constraints.
    pub filters: Option<MetadataFilters>,
    /// Restrict results to these document ids. Not supported by Chroma.
    pub doc_ids: Option<Vec<String>>,
}

impl Default for VectorStoreQuery {
    fn default() -> Self {
        Self {
            query_embedding: None,
            query_str: None,
            similarity_top_k: DEFAULT_SIMILARITY_TOP_K,
            mode: VectorStoreQueryMode::Default,
            filters: None,
            doc_ids: None,
        }
    }
}

impl VectorStoreQuery {
    /// Query by embedding.
    pub fn from_embedding(embedding: Vec<f32>) -> Self {
        Self { query_embedding: Some(embedding), ..Self::default() }
    }

    /// Query by raw text.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self { query_str: Some(text.into()), ..Self::default() }
    }

    /// Set the number of results.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.similarity_top_k = top_k;
        self
    }

    /// Set the query mode.
    pub fn with_mode(mut self, mode: VectorStoreQueryMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the metadata filters.
    pub fn with_filters(mut self, filters: MetadataFilters) -> Self {
        self.filters = Some(filters);
        self
    }

    /// Restrict to document ids.
    pub fn with_doc_ids(mut self, doc_ids: Vec<String>) -> Self {
        self.doc_ids = Some(doc_ids);
        self
    }

    /// Also pass the raw query text.
    pub fn with_query_str(mut self, text: impl Into<String>) -> Self {
        self.query_str = Some(text.into());
        self
    }
}

/// Results of a similarity query.
///
/// `nodes`, `similarities` and `ids` always have the same length, and
/// position `i` in each refers to the same result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VectorStoreQueryResult {
    /// Reconstructed nodes, best match first.
    pub nodes: Vec<Node>,
    /// Similarity scores (higher is more relevant).
    pub similarities: Vec<f32>,
    /// Record ids.
    pub ids: Vec<String>,
}

impl VectorStoreQueryResult {
    /// Number of results.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether the query matched nothing.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Backend-native options for [`query`](crate::VectorStore::query).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryOptions {
    /// Document-content filter, e.g. `{"$contains": "rust"}`.
    pub where_document: Option<Where>,
}

/// Backend-native options for [`delete`](crate::VectorStore::delete).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeleteOptions {
    /// Metadata filter further scoping the deletion.
    pub where_metadata: Option<Where>,
    /// Document-content filter further scoping the deletion.
    pub where_document: Option<Where>,
}
