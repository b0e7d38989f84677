//! # adk-chroma
//!
//! Chroma vector store adapter for ADK-Rust retrieval.
//!
//! [`ChromaVectorStore`] implements the [`VectorStore`] trait on top of a
//! Chroma collection. It turns [`Node`]s into Chroma's parallel-array
//! records on insert, and turns query responses back into nodes with
//! similarity scores. The collection is created lazily on first use.
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `http`  | [`HttpChromaClient`] for the Chroma v2 REST API (default) |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use adk_chroma::{ChromaVectorStore, InMemoryChromaClient, Node, VectorStore, VectorStoreQuery};
//!
//! let store = ChromaVectorStore::new(Arc::new(InMemoryChromaClient::new()), "docs");
//! store.add(&[Node::new("Rust is fast").with_embedding(vec![1.0, 0.0])]).await?;
//! let result = store.query(&VectorStoreQuery::from_embedding(vec![1.0, 0.0]), None).await?;
//! ```

pub mod client;
pub mod collection;
pub mod config;
pub mod error;
#[cfg(feature = "http")]
pub mod http;
pub mod inmemory;
pub mod metadata;
pub mod node;
pub mod query;
pub mod store;
pub mod vectorstore;

pub use client::{
    AddRecords, ChromaClient, ChromaCollection, DeleteRequest, Include, QueryRequest,
    QueryResponse, Where,
};
pub use collection::CollectionCache;
pub use config::{ChromaConfig, ChromaConfigBuilder};
pub use error::{ChromaError, Result};
#[cfg(feature = "http")]
pub use http::{HttpChromaClient, HttpCollection};
pub use inmemory::{InMemoryChromaClient, InMemoryCollection};
pub use metadata::{DEFAULT_TEXT_KEY, node_to_metadata};
pub use node::{Metadata, MetadataMode, MetadataValue, Node};
pub use query::{
    DeleteOptions, MetadataFilter, MetadataFilters, QueryOptions, VectorStoreQuery,
    VectorStoreQueryMode, VectorStoreQueryResult,
};
pub use store::{ChromaVectorStore, distance_to_similarity};
pub use vectorstore::VectorStore;
