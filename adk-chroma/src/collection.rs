//! Lazily-acquired collection handle.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::debug;

use crate::client::{ChromaClient, ChromaCollection};
use crate::error::Result;

/// Caches at most one collection handle.
///
/// The cache starts unbound. [`acquire`](Self::acquire) binds it by asking
/// the client to create (or open) the collection; [`invalidate`](Self::invalidate)
/// unbinds it so the next acquire goes back to the backend. The lock is held
/// across the create call, so concurrent acquirers trigger a single create.
#[derive(Default)]
pub struct CollectionCache {
    handle: Mutex<Option<Arc<dyn ChromaCollection>>>,
}

impl CollectionCache {
    /// Create an unbound cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached handle, creating the collection first if unbound.
    pub async fn acquire(
        &self,
        client: &dyn ChromaClient,
        name: &str,
    ) -> Result<Arc<dyn ChromaCollection>> {
        let mut handle = self.handle.lock().await;
        if let Some(collection) = handle.as_ref() {
            return Ok(Arc::clone(collection));
        }

        let collection = client.create_collection(name).await?;
        debug!(collection = name, "bound chroma collection handle");
        *handle = Some(Arc::clone(&collection));
        Ok(collection)
    }

    /// Drop the cached handle.
    pub async fn invalidate(&self) {
        self.handle.lock().await.take();
    }

    /// Whether a handle is currently cached.
    pub async fn is_bound(&self) -> bool {
        self.handle.lock().await.is_some()
    }
}

impl std::fmt::Debug for CollectionCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let bound = self.handle.try_lock().map(|h| h.is_some()).ok();
        f.debug_struct("CollectionCache").field("bound", &bound).finish()
    }
}
