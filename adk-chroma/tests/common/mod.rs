//! Recording mock backend shared by the integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use adk_chroma::{
    AddRecords, ChromaClient, ChromaCollection, ChromaError, DeleteRequest, QueryRequest,
    QueryResponse,
};
use async_trait::async_trait;

/// Everything the mock has seen, plus the canned behaviour it replays.
#[derive(Default)]
pub struct MockState {
    pub creates: AtomicUsize,
    pub adds: Mutex<Vec<AddRecords>>,
    pub deletes: Mutex<Vec<DeleteRequest>>,
    pub queries: Mutex<Vec<QueryRequest>>,
    pub query_response: Mutex<QueryResponse>,
    pub failure: Mutex<Option<(u16, String)>>,
}

impl MockState {
    fn check(&self) -> adk_chroma::Result<()> {
        match self.failure.lock().unwrap().clone() {
            Some((status, message)) => Err(ChromaError::backend(status, message)),
            None => Ok(()),
        }
    }
}

#[derive(Clone, Default)]
pub struct MockClient {
    pub state: Arc<MockState>,
}

impl MockClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn creates(&self) -> usize {
        self.state.creates.load(Ordering::SeqCst)
    }

    pub fn fail_with(&self, status: u16, message: &str) {
        *self.state.failure.lock().unwrap() = Some((status, message.to_string()));
    }

    pub fn respond_with(&self, response: QueryResponse) {
        *self.state.query_response.lock().unwrap() = response;
    }

    pub fn queries(&self) -> Vec<QueryRequest> {
        self.state.queries.lock().unwrap().clone()
    }

    pub fn adds(&self) -> Vec<AddRecords> {
        self.state.adds.lock().unwrap().clone()
    }

    pub fn deletes(&self) -> Vec<DeleteRequest> {
        self.state.deletes.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChromaClient for MockClient {
    async fn create_collection(&self, name: &str) -> adk_chroma::Result<Arc<dyn ChromaCollection>> {
        self.state.creates.fetch_add(1, Ordering::SeqCst);
        // Widen the window in which racing acquirers could both see an empty cache.
        tokio::task::yield_now().await;
        Ok(Arc::new(MockCollection { name: name.to_string(), state: Arc::clone(&self.state) }))
    }

    async fn delete_collection(&self, _name: &str) -> adk_chroma::Result<()> {
        Ok(())
    }

    async fn heartbeat(&self) -> adk_chroma::Result<()> {
        Ok(())
    }
}

pub struct MockCollection {
    name: String,
    state: Arc<MockState>,
}

#[async_trait]
impl ChromaCollection for MockCollection {
    fn name(&self) -> &str {
        &self.name
    }

    async fn add(&self, records: AddRecords) -> adk_chroma::Result<()> {
        self.state.check()?;
        self.state.adds.lock().unwrap().push(records);
        Ok(())
    }

    async fn delete(&self, request: DeleteRequest) -> adk_chroma::Result<()> {
        self.state.check()?;
        self.state.deletes.lock().unwrap().push(request);
        Ok(())
    }

    async fn query(&self, request: QueryRequest) -> adk_chroma::Result<QueryResponse> {
        self.state.check()?;
        self.state.queries.lock().unwrap().push(request);
        Ok(self.state.query_response.lock().unwrap().clone())
    }

    async fn count(&self) -> adk_chroma::Result<usize> {
        self.state.check()?;
        Ok(self.state.adds.lock().unwrap().iter().map(AddRecords::len).sum())
    }
}
