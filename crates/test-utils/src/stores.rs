//! Instrumented document stores.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use storage::{Document, DocumentStore, FindRequest, MemoryStore, StoreError, StoreResult};

/// A memory store that keeps every request it receives.
#[derive(Debug)]
pub struct RecordingStore {
    inner: MemoryStore,
    requests: Mutex<Vec<FindRequest>>,
    delay: Option<Duration>,
}

impl RecordingStore {
    pub fn new(documents: Vec<Value>) -> Self {
        Self {
            inner: MemoryStore::new(documents),
            requests: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    /// Sleep before answering each request.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Every request received so far, in arrival order.
    pub fn requests(&self) -> Vec<FindRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Skip offsets of every request received so far.
    pub fn skips(&self) -> Vec<usize> {
        self.requests().iter().map(|r| r.skip).collect()
    }
}

#[async_trait]
impl DocumentStore for RecordingStore {
    fn name(&self) -> &str {
        "recording"
    }

    async fn find(&self, request: &FindRequest) -> StoreResult<Vec<Document>> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.inner.find(request).await
    }
}

/// A memory store that fails every request after a number of good ones.
#[derive(Debug)]
pub struct FailingStore {
    inner: MemoryStore,
    succeed: usize,
    calls: AtomicUsize,
}

impl FailingStore {
    /// Fail every request.
    pub fn always() -> Self {
        Self::after_pages(Vec::new(), 0)
    }

    /// Answer the first `pages` requests from `documents`, then fail.
    pub fn after_pages(documents: Vec<Value>, pages: usize) -> Self {
        Self {
            inner: MemoryStore::new(documents),
            succeed: pages,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentStore for FailingStore {
    fn name(&self) -> &str {
        "failing"
    }

    async fn find(&self, request: &FindRequest) -> StoreResult<Vec<Document>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.succeed {
            self.inner.find(request).await
        } else {
            Err(StoreError::Query(format!(
                "simulated failure at skip {}",
                request.skip
            )))
        }
    }

    async fn health_check(&self) -> StoreResult<()> {
        Err(StoreError::Connection("simulated outage".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::three_records;
    use storage::{FieldMask, Filter};

    #[test]
    fn test_recording_store_captures_requests() {
        let store = RecordingStore::new(three_records());
        let request = FindRequest::new(Filter::default(), FieldMask::new(), 2);

        let first = tokio_test::block_on(store.find(&request)).unwrap();
        let second = tokio_test::block_on(store.find(&request.next_page())).unwrap();

        assert_eq!(first.len(), 2);
        assert_eq!(second.len(), 1);
        assert_eq!(store.skips(), vec![0, 2]);
    }

    #[test]
    fn test_failing_store_counts_calls() {
        let store = FailingStore::after_pages(three_records(), 1);
        let request = FindRequest::new(Filter::default(), FieldMask::new(), 1);

        assert!(tokio_test::block_on(store.find(&request)).is_ok());
        assert!(tokio_test::block_on(store.find(&request.next_page())).is_err());
        assert_eq!(store.calls(), 2);
    }
}
