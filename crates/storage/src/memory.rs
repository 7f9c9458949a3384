//! In-memory document store.

use std::path::Path;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info};

use crate::{Document, DocumentStore, FindRequest, StoreError, StoreResult};

/// Holds documents in insertion order and evaluates filters locally.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    documents: Vec<Document>,
}

impl MemoryStore {
    pub fn new(documents: Vec<Document>) -> Self {
        Self { documents }
    }

    /// Load a JSON array of documents from disk.
    pub async fn from_json_file(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| StoreError::Load(format!("{}: {}", path.display(), e)))?;

        let documents = match serde_json::from_str::<Value>(&contents)
            .map_err(|e| StoreError::Load(format!("{}: {}", path.display(), e)))?
        {
            Value::Array(documents) => documents,
            _ => {
                return Err(StoreError::Load(format!(
                    "{}: expected a JSON array of documents",
                    path.display()
                )))
            }
        };

        info!(path = %path.display(), count = documents.len(), "Loaded documents");
        Ok(Self::new(documents))
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn find(&self, request: &FindRequest) -> StoreResult<Vec<Document>> {
        let constraints = request.filter.constraints()?;

        let page: Vec<Document> = self
            .documents
            .iter()
            .filter(|doc| constraints.iter().all(|c| c.matches(doc)))
            .skip(request.skip)
            .take(request.limit)
            .map(|doc| {
                let mut doc = doc.clone();
                request.selection.apply(&mut doc);
                doc
            })
            .collect();

        debug!(
            skip = request.skip,
            limit = request.limit,
            returned = page.len(),
            "Memory store page"
        );
        Ok(page)
    }
}
