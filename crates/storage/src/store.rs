use async_trait::async_trait;

use crate::{Document, FindRequest, StoreResult};

/// A paged document query executor.
///
/// Implementations return at most `request.limit` documents starting at
/// `request.skip`, with the field mask already applied. Returning fewer
/// documents than the limit is the only end-of-data signal callers rely on.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    async fn find(&self, request: &FindRequest) -> StoreResult<Vec<Document>>;

    /// Verify the store is reachable.
    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }
}
