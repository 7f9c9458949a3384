//! Paged fetch of shape records.
//!
//! Pages are requested in increasing skip order. As soon as a full page
//! arrives the next one is spawned, so the store round-trip of page N+1
//! overlaps the transform of page N. A short page ends the fetch.

use std::sync::Arc;
use std::time::Duration;

use pipeline_metrics::{PausableHandle, PausableTimer};
use storage::{Document, DocumentStore, FindRequest, StoreResult};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::record::StoredRecord;
use crate::transform::{to_feature, ShapeFeature};
use crate::FetchError;

/// Per-fetch database and processing handles.
///
/// Database time accumulates while the fetch is blocked on the store;
/// processing time while pages are transformed.
#[derive(Debug)]
pub struct PageTimers {
    database: PausableHandle,
    processing: PausableHandle,
}

impl PageTimers {
    pub fn new(database: &PausableTimer, processing: &PausableTimer) -> Self {
        Self {
            database: database.handle(),
            processing: processing.handle(),
        }
    }

    /// Record both totals. Returns `(database, processing)`.
    pub fn stop(self) -> (Duration, Duration) {
        (self.database.stop(), self.processing.stop())
    }
}

/// A page request running on its own task. Dropping aborts it.
struct InFlightPage {
    skip: usize,
    handle: JoinHandle<StoreResult<Vec<Document>>>,
}

impl InFlightPage {
    fn spawn(store: &Arc<dyn DocumentStore>, request: FindRequest) -> Self {
        let store = Arc::clone(store);
        let skip = request.skip;
        let handle = tokio::spawn(async move { store.find(&request).await });
        Self { skip, handle }
    }

    async fn join(mut self) -> Result<Vec<Document>, FetchError> {
        match (&mut self.handle).await {
            Ok(Ok(docs)) => Ok(docs),
            Ok(Err(source)) => {
                error!(skip = self.skip, error = %source, "Store query failed");
                Err(FetchError::Store {
                    skip: self.skip,
                    source,
                })
            }
            Err(e) => Err(FetchError::Join(e.to_string())),
        }
    }
}

impl Drop for InFlightPage {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Fetch every page matching `request` and transform it into features.
///
/// `request.limit` is the page size. Any store or decode error aborts the
/// whole fetch and no partial result is returned; the timers then record
/// nothing. On success both timers are stopped exactly once.
pub async fn fetch_all(
    store: &Arc<dyn DocumentStore>,
    request: FindRequest,
    mut timers: PageTimers,
    cancel: &CancellationToken,
) -> Result<Vec<ShapeFeature>, FetchError> {
    let page_size = request.limit;
    if page_size == 0 {
        return Err(FetchError::InvalidPageSize);
    }

    let mut features = Vec::new();
    let mut pages = 0usize;
    let mut request = request;
    let mut pending = Some(InFlightPage::spawn(store, request.clone()));

    while let Some(page) = pending.take() {
        let skip = page.skip;

        // Only time spent blocked here counts as database time. A prefetch
        // that completes while the previous page is transformed adds nothing.
        timers.database.start();
        let docs = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                warn!(skip, pages, "Shape fetch cancelled");
                return Err(FetchError::Cancelled);
            }
            docs = page.join() => docs?,
        };
        timers.database.pause();
        pages += 1;

        let finished = docs.len() != page_size;
        if !finished {
            request = request.next_page();
            pending = Some(InFlightPage::spawn(store, request.clone()));
            // Let the prefetch issue its query before the transform holds
            // this worker.
            tokio::task::yield_now().await;
        }

        timers.processing.start();
        let returned = docs.len();
        features.reserve(returned);
        for (i, doc) in docs.into_iter().enumerate() {
            let record =
                StoredRecord::from_document(doc).map_err(|e| FetchError::MalformedRecord {
                    offset: skip + i,
                    message: e.to_string(),
                })?;
            features.push(to_feature(record));
        }
        timers.processing.pause();

        debug!(skip, returned, finished, "Processed page");
    }

    let (database, processing) = timers.stop();
    debug!(
        pages,
        features = features.len(),
        database_ms = database.as_secs_f64() * 1000.0,
        processing_ms = processing.as_secs_f64() * 1000.0,
        "Fetched all pages"
    );

    Ok(features)
}
