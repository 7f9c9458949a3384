//! Projection-aware shape source.

use std::sync::Arc;

use async_trait::async_trait;
use geo_common::{normalize_crs_identifier, BoundingBox, FeatureCollection};
use pipeline_metrics::{names, LatencyTimer, MetricsContext, PausableTimer};
use projection::{project_feature_collection, Transform};
use serde_json::{Map, Value};
use storage::{DocumentStore, FieldMask, Filter, FindRequest};
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

use crate::pager::{fetch_all, PageTimers};
use crate::transform::ShapeCollection;
use crate::{ConfigError, FetchError, SourceConfig};

/// A named provider of shape features for a bounding box.
#[async_trait]
pub trait ShapeSource: Send + Sync {
    fn source_name(&self) -> &str;

    /// Maximum zoom advertised to tile clients.
    fn max_zoom(&self) -> u8;

    /// Fetch the shapes within a box given in `crs`, returned in `crs`.
    async fn get_shapes(
        &self,
        min_x: f64,
        min_y: f64,
        max_x: f64,
        max_y: f64,
        crs: &str,
    ) -> Result<ShapeCollection, FetchError> {
        self.get_shapes_with_cancel(min_x, min_y, max_x, max_y, crs, &CancellationToken::new())
            .await
    }

    /// As [`get_shapes`](Self::get_shapes), abandoning paging once `cancel`
    /// fires.
    async fn get_shapes_with_cancel(
        &self,
        min_x: f64,
        min_y: f64,
        max_x: f64,
        max_y: f64,
        crs: &str,
        cancel: &CancellationToken,
    ) -> Result<ShapeCollection, FetchError>;
}

/// Shape source over survey records in a document store.
///
/// Queries run in the store's native CRS. When the caller asks for another
/// CRS the box corners are projected in and the top-level feature geometries
/// projected back out; `properties.geometry` stays native.
pub struct ResponsesSource {
    name: String,
    store: Arc<dyn DocumentStore>,
    base_filter: Map<String, Value>,
    key: String,
    native_crs: String,
    selection: Arc<FieldMask>,
    page_size: usize,
    zoom: u8,
    latency: LatencyTimer,
    database: PausableTimer,
    processing: PausableTimer,
}

impl ResponsesSource {
    pub fn new(
        config: &SourceConfig,
        store: Arc<dyn DocumentStore>,
        metrics: &MetricsContext,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        Ok(Self {
            name: config.name.clone(),
            store,
            base_filter: config.query.clone(),
            key: config.key.clone(),
            native_crs: config.native_crs(),
            selection: Arc::new(config.field_mask()?),
            page_size: config.page_size,
            zoom: config.zoom,
            latency: metrics.new_latency_timer(names::DATASOURCE),
            database: metrics.new_pausable_timer(names::DATABASE),
            processing: metrics.new_pausable_timer(names::PROCESSING),
        })
    }

    pub fn native_crs(&self) -> &str {
        &self.native_crs
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }
}

#[async_trait]
impl ShapeSource for ResponsesSource {
    fn source_name(&self) -> &str {
        &self.name
    }

    fn max_zoom(&self) -> u8 {
        self.zoom
    }

    #[instrument(skip(self, cancel), fields(source = %self.name, store = self.store.name()))]
    async fn get_shapes_with_cancel(
        &self,
        min_x: f64,
        min_y: f64,
        max_x: f64,
        max_y: f64,
        crs: &str,
        cancel: &CancellationToken,
    ) -> Result<ShapeCollection, FetchError> {
        let latency = self.latency.start();

        let caller_crs = normalize_crs_identifier(crs);
        let reproject = caller_crs != self.native_crs;

        let mut sw = [min_x, min_y];
        let mut ne = [max_x, max_y];
        if reproject {
            let to_native = Transform::between(&caller_crs, &self.native_crs)?;
            sw = to_native.apply(sw)?;
            ne = to_native.apply(ne)?;
        }
        let bbox = BoundingBox::from_corners(sw, ne);

        let filter = Filter::from_base(&self.base_filter).within_box(&self.key, &bbox);
        let request = FindRequest {
            filter: Arc::new(filter),
            selection: Arc::clone(&self.selection),
            limit: self.page_size,
            skip: 0,
        };
        let timers = PageTimers::new(&self.database, &self.processing);

        let features = fetch_all(&self.store, request, timers, cancel).await?;

        let mut collection = FeatureCollection::new(features);
        if reproject {
            collection = project_feature_collection(&self.native_crs, &caller_crs, collection)?;
        }

        let elapsed = latency.stop();
        info!(
            features = collection.len(),
            crs = %caller_crs,
            reprojected = reproject,
            elapsed_ms = elapsed.as_secs_f64() * 1000.0,
            "Fetched shapes"
        );

        Ok(collection)
    }
}
