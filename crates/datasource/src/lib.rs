//! Shape data sources.
//!
//! A [`ResponsesSource`] answers "which shapes fall inside this box" by
//! paging survey records out of a [`storage::DocumentStore`], turning each
//! into a GeoJSON feature and reprojecting between the caller's CRS and the
//! store's native one. Fetch latency, store wait time and transform time are
//! recorded into an injected [`pipeline_metrics::MetricsContext`].

pub mod config;
pub mod error;
pub mod pager;
pub mod record;
pub mod source;
pub mod transform;

pub use config::SourceConfig;
pub use error::{ConfigError, FetchError};
pub use pager::{fetch_all, PageTimers};
pub use record::{Entry, RecordProperties, StoredRecord};
pub use source::{ResponsesSource, ShapeSource};
pub use transform::{to_feature, ResponseProperties, ShapeCollection, ShapeFeature};
