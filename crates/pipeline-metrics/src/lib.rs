//! Timing metrics for the shape pipeline.
//!
//! A [`MetricsContext`] owns a registry of named [`Metric`]s. Timers borrow a
//! metric from the registry and fold their measurements into it:
//!
//! - [`LatencyTimer`]: one-shot start/stop wall-clock latency.
//! - [`PausableTimer`]: handles that accumulate active time across many
//!   start/pause cycles and fold the total once on stop.
//!
//! [`MetricsContext::report`] snapshots every metric that observed something
//! since the previous report, forwards the snapshots to the configured
//! [`TelemetrySink`]s and resets the registry for the next window.

pub mod context;
pub mod metric;
pub mod sink;
pub mod timer;

pub use context::{MetricsContext, PipelineReport};
pub use metric::Metric;
pub use sink::{PrometheusSink, TelemetrySink, TracingSink};
pub use timer::{LatencyStop, LatencyTimer, PausableHandle, PausableTimer};

/// Well-known metric names used by the data sources.
pub mod names {
    /// Whole datasource request latency.
    pub const DATASOURCE: &str = "Component/Pipeline/Datasource[ms|render]";
    /// Cumulative time waiting on the document store per request.
    pub const DATABASE: &str = "Component/Pipeline/Database[ms|render]";
    /// Cumulative time transforming records per request.
    pub const PROCESSING: &str = "Component/Pipeline/DataProcessing[ms|render]";
}
