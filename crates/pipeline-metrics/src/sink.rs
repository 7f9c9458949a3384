//! Destinations for reported metric snapshots.

use metrics::{counter, gauge};
use tracing::info;

use crate::Metric;

/// Receives one snapshot per non-empty metric on every report.
pub trait TelemetrySink: Send + Sync {
    fn log_metric(&self, name: &str, metric: &Metric);
}

/// Emits each snapshot as a structured log event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl TelemetrySink for TracingSink {
    fn log_metric(&self, name: &str, metric: &Metric) {
        info!(
            metric = name,
            count = metric.count,
            total_ms = metric.total,
            min_ms = metric.min,
            max_ms = metric.max,
            sum_of_squares = metric.sum_of_squares,
            "Pipeline metric"
        );
    }
}

/// Publishes snapshots through the `metrics` facade.
///
/// Window values are gauges labelled with the metric name; observation counts
/// also accumulate into a counter across windows.
#[derive(Debug, Default, Clone, Copy)]
pub struct PrometheusSink;

impl TelemetrySink for PrometheusSink {
    fn log_metric(&self, name: &str, metric: &Metric) {
        let label = name.to_string();
        gauge!("pipeline_metric_count", "metric" => label.clone()).set(metric.count as f64);
        gauge!("pipeline_metric_total_ms", "metric" => label.clone()).set(metric.total);
        gauge!("pipeline_metric_min_ms", "metric" => label.clone()).set(metric.min);
        gauge!("pipeline_metric_max_ms", "metric" => label.clone()).set(metric.max);
        gauge!("pipeline_metric_sum_of_squares", "metric" => label.clone())
            .set(metric.sum_of_squares);
        counter!("pipeline_metric_observations_total", "metric" => label).increment(metric.count);
    }
}
