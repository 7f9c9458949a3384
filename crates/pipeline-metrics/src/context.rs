//! Metric registry and periodic reporting.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::debug;

use crate::timer::SharedMetric;
use crate::{LatencyTimer, Metric, PausableTimer, TelemetrySink};

/// Lock a mutex, recovering the data if a holder panicked.
///
/// Metric updates are plain arithmetic, so a poisoned summary is still usable.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Owns the named metrics of one pipeline and reports them.
///
/// The service creates one context at startup and injects it (behind an
/// `Arc`) into every data source. Timers created from it update its metrics;
/// [`report`](Self::report) is the single reader that snapshots and resets.
pub struct MetricsContext {
    component: String,
    guid: String,
    registry: Mutex<BTreeMap<String, SharedMetric>>,
    last_report: Mutex<Instant>,
    sinks: Vec<Arc<dyn TelemetrySink>>,
}

impl MetricsContext {
    /// Create a context for a named component with no sinks.
    pub fn new(component: impl Into<String>) -> Self {
        let component = component.into();
        Self {
            guid: format!("{}.pipeline", component),
            component,
            registry: Mutex::new(BTreeMap::new()),
            last_report: Mutex::new(Instant::now()),
            sinks: Vec::new(),
        }
    }

    /// Use `<prefix>.pipeline` as the report GUID.
    pub fn with_guid_prefix(mut self, prefix: &str) -> Self {
        self.guid = format!("{}.pipeline", prefix);
        self
    }

    /// Forward every reported metric to `sink`.
    pub fn with_sink(mut self, sink: Arc<dyn TelemetrySink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Display name used in reports.
    pub fn name(&self) -> String {
        format!("tileserver pipeline:{}", self.component)
    }

    pub fn guid(&self) -> &str {
        &self.guid
    }

    /// Register a metric, reusing it if the name already exists.
    fn register(&self, name: &str) -> SharedMetric {
        let mut registry = lock(&self.registry);
        Arc::clone(
            registry
                .entry(name.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(Metric::identity()))),
        )
    }

    pub fn new_latency_timer(&self, name: &str) -> LatencyTimer {
        LatencyTimer::new(Arc::from(name), self.register(name))
    }

    pub fn new_pausable_timer(&self, name: &str) -> PausableTimer {
        PausableTimer::new(Arc::from(name), self.register(name))
    }

    /// Current value of a registered metric.
    pub fn metric(&self, name: &str) -> Option<Metric> {
        let registry = lock(&self.registry);
        registry.get(name).map(|metric| *lock(metric))
    }

    /// Names of all registered metrics, sorted.
    pub fn metric_names(&self) -> Vec<String> {
        lock(&self.registry).keys().cloned().collect()
    }

    /// Snapshot, forward and reset every metric.
    ///
    /// Metrics without observations since the previous report are left out
    /// of the snapshot. The returned duration covers the time since the
    /// previous call (or since the context was created).
    pub fn report(&self) -> PipelineReport {
        let duration_secs = {
            let mut last_report = lock(&self.last_report);
            let now = Instant::now();
            let elapsed = now.duration_since(*last_report);
            *last_report = now;
            elapsed.as_secs_f64()
        };

        let mut metrics = BTreeMap::new();
        {
            let registry = lock(&self.registry);
            for (name, shared) in registry.iter() {
                let mut metric = lock(shared);
                if metric.count > 0 {
                    metrics.insert(name.clone(), *metric);
                }
                metric.reset();
            }
        }

        for (name, metric) in &metrics {
            for sink in &self.sinks {
                sink.log_metric(name, metric);
            }
        }

        debug!(
            component = %self.component,
            reported = metrics.len(),
            duration_secs,
            "Reported pipeline metrics"
        );

        PipelineReport {
            guid: self.guid.clone(),
            name: self.name(),
            duration: duration_secs,
            reported_at: Utc::now(),
            metrics,
        }
    }
}

impl std::fmt::Debug for MetricsContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsContext")
            .field("component", &self.component)
            .field("guid", &self.guid)
            .field("metrics", &self.metric_names())
            .field("sinks", &self.sinks.len())
            .finish()
    }
}

/// One reporting window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineReport {
    pub guid: String,
    pub name: String,
    /// Seconds since the previous report.
    pub duration: f64,
    pub reported_at: DateTime<Utc>,
    pub metrics: BTreeMap<String, Metric>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[derive(Default)]
    struct CollectingSink {
        seen: Mutex<Vec<(String, Metric)>>,
    }

    impl TelemetrySink for CollectingSink {
        fn log_metric(&self, name: &str, metric: &Metric) {
            self.seen.lock().unwrap().push((name.to_string(), *metric));
        }
    }

    #[test]
    fn test_register_reuses_existing_metric() {
        let ctx = MetricsContext::new("test");
        let a = ctx.new_latency_timer("shared");
        let b = ctx.new_pausable_timer("shared");

        drop(a.start());
        b.handle().stop();

        assert_eq!(ctx.metric_names(), vec!["shared".to_string()]);
        assert_eq!(ctx.metric("shared").unwrap().count, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_report_snapshots_and_resets() {
        let sink = Arc::new(CollectingSink::default());
        let ctx = MetricsContext::new("localdata").with_sink(sink.clone());
        let latency = ctx.new_latency_timer("latency");
        let _idle = ctx.new_pausable_timer("idle");

        let durations = [5u64, 1, 9, 3];
        for ms in durations {
            let stop = latency.start();
            tokio::time::advance(Duration::from_millis(ms)).await;
            stop.stop();
        }

        let report = ctx.report();
        let metric = report.metrics["latency"];
        assert_eq!(metric.count, 4);
        assert_eq!(metric.total, 18.0);
        assert_eq!(metric.min, 1.0);
        assert_eq!(metric.max, 9.0);
        assert_eq!(metric.sum_of_squares, 116.0);

        // Empty metrics are omitted from the snapshot and never forwarded
        assert!(!report.metrics.contains_key("idle"));
        let seen = sink.seen.lock().unwrap().clone();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, "latency");

        // The next window starts from zero
        assert!(ctx.metric("latency").unwrap().is_empty());
        let stop = latency.start();
        tokio::time::advance(Duration::from_millis(2)).await;
        stop.stop();
        let next = ctx.report();
        assert_eq!(next.metrics["latency"].count, 1);
        assert_eq!(next.metrics["latency"].total, 2.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_report_duration_resets_each_call() {
        let ctx = MetricsContext::new("test").with_guid_prefix("org.example");
        tokio::time::advance(Duration::from_secs(30)).await;

        let first = ctx.report();
        assert_eq!(first.duration, 30.0);
        assert_eq!(first.guid, "org.example.pipeline");
        assert_eq!(first.name, "tileserver pipeline:test");

        tokio::time::advance(Duration::from_secs(10)).await;
        assert_eq!(ctx.report().duration, 10.0);
    }

    #[test]
    fn test_report_serializes_metric_map() {
        let ctx = MetricsContext::new("test");
        let timer = ctx.new_pausable_timer("db");
        timer.handle().stop();

        let json = serde_json::to_value(ctx.report()).unwrap();
        assert_eq!(json["metrics"]["db"]["count"], 1);
        assert!(json["duration"].is_number());
    }
}
