//! Latency and pausable timers.
//!
//! Timers read `tokio::time::Instant`, so tests can drive them with a paused
//! runtime clock.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::Instant;

use crate::context::lock;
use crate::Metric;

pub(crate) type SharedMetric = Arc<Mutex<Metric>>;

fn as_millis(duration: Duration) -> f64 {
    duration.as_nanos() as f64 / 1_000_000.0
}

/// Factory for one-shot latency measurements against a named metric.
#[derive(Debug, Clone)]
pub struct LatencyTimer {
    name: Arc<str>,
    metric: SharedMetric,
}

impl LatencyTimer {
    pub(crate) fn new(name: Arc<str>, metric: SharedMetric) -> Self {
        Self { name, metric }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Begin timing. The returned guard records when stopped.
    pub fn start(&self) -> LatencyStop {
        LatencyStop {
            metric: Arc::clone(&self.metric),
            started: Instant::now(),
        }
    }
}

/// An in-flight latency measurement.
///
/// Stopping consumes the guard, so a measurement is recorded at most once.
/// Dropping it without stopping records nothing.
#[must_use = "a latency measurement is only recorded when stopped"]
#[derive(Debug)]
pub struct LatencyStop {
    metric: SharedMetric,
    started: Instant,
}

impl LatencyStop {
    /// Record the elapsed time into the metric and return it.
    pub fn stop(self) -> Duration {
        let elapsed = self.started.elapsed();
        lock(&self.metric).record(as_millis(elapsed));
        elapsed
    }
}

/// Factory for pausable handles against a named metric.
#[derive(Debug, Clone)]
pub struct PausableTimer {
    name: Arc<str>,
    metric: SharedMetric,
}

impl PausableTimer {
    pub(crate) fn new(name: Arc<str>, metric: SharedMetric) -> Self {
        Self { name, metric }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Create an independent, initially paused handle.
    pub fn handle(&self) -> PausableHandle {
        PausableHandle {
            metric: Arc::clone(&self.metric),
            resumed_at: None,
            accumulated: Duration::ZERO,
        }
    }
}

/// Accumulates active time across start/pause cycles.
///
/// `stop` folds any running interval and records the accumulated total as a
/// single observation.
#[must_use = "accumulated time is only recorded when stopped"]
#[derive(Debug)]
pub struct PausableHandle {
    metric: SharedMetric,
    resumed_at: Option<Instant>,
    accumulated: Duration,
}

impl PausableHandle {
    /// Mark a resume point. No-op while already running.
    pub fn start(&mut self) {
        if !self.is_running() {
            self.resumed_at = Some(Instant::now());
        }
    }

    /// Add the time since the last resume point to the total. No-op while
    /// paused.
    pub fn pause(&mut self) {
        if let Some(resumed_at) = self.resumed_at.take() {
            self.accumulated += resumed_at.elapsed();
        }
    }

    pub fn is_running(&self) -> bool {
        self.resumed_at.is_some()
    }

    /// Active time so far, including a running interval.
    pub fn elapsed(&self) -> Duration {
        match self.resumed_at {
            Some(resumed_at) => self.accumulated + resumed_at.elapsed(),
            None => self.accumulated,
        }
    }

    /// Fold the accumulated total into the metric and return it.
    pub fn stop(self) -> Duration {
        let total = self.elapsed();
        lock(&self.metric).record(as_millis(total));
        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MetricsContext;

    #[tokio::test(start_paused = true)]
    async fn test_latency_records_elapsed() {
        let ctx = MetricsContext::new("test");
        let timer = ctx.new_latency_timer("latency");

        let stop = timer.start();
        tokio::time::advance(Duration::from_millis(25)).await;
        let elapsed = stop.stop();

        assert_eq!(elapsed, Duration::from_millis(25));
        let metric = ctx.metric("latency").unwrap();
        assert_eq!(metric.count, 1);
        assert_eq!(metric.total, 25.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_latency_dropped_without_stop_records_nothing() {
        let ctx = MetricsContext::new("test");
        let timer = ctx.new_latency_timer("latency");

        drop(timer.start());

        assert!(ctx.metric("latency").unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_pausable_accumulates_only_active_time() {
        let ctx = MetricsContext::new("test");
        let timer = ctx.new_pausable_timer("db");
        let mut handle = timer.handle();

        handle.start();
        tokio::time::advance(Duration::from_millis(10)).await;
        handle.pause();

        // Paused time is not counted
        tokio::time::advance(Duration::from_millis(100)).await;

        handle.start();
        tokio::time::advance(Duration::from_millis(5)).await;
        handle.pause();

        assert_eq!(handle.elapsed(), Duration::from_millis(15));
        assert_eq!(handle.stop(), Duration::from_millis(15));

        let metric = ctx.metric("db").unwrap();
        assert_eq!(metric.count, 1);
        assert_eq!(metric.total, 15.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pausable_stop_folds_running_interval() {
        let ctx = MetricsContext::new("test");
        let timer = ctx.new_pausable_timer("proc");
        let mut handle = timer.handle();

        handle.start();
        tokio::time::advance(Duration::from_millis(3)).await;
        handle.pause();
        handle.start();
        tokio::time::advance(Duration::from_millis(4)).await;
        assert!(handle.is_running());

        assert_eq!(handle.stop(), Duration::from_millis(7));
        assert_eq!(ctx.metric("proc").unwrap().total, 7.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_and_start_are_idempotent() {
        let ctx = MetricsContext::new("test");
        let timer = ctx.new_pausable_timer("proc");
        let mut handle = timer.handle();

        handle.pause();
        handle.start();
        tokio::time::advance(Duration::from_millis(2)).await;
        handle.start();
        tokio::time::advance(Duration::from_millis(2)).await;
        handle.pause();
        handle.pause();

        assert_eq!(handle.elapsed(), Duration::from_millis(4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_independent_handles_share_metric() {
        let ctx = MetricsContext::new("test");
        let timer = ctx.new_pausable_timer("db");

        let mut a = timer.handle();
        let mut b = timer.handle();
        a.start();
        b.start();
        tokio::time::advance(Duration::from_millis(6)).await;
        a.pause();
        tokio::time::advance(Duration::from_millis(2)).await;

        a.stop();
        b.stop();

        let metric = ctx.metric("db").unwrap();
        assert_eq!(metric.count, 2);
        assert_eq!(metric.min, 6.0);
        assert_eq!(metric.max, 8.0);
    }
}
