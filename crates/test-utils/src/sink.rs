use std::sync::Mutex;

use pipeline_metrics::{Metric, TelemetrySink};

/// Keeps every metric forwarded by a report.
#[derive(Debug, Default)]
pub struct RecordingSink {
    seen: Mutex<Vec<(String, Metric)>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seen(&self) -> Vec<(String, Metric)> {
        self.seen.lock().unwrap().clone()
    }

    /// Names forwarded so far, in order.
    pub fn names(&self) -> Vec<String> {
        self.seen().into_iter().map(|(name, _)| name).collect()
    }
}

impl TelemetrySink for RecordingSink {
    fn log_metric(&self, name: &str, metric: &Metric) {
        self.seen.lock().unwrap().push((name.to_string(), *metric));
    }
}
