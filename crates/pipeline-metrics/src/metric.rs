//! Running statistical summary of timed operations.

use serde::{Deserialize, Serialize};

/// Running summary of observations in milliseconds.
///
/// An empty metric has `min = +inf` and `max = -inf` so the first
/// observation always replaces both.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub min: f64,
    pub max: f64,
    pub total: f64,
    pub count: u64,
    pub sum_of_squares: f64,
}

impl Metric {
    /// The empty summary.
    pub const fn identity() -> Self {
        Self {
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            total: 0.0,
            count: 0,
            sum_of_squares: 0.0,
        }
    }

    /// Fold one observation into the summary.
    pub fn record(&mut self, ms: f64) {
        self.min = self.min.min(ms);
        self.max = self.max.max(ms);
        self.total += ms;
        self.count += 1;
        self.sum_of_squares += ms * ms;
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Return to the empty summary.
    pub fn reset(&mut self) {
        *self = Self::identity();
    }
}

impl Default for Metric {
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_values() {
        let metric = Metric::default();
        assert_eq!(metric.min, f64::INFINITY);
        assert_eq!(metric.max, f64::NEG_INFINITY);
        assert_eq!(metric.total, 0.0);
        assert_eq!(metric.count, 0);
        assert_eq!(metric.sum_of_squares, 0.0);
        assert!(metric.is_empty());
    }

    #[test]
    fn test_record_aggregates() {
        let mut metric = Metric::identity();
        for ms in [4.0, 1.0, 7.0] {
            metric.record(ms);
        }

        assert_eq!(metric.count, 3);
        assert_eq!(metric.min, 1.0);
        assert_eq!(metric.max, 7.0);
        assert_eq!(metric.total, 12.0);
        assert_eq!(metric.sum_of_squares, 66.0);
    }

    #[test]
    fn test_reset_returns_to_identity() {
        let mut metric = Metric::identity();
        metric.record(3.0);
        metric.reset();
        assert_eq!(metric, Metric::identity());
    }
}
