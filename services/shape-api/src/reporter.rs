//! Periodic pipeline reporting.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::state::AppState;

/// Report pipeline metrics every `period` until `cancel` fires.
///
/// The first report is taken one full period after start. A final report is
/// taken on shutdown so the last partial window is not lost.
pub async fn run_reporter(state: Arc<AppState>, period: Duration, cancel: CancellationToken) {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(period_secs = period.as_secs(), "Pipeline reporter started");

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                let report = state.report().await;
                info!(
                    guid = %report.guid,
                    name = %report.name,
                    duration_secs = report.duration,
                    metrics = report.metrics.len(),
                    "Pipeline report"
                );
            }
        }
    }

    let report = state.report().await;
    info!(
        metrics = report.metrics.len(),
        "Pipeline reporter stopped"
    );
}
