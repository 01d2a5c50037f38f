//! Turns raw timestamps and counts into the end-of-run summary.

use std::{
    fmt,
    time::{Duration, SystemTime},
};

use serde::Serialize;

/// Throughput summary for one completed run.
#[derive(Clone, Debug, Serialize)]
pub struct RunReport {
    /// Submissions acknowledged by an endpoint.
    pub sent: u64,
    /// Transactions confirmed on chain by the end of the run.
    pub confirmed: u64,
    /// `None` when the clock went backwards between start and completion.
    pub elapsed: Option<Duration>,
    /// Confirmed transactions per second. `None` when elapsed is missing
    /// or zero; a report never invents a rate it cannot stand behind.
    pub throughput: Option<f64>,
}

impl RunReport {
    pub fn new(
        sent: u64,
        confirmed: u64,
        started_at: SystemTime,
        completed_at: SystemTime,
    ) -> Self {
        let elapsed = completed_at.duration_since(started_at).ok();
        let throughput = elapsed.and_then(|elapsed| {
            let secs = elapsed.as_secs_f64();
            let rate = confirmed as f64 / secs;
            (secs > 0.0 && rate.is_finite()).then_some(rate)
        });
        Self {
            sent,
            confirmed,
            elapsed,
            throughput,
        }
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.elapsed, self.throughput) {
            (Some(elapsed), Some(throughput)) => write!(
                f,
                "Processed {} of {} transactions in {:.3}s, {:.2} tx/s",
                self.confirmed,
                self.sent,
                elapsed.as_secs_f64(),
                throughput,
            ),
            _ => write!(
                f,
                "Processed {} of {} transactions, throughput undefined",
                self.confirmed, self.sent
            ),
        }
    }
}
