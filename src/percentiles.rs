//! Latency percentiles using HDR Histogram.
//!
//! Built once from the collected probe durations after every worker has
//! finished, so no locking is involved. Values are stored in microseconds.

use hdrhistogram::Histogram;
use std::time::Duration;
use tracing::warn;

/// Upper bound of the histogram: 10 minutes.
const MAX_LATENCY_US: u64 = 600_000_000;

/// Percentile statistics for a set of latency measurements (microseconds).
#[derive(Debug, Clone, PartialEq)]
pub struct PercentileStats {
    pub count: u64,
    pub min: u64,
    pub max: u64,
    pub mean: f64,
    pub p50: u64,
    pub p90: u64,
    pub p95: u64,
    pub p99: u64,
}

impl PercentileStats {
    /// Computes percentiles over the given durations.
    ///
    /// Returns `None` when there are no samples.
    pub fn from_durations<I>(durations: I) -> Option<Self>
    where
        I: IntoIterator<Item = Duration>,
    {
        let mut hist = match Histogram::<u64>::new_with_bounds(1, MAX_LATENCY_US, 3) {
            Ok(h) => h,
            Err(e) => {
                warn!(error = %e, "Failed to create latency histogram");
                return None;
            }
        };

        for d in durations {
            let us = u64::try_from(d.as_micros()).unwrap_or(MAX_LATENCY_US);
            if let Err(e) = hist.record(us.clamp(1, MAX_LATENCY_US)) {
                warn!(latency_us = us, error = %e, "Failed to record latency");
            }
        }

        if hist.is_empty() {
            return None;
        }

        Some(Self {
            count: hist.len(),
            min: hist.min(),
            max: hist.max(),
            mean: hist.mean(),
            p50: hist.value_at_quantile(0.50),
            p90: hist.value_at_quantile(0.90),
            p95: hist.value_at_quantile(0.95),
            p99: hist.value_at_quantile(0.99),
        })
    }

    /// One-line rendering in milliseconds.
    pub fn format(&self) -> String {
        format!(
            "p50={:.2}ms p90={:.2}ms p95={:.2}ms p99={:.2}ms max={:.2}ms (n={})",
            ms(self.p50),
            ms(self.p90),
            ms(self.p95),
            ms(self.p99),
            ms(self.max),
            self.count,
        )
    }
}

fn ms(us: u64) -> f64 {
    us as f64 / 1000.0
}
