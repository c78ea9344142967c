use std::collections::BTreeMap;
use std::time::Duration;

use crate::errors::ErrorCategory;
use crate::percentiles::PercentileStats;
use crate::probe::ProbeResult;

/// Aggregate statistics over one run's probe results.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub total: usize,
    pub success: usize,
    pub failure: usize,
    /// Mean over all results, error results contributing 0.
    pub avg_duration_secs: f64,
    pub requests_per_second: f64,
    /// Wall-clock span of the dispatch phase.
    pub elapsed: Duration,
    pub status_counts: BTreeMap<u16, usize>,
    pub error_counts: BTreeMap<ErrorCategory, usize>,
    /// Percentiles over probes that completed with a readable response.
    pub latency: Option<PercentileStats>,
}

impl Summary {
    pub fn from_results(results: &[ProbeResult], elapsed: Duration) -> Self {
        let total = results.len();
        let success = results.iter().filter(|r| r.is_success()).count();

        let avg_duration_secs = if total == 0 {
            0.0
        } else {
            results.iter().map(ProbeResult::duration_secs).sum::<f64>() / total as f64
        };

        let elapsed_secs = elapsed.as_secs_f64();
        let requests_per_second = if elapsed_secs > 0.0 {
            total as f64 / elapsed_secs
        } else {
            0.0
        };

        let mut status_counts = BTreeMap::new();
        let mut error_counts = BTreeMap::new();
        for r in results {
            *status_counts.entry(r.status).or_insert(0) += 1;
            if let Some(category) = r.error {
                *error_counts.entry(category).or_insert(0) += 1;
            }
        }

        let latency = PercentileStats::from_durations(
            results
                .iter()
                .filter(|r| r.error.is_none())
                .map(|r| r.duration),
        );

        Self {
            total,
            success,
            failure: total - success,
            avg_duration_secs,
            requests_per_second,
            elapsed,
            status_counts,
            error_counts,
            latency,
        }
    }
}
