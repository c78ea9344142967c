use prometheus::{
    Encoder, Gauge, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry,
    TextEncoder,
};

pub const METRIC_NAMESPACE: &str = "invoice_loadtest";

lazy_static::lazy_static! {
    // === Probe Metrics ===

    pub static ref PROBES_TOTAL: IntCounter =
        IntCounter::with_opts(
            Opts::new("probes_total", "Total number of probe requests dispatched")
                .namespace(METRIC_NAMESPACE)
        ).unwrap();

    pub static ref PROBE_STATUS_CODES: IntCounterVec =
        IntCounterVec::new(
            Opts::new("probe_status_codes_total", "Probe results by HTTP status code")
                .namespace(METRIC_NAMESPACE),
            &["status_code"]
        ).unwrap();

    pub static ref PROBE_ERRORS_BY_CATEGORY: IntCounterVec =
        IntCounterVec::new(
            Opts::new("probe_errors_total", "Failed probes by error category")
                .namespace(METRIC_NAMESPACE),
            &["category"]
        ).unwrap();

    pub static ref PROBES_IN_FLIGHT: Gauge =
        Gauge::with_opts(
            Opts::new("probes_in_flight", "Number of probe requests currently in flight")
                .namespace(METRIC_NAMESPACE)
        ).unwrap();

    pub static ref PROBE_DURATION_SECONDS: Histogram =
        Histogram::with_opts(
            HistogramOpts::new(
                "probe_duration_seconds",
                "Latency of probes that completed with a readable response."
            ).namespace(METRIC_NAMESPACE)
        ).unwrap();

    // === Provisioning Metrics ===

    pub static ref REGISTRATION_ATTEMPTS: IntCounterVec =
        IntCounterVec::new(
            Opts::new("registration_attempts_total", "Test account registration attempts")
                .namespace(METRIC_NAMESPACE),
            &["outcome"]  // outcome: success, rejected, transport, missing_token
        ).unwrap();
}

/// Registers all metrics with the given registry.
pub fn register_metrics(registry: &Registry) -> Result<(), prometheus::Error> {
    registry.register(Box::new(PROBES_TOTAL.clone()))?;
    registry.register(Box::new(PROBE_STATUS_CODES.clone()))?;
    registry.register(Box::new(PROBE_ERRORS_BY_CATEGORY.clone()))?;
    registry.register(Box::new(PROBES_IN_FLIGHT.clone()))?;
    registry.register(Box::new(PROBE_DURATION_SECONDS.clone()))?;
    registry.register(Box::new(REGISTRATION_ATTEMPTS.clone()))?;
    Ok(())
}

/// Encodes the registry in the Prometheus text exposition format.
pub fn gather_metrics_string(registry: &Registry) -> String {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&registry.gather(), &mut buffer) {
        return format!("# ERROR ENCODING METRICS: {}", e);
    }
    String::from_utf8(buffer)
        .unwrap_or_else(|_| String::from("# ERROR ENCODING METRICS TO UTF-8"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_into_fresh_registry() {
        let registry = Registry::new();
        register_metrics(&registry).unwrap();
        PROBE_STATUS_CODES.with_label_values(&["200"]).inc();

        let text = gather_metrics_string(&registry);
        assert!(text.contains("invoice_loadtest_probe_status_codes_total"));
        assert!(text.contains("status_code=\"200\""));
    }

    #[test]
    fn double_registration_fails() {
        let registry = Registry::new();
        register_metrics(&registry).unwrap();
        assert!(register_metrics(&registry).is_err());
    }
}
