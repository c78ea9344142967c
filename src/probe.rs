use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use tokio::time::{Duration, Instant};
use tracing::debug;

use crate::errors::ErrorCategory;
use crate::identity::Credential;
use crate::metrics::{
    PROBES_IN_FLIGHT, PROBES_TOTAL, PROBE_DURATION_SECONDS, PROBE_ERRORS_BY_CATEGORY,
    PROBE_STATUS_CODES,
};

/// Status recorded when no HTTP response was obtained.
pub const TRANSPORT_FAILURE_STATUS: u16 = 500;

/// Outcome of one probe.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbeResult {
    pub status: u16,
    pub duration: Duration,
    pub error: Option<ErrorCategory>,
}

impl ProbeResult {
    /// A response that was fully read.
    pub fn completed(status: u16, duration: Duration) -> Self {
        Self {
            status,
            duration,
            error: ErrorCategory::from_status_code(status),
        }
    }

    /// An HTTP error response. Its latency is not recorded.
    pub fn http_error(status: u16) -> Self {
        Self {
            status,
            duration: Duration::ZERO,
            error: Some(ErrorCategory::from_status_code(status).unwrap_or(ErrorCategory::OtherError)),
        }
    }

    /// No usable response at all.
    pub fn transport_failure(category: ErrorCategory) -> Self {
        Self {
            status: TRANSPORT_FAILURE_STATUS,
            duration: Duration::ZERO,
            error: Some(category),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == 200
    }

    pub fn duration_secs(&self) -> f64 {
        self.duration.as_secs_f64()
    }
}

/// Issues one authenticated GET and classifies the outcome. Never fails.
pub async fn probe(client: &reqwest::Client, url: &str, credential: &Credential) -> ProbeResult {
    PROBES_TOTAL.inc();
    PROBES_IN_FLIGHT.inc();

    let result = send_probe(client, url, credential).await;

    PROBES_IN_FLIGHT.dec();
    PROBE_STATUS_CODES
        .with_label_values(&[status_label(result.status, result.error)])
        .inc();
    if let Some(category) = result.error {
        PROBE_ERRORS_BY_CATEGORY
            .with_label_values(&[category.label()])
            .inc();
    } else {
        PROBE_DURATION_SECONDS.observe(result.duration_secs());
    }

    result
}

async fn send_probe(client: &reqwest::Client, url: &str, credential: &Credential) -> ProbeResult {
    let start = Instant::now();

    let request = client
        .get(url)
        .header(AUTHORIZATION, credential.bearer())
        .header(CONTENT_TYPE, "application/json");

    let mut response = match request.send().await {
        Ok(r) => r,
        Err(e) => {
            let category = ErrorCategory::from_reqwest_error(&e);
            debug!(url = %url, error = %e, category = category.label(), "Probe failed");
            return ProbeResult::transport_failure(category);
        }
    };

    let status = response.status().as_u16();
    if status >= 400 {
        debug!(url = %url, status_code = status, "Probe got HTTP error response");
        return ProbeResult::http_error(status);
    }

    // Timing covers the full body transfer, streamed and discarded.
    loop {
        match response.chunk().await {
            Ok(Some(_chunk)) => {}
            Ok(None) => break,
            Err(e) => {
                let category = ErrorCategory::from_reqwest_error(&e);
                debug!(url = %url, error = %e, category = category.label(), "Probe body read failed");
                return ProbeResult::transport_failure(category);
            }
        }
    }

    let duration = start.elapsed();
    debug!(url = %url, status_code = status, duration_ms = duration.as_millis() as u64, "Probe completed");
    ProbeResult::completed(status, duration)
}

/// Static label for the status code metric.
fn status_label(code: u16, error: Option<ErrorCategory>) -> &'static str {
    if code == TRANSPORT_FAILURE_STATUS
        && !matches!(error, Some(ErrorCategory::ServerError))
    {
        return "transport_error";
    }
    match code {
        200 => "200",
        201 => "201",
        204 => "204",
        301 => "301",
        302 => "302",
        304 => "304",
        400 => "400",
        401 => "401",
        403 => "403",
        404 => "404",
        429 => "429",
        500 => "500",
        502 => "502",
        503 => "503",
        504 => "504",
        _ => "other",
    }
}
