use std::fmt::Write;

use crate::errors::status_reason;
use crate::summary::Summary;

const SEPARATOR_WIDTH: usize = 30;

/// Renders the end-of-run summary block.
pub fn format_report(summary: &Summary) -> String {
    let separator = "-".repeat(SEPARATOR_WIDTH);
    let mut out = String::new();

    // Writing to a String cannot fail.
    let _ = writeln!(out, "{}", separator);
    let _ = writeln!(
        out,
        "Load test completed in {:.2} seconds",
        summary.elapsed.as_secs_f64()
    );
    let _ = writeln!(out, "Total Requests: {}", summary.total);
    let _ = writeln!(out, "Successful Requests: {}", summary.success);
    let _ = writeln!(out, "Failed Requests: {}", summary.failure);
    let _ = writeln!(
        out,
        "Average Request Duration: {:.4} seconds",
        summary.avg_duration_secs
    );
    let _ = writeln!(out, "Requests/Second: {:.2}", summary.requests_per_second);

    if let Some(latency) = &summary.latency {
        let _ = writeln!(out, "Latency: {}", latency.format());
    }

    if summary.status_counts.len() > 1 || summary.failure > 0 {
        let _ = writeln!(out, "Status Codes:");
        for (status, count) in &summary.status_counts {
            let _ = writeln!(out, "  {} {}: {}", status, status_reason(*status), count);
        }
    }

    if !summary.error_counts.is_empty() {
        let _ = writeln!(out, "Failures by Category:");
        for (category, count) in &summary.error_counts {
            let _ = writeln!(out, "  {}: {}", category.description(), count);
        }
    }

    let _ = writeln!(out, "{}", separator);
    out
}

pub fn print_report(summary: &Summary) {
    print!("{}", format_report(summary));
}
