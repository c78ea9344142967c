use std::env;

use tracing_subscriber::EnvFilter;

use invoice_loadtest::client::build_client;
use invoice_loadtest::config::Config;
use invoice_loadtest::driver::{run, RunOutcome};
use invoice_loadtest::metrics::{gather_metrics_string, register_metrics};
use invoice_loadtest::report::print_report;

/// Prints helpful configuration documentation.
fn print_config_help() {
    eprintln!("Optional environment variables:");
    eprintln!("  BASE_URL                 - API root (default: http://localhost:8080/api)");
    eprintln!("  HEALTH_URL               - Health endpoint (default: BASE_URL with /api -> /actuator/health)");
    eprintln!("  CONCURRENCY              - Concurrent probes and pool size (default: 50, must be > 0)");
    eprintln!("  REQUEST_TIMEOUT          - Per-request timeout: 500ms, 30s, 2m (default: 30s)");
    eprintln!("  HEALTH_TIMEOUT           - Health check timeout (default: 2s)");
    eprintln!("  SKIP_HEALTH_CHECK        - Skip the health check: true or false (default: false)");
    eprintln!("  REGISTRATION_RETRIES     - Extra registration attempts (default: 0)");
    eprintln!("  REGISTRATION_RETRY_DELAY - Delay between registration attempts (default: 1s)");
    eprintln!("  LOADTEST_PASSWORD        - Password for the registered account");
    eprintln!();
    eprintln!("Client configuration:");
    eprintln!("  SKIP_TLS_VERIFY          - Skip TLS certificate verification (default: false)");
    eprintln!("  RESOLVE_TARGET_ADDR      - DNS override: hostname:ip:port");
    eprintln!("  CUSTOM_HEADERS           - Comma-separated headers (use \\, for literal commas)");
    eprintln!();
    eprintln!("Output:");
    eprintln!("  PRINT_METRICS            - Dump Prometheus metrics after the summary (default: false)");
    eprintln!("  LOG_FORMAT               - 'json' for JSON logs (default: text)");
    eprintln!("  RUST_LOG                 - Log filter (default: warn)");
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let json = env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    init_tracing();

    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}\n", e);
            print_config_help();
            std::process::exit(1);
        }
    };

    let registry = prometheus::default_registry();
    register_metrics(registry)?;

    let client_result = build_client(&config.to_client_config())?;
    config.print_summary(&client_result.parsed_headers);

    match run(&client_result.client, &config).await {
        RunOutcome::Completed(summary) => {
            print_report(&summary);
            if config.print_metrics {
                println!("\n--- FINAL METRICS ---\n{}", gather_metrics_string(registry));
                println!("--- END OF FINAL METRICS ---");
            }
        }
        // Already explained on stdout; an aborted run still exits cleanly.
        RunOutcome::Aborted(_) => {}
    }

    Ok(())
}
