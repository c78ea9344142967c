//! Run orchestration: health check, provisioning, fan-out, fan-in.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::errors::{ErrorCategory, ProvisionError};
use crate::identity::{register, Credential};
use crate::probe::{probe, ProbeResult};
use crate::summary::Summary;

/// How a run ended.
#[derive(Debug)]
pub enum RunOutcome {
    Completed(Summary),
    /// No credential could be obtained; no probe was sent.
    Aborted(ProvisionError),
}

/// Executes one load-test pass and returns its outcome.
///
/// Progress is printed to stdout; the caller decides how to report the result.
pub async fn run(client: &reqwest::Client, config: &Config) -> RunOutcome {
    println!("Starting load test...");

    if !config.skip_health_check {
        check_health(client, config).await;
    }

    let registration = match register(client, config).await {
        Ok(r) => r,
        Err(e) => {
            match &e {
                ProvisionError::Transport(inner) => println!("Connection failed: {}", inner),
                other => println!("Registration failed: {}", other),
            }
            println!("Could not get token. Is the server running?");
            return RunOutcome::Aborted(e);
        }
    };
    println!("Registered user: {}", registration.email);

    let url = config.invoices_url();
    println!(
        "Running {} concurrent requests to GET {}...",
        config.concurrency, url
    );

    let credential = Arc::new(registration.credential);
    let start = Instant::now();
    let results = dispatch(client, &url, credential, config.concurrency).await;
    let elapsed = start.elapsed();

    info!(
        total = results.len(),
        elapsed_ms = elapsed.as_millis() as u64,
        "Dispatch phase finished"
    );

    RunOutcome::Completed(Summary::from_results(&results, elapsed))
}

/// Best-effort liveness ping. Never stops the run.
pub async fn check_health(client: &reqwest::Client, config: &Config) -> bool {
    let health_url = config.health_url();
    let outcome = client
        .get(&health_url)
        .timeout(config.health_timeout)
        .send()
        .await
        .and_then(|r| r.error_for_status());

    match outcome {
        Ok(response) => {
            debug!(url = %health_url, status_code = response.status().as_u16(), "Health check passed");
            true
        }
        Err(e) => {
            warn!(url = %health_url, error = %e, "Health check failed");
            println!(
                "Warning: Server might not be running at {}. Proceeding anyway...",
                health_url
            );
            false
        }
    }
}

/// Fires exactly `concurrency` probes at once and collects them in completion order.
///
/// The semaphore holds one permit per probe, so no probe waits for a slot.
pub async fn dispatch(
    client: &reqwest::Client,
    url: &str,
    credential: Arc<Credential>,
    concurrency: usize,
) -> Vec<ProbeResult> {
    let permits = Arc::new(Semaphore::new(concurrency));
    let url: Arc<str> = Arc::from(url);
    let mut tasks = JoinSet::new();

    for task_id in 0..concurrency {
        let client = client.clone();
        let url = Arc::clone(&url);
        let credential = Arc::clone(&credential);
        let permits = Arc::clone(&permits);

        tasks.spawn(async move {
            // The semaphore is never closed while tasks are alive.
            let _permit = permits.acquire_owned().await.ok();
            let result = probe(&client, &url, &credential).await;
            debug!(task_id, status_code = result.status, "Probe task finished");
            result
        });
    }

    let mut results = Vec::with_capacity(concurrency);
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(result) => results.push(result),
            Err(e) => {
                error!(error = %e, "Probe task did not complete");
                results.push(ProbeResult::transport_failure(ErrorCategory::OtherError));
            }
        }
    }

    results
}
