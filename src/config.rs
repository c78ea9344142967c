use std::env;
use tokio::time::Duration;

use reqwest::Url;

use crate::client::ClientConfig;
use crate::connection_pool::PoolConfig;
use crate::errors::ConfigError;
use crate::utils::{parse_duration_string, parse_flag};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/api";
pub const DEFAULT_CONCURRENCY: usize = 50;
pub const DEFAULT_PASSWORD: &str = "Password123!";

const HEALTH_PATH: &str = "/actuator/health";

/// Main configuration for the load test.
#[derive(Debug, Clone)]
pub struct Config {
    /// API root, without a trailing slash.
    pub base_url: String,
    pub health_url: Option<String>,
    pub concurrency: usize,
    pub request_timeout: Duration,
    pub health_timeout: Duration,
    pub skip_health_check: bool,
    pub registration_retries: u32,
    pub registration_retry_delay: Duration,
    pub password: String,
    pub skip_tls_verify: bool,
    pub resolve_target_addr: Option<String>,
    pub custom_headers: Option<String>,
    pub print_metrics: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            health_url: None,
            concurrency: DEFAULT_CONCURRENCY,
            request_timeout: Duration::from_secs(30),
            health_timeout: Duration::from_secs(2),
            skip_health_check: false,
            registration_retries: 0,
            registration_retry_delay: Duration::from_secs(1),
            password: DEFAULT_PASSWORD.to_string(),
            skip_tls_verify: false,
            resolve_target_addr: None,
            custom_headers: None,
            print_metrics: false,
        }
    }
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let base_url = match env::var("BASE_URL") {
            Ok(v) => validate_url("BASE_URL", &v)?,
            Err(_) => defaults.base_url,
        };

        let health_url = env::var("HEALTH_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(|v| validate_url("HEALTH_URL", &v))
            .transpose()?;

        let concurrency = match env::var("CONCURRENCY") {
            Ok(v) => {
                let n: usize = v.trim().parse().map_err(|_| ConfigError::InvalidNumber {
                    var: "CONCURRENCY",
                    value: v.clone(),
                })?;
                if n == 0 {
                    return Err(ConfigError::OutOfRange {
                        var: "CONCURRENCY",
                        message: "must be greater than 0".to_string(),
                    });
                }
                n
            }
            Err(_) => defaults.concurrency,
        };

        let registration_retries = match env::var("REGISTRATION_RETRIES") {
            Ok(v) => v.trim().parse().map_err(|_| ConfigError::InvalidNumber {
                var: "REGISTRATION_RETRIES",
                value: v.clone(),
            })?,
            Err(_) => defaults.registration_retries,
        };

        Ok(Config {
            base_url,
            health_url,
            concurrency,
            request_timeout: duration_var("REQUEST_TIMEOUT", defaults.request_timeout)?,
            health_timeout: duration_var("HEALTH_TIMEOUT", defaults.health_timeout)?,
            skip_health_check: flag_var("SKIP_HEALTH_CHECK")?,
            registration_retries,
            registration_retry_delay: duration_var(
                "REGISTRATION_RETRY_DELAY",
                defaults.registration_retry_delay,
            )?,
            password: env::var("LOADTEST_PASSWORD").unwrap_or(defaults.password),
            skip_tls_verify: flag_var("SKIP_TLS_VERIFY")?,
            resolve_target_addr: env::var("RESOLVE_TARGET_ADDR").ok(),
            custom_headers: env::var("CUSTOM_HEADERS").ok(),
            print_metrics: flag_var("PRINT_METRICS")?,
        })
    }

    pub fn register_url(&self) -> String {
        format!("{}/auth/register", self.base_url)
    }

    pub fn invoices_url(&self) -> String {
        format!("{}/invoices", self.base_url)
    }

    /// Health endpoint: the explicit override, or derived from the base URL.
    pub fn health_url(&self) -> String {
        match &self.health_url {
            Some(url) => url.clone(),
            None => derive_health_url(&self.base_url),
        }
    }

    /// Creates a ClientConfig from this Config.
    pub fn to_client_config(&self) -> ClientConfig {
        ClientConfig {
            request_timeout: self.request_timeout,
            skip_tls_verify: self.skip_tls_verify,
            resolve_target_addr: self.resolve_target_addr.clone(),
            custom_headers: self.custom_headers.clone(),
            pool_config: PoolConfig::for_concurrency(self.concurrency),
        }
    }

    /// Prints the configuration summary.
    pub fn print_summary(&self, parsed_headers: &reqwest::header::HeaderMap) {
        println!("Load test configuration:");
        println!("  Base URL: {}", self.base_url);
        println!("  Probed endpoint: GET {}", self.invoices_url());
        if self.skip_health_check {
            println!("  Health check: skipped");
        } else {
            println!(
                "  Health check: {} (timeout {:?})",
                self.health_url(),
                self.health_timeout
            );
        }
        println!("  Concurrency: {}", self.concurrency);
        println!("  Request timeout: {:?}", self.request_timeout);
        println!("  Registration retries: {}", self.registration_retries);
        println!("  Skip TLS Verify: {}", self.skip_tls_verify);
        if parsed_headers.is_empty() {
            println!("  Custom Headers: none");
        } else {
            println!("  Custom Headers:");
            for (name, value) in parsed_headers.iter() {
                println!(
                    "    {}: {}",
                    name,
                    value.to_str().unwrap_or("<non-ASCII or sensitive value>")
                );
            }
        }
    }
}

/// Replaces a trailing `/api` path segment with the actuator health path.
///
/// Bases without an `/api` segment get the health path at the host root.
pub fn derive_health_url(base_url: &str) -> String {
    match Url::parse(base_url) {
        Ok(mut url) => {
            let path = url.path().trim_end_matches('/').to_string();
            let health_path = match path.strip_suffix("/api") {
                Some(prefix) => format!("{}{}", prefix, HEALTH_PATH),
                None => HEALTH_PATH.to_string(),
            };
            url.set_path(&health_path);
            url.set_query(None);
            url.to_string()
        }
        Err(_) => base_url.replace("/api", HEALTH_PATH),
    }
}

fn validate_url(var: &'static str, value: &str) -> Result<String, ConfigError> {
    let trimmed = value.trim().trim_end_matches('/');
    let invalid = || ConfigError::InvalidUrl {
        var,
        value: value.to_string(),
    };
    let url = Url::parse(trimmed).map_err(|_| invalid())?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(invalid());
    }
    Ok(trimmed.to_string())
}

fn duration_var(var: &'static str, default: Duration) -> Result<Duration, ConfigError> {
    match env::var(var) {
        Ok(v) => parse_duration_string(&v).map_err(|message| ConfigError::InvalidDuration {
            var,
            message,
        }),
        Err(_) => Ok(default),
    }
}

fn flag_var(var: &'static str) -> Result<bool, ConfigError> {
    match env::var(var) {
        Ok(v) => parse_flag(&v).ok_or(ConfigError::InvalidFlag { var, value: v }),
        Err(_) => Ok(false),
    }
}
