//! Environment-driven configuration.
//!
//! Every test mutates process environment, so all of them run serially.

use invoice_loadtest::config::Config;
use invoice_loadtest::errors::ConfigError;
use serial_test::serial;
use std::env;
use std::time::Duration;

/// Clear every variable Config::from_env reads.
fn clean_env() {
    for var in [
        "BASE_URL",
        "HEALTH_URL",
        "CONCURRENCY",
        "REQUEST_TIMEOUT",
        "HEALTH_TIMEOUT",
        "SKIP_HEALTH_CHECK",
        "REGISTRATION_RETRIES",
        "REGISTRATION_RETRY_DELAY",
        "LOADTEST_PASSWORD",
        "SKIP_TLS_VERIFY",
        "RESOLVE_TARGET_ADDR",
        "CUSTOM_HEADERS",
        "PRINT_METRICS",
    ] {
        env::remove_var(var);
    }
}

#[test]
#[serial]
fn defaults_without_environment() {
    clean_env();
    let config = Config::from_env().unwrap();

    assert_eq!(config.base_url, "http://localhost:8080/api");
    assert_eq!(config.concurrency, 50);
    assert_eq!(config.request_timeout, Duration::from_secs(30));
    assert_eq!(config.health_timeout, Duration::from_secs(2));
    assert_eq!(config.registration_retries, 0);
    assert_eq!(config.password, "Password123!");
    assert!(!config.skip_health_check);
    assert!(!config.skip_tls_verify);
    assert!(!config.print_metrics);
    assert_eq!(config.health_url(), "http://localhost:8080/actuator/health");
}

#[test]
#[serial]
fn overrides_are_applied() {
    clean_env();
    env::set_var("BASE_URL", "https://staging.example.com/api/");
    env::set_var("CONCURRENCY", "200");
    env::set_var("REQUEST_TIMEOUT", "5s");
    env::set_var("HEALTH_TIMEOUT", "750ms");
    env::set_var("REGISTRATION_RETRIES", "3");
    env::set_var("REGISTRATION_RETRY_DELAY", "250ms");
    env::set_var("SKIP_HEALTH_CHECK", "true");
    env::set_var("PRINT_METRICS", "1");
    env::set_var("LOADTEST_PASSWORD", "Other#Pass1");

    let config = Config::from_env().unwrap();
    clean_env();

    assert_eq!(config.base_url, "https://staging.example.com/api");
    assert_eq!(
        config.invoices_url(),
        "https://staging.example.com/api/invoices"
    );
    assert_eq!(config.concurrency, 200);
    assert_eq!(config.request_timeout, Duration::from_secs(5));
    assert_eq!(config.health_timeout, Duration::from_millis(750));
    assert_eq!(config.registration_retries, 3);
    assert_eq!(config.registration_retry_delay, Duration::from_millis(250));
    assert!(config.skip_health_check);
    assert!(config.print_metrics);
    assert_eq!(config.password, "Other#Pass1");
}

#[test]
#[serial]
fn explicit_health_url() {
    clean_env();
    env::set_var("HEALTH_URL", "http://localhost:9000/health");
    let config = Config::from_env().unwrap();
    clean_env();

    assert_eq!(config.health_url(), "http://localhost:9000/health");
}

#[test]
#[serial]
fn zero_concurrency_is_rejected() {
    clean_env();
    env::set_var("CONCURRENCY", "0");
    let err = Config::from_env().unwrap_err();
    clean_env();

    assert!(matches!(
        err,
        ConfigError::OutOfRange {
            var: "CONCURRENCY",
            ..
        }
    ));
}

#[test]
#[serial]
fn non_numeric_concurrency_is_rejected() {
    clean_env();
    env::set_var("CONCURRENCY", "lots");
    let err = Config::from_env().unwrap_err();
    clean_env();

    assert_eq!(
        err,
        ConfigError::InvalidNumber {
            var: "CONCURRENCY",
            value: "lots".to_string()
        }
    );
}

#[test]
#[serial]
fn bad_base_url_is_rejected() {
    clean_env();
    env::set_var("BASE_URL", "localhost:8080/api");
    let err = Config::from_env().unwrap_err();
    clean_env();

    assert!(matches!(err, ConfigError::InvalidUrl { var: "BASE_URL", .. }));
}

#[test]
#[serial]
fn bad_duration_is_rejected() {
    clean_env();
    env::set_var("REQUEST_TIMEOUT", "soon");
    let err = Config::from_env().unwrap_err();
    clean_env();

    assert!(matches!(
        err,
        ConfigError::InvalidDuration {
            var: "REQUEST_TIMEOUT",
            ..
        }
    ));
}

#[test]
#[serial]
fn bad_flag_is_rejected() {
    clean_env();
    env::set_var("SKIP_TLS_VERIFY", "sometimes");
    let err = Config::from_env().unwrap_err();
    clean_env();

    assert!(err.to_string().contains("SKIP_TLS_VERIFY"));
}
