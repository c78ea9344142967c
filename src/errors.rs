//! Error types and failure classification.
//!
//! Probe failures are folded into an [`ErrorCategory`] so the final report can
//! say *why* requests failed, while [`ProvisionError`] and [`ConfigError`]
//! describe the two ways a run can stop before any probe is sent.

use std::fmt;
use thiserror::Error;

/// Categories of probe failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ErrorCategory {
    /// HTTP 4xx responses
    ClientError,

    /// HTTP 5xx responses
    ServerError,

    /// DNS, connection refused, broken body stream
    NetworkError,

    /// Request exceeded the client timeout
    TimeoutError,

    /// Certificate or handshake problems
    TlsError,

    /// Anything else, including a worker task that died
    OtherError,
}

impl ErrorCategory {
    /// Categorize an HTTP status code. Returns `None` for 1xx-3xx.
    pub fn from_status_code(status_code: u16) -> Option<Self> {
        match status_code {
            100..=399 => None,
            400..=499 => Some(ErrorCategory::ClientError),
            500..=599 => Some(ErrorCategory::ServerError),
            _ => Some(ErrorCategory::OtherError),
        }
    }

    /// Categorize a transport-level reqwest error.
    pub fn from_reqwest_error(error: &reqwest::Error) -> Self {
        if error.is_timeout() {
            return ErrorCategory::TimeoutError;
        }
        if let Some(status) = error.status() {
            if let Some(category) = Self::from_status_code(status.as_u16()) {
                return category;
            }
        }
        if error.is_connect() || error.is_request() || error.is_body() || error.is_decode() {
            // A connect error wrapping a TLS failure still reads as TLS in its message.
            let msg = error.to_string().to_lowercase();
            if msg.contains("certificate") || msg.contains("tls") {
                return ErrorCategory::TlsError;
            }
            return ErrorCategory::NetworkError;
        }
        if error.is_redirect() {
            return ErrorCategory::ClientError;
        }

        let msg = error.to_string().to_lowercase();
        if msg.contains("certificate") || msg.contains("tls") || msg.contains("ssl") {
            ErrorCategory::TlsError
        } else if msg.contains("timed out") || msg.contains("timeout") {
            ErrorCategory::TimeoutError
        } else if msg.contains("dns") || msg.contains("connect") {
            ErrorCategory::NetworkError
        } else {
            ErrorCategory::OtherError
        }
    }

    /// Prometheus label value.
    pub fn label(&self) -> &'static str {
        match self {
            ErrorCategory::ClientError => "client_error",
            ErrorCategory::ServerError => "server_error",
            ErrorCategory::NetworkError => "network_error",
            ErrorCategory::TimeoutError => "timeout_error",
            ErrorCategory::TlsError => "tls_error",
            ErrorCategory::OtherError => "other_error",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ErrorCategory::ClientError => "HTTP 4xx Client Errors",
            ErrorCategory::ServerError => "HTTP 5xx Server Errors",
            ErrorCategory::NetworkError => "Network/Connection Errors",
            ErrorCategory::TimeoutError => "Request Timeout Errors",
            ErrorCategory::TlsError => "TLS/SSL Certificate Errors",
            ErrorCategory::OtherError => "Other/Unknown Errors",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Reason phrase for the status codes an API under load typically returns.
pub fn status_reason(status_code: u16) -> &'static str {
    match status_code {
        200 => "OK",
        201 => "Created",
        204 => "No Content",
        301 => "Moved Permanently",
        302 => "Found",
        304 => "Not Modified",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        408 => "Request Timeout",
        409 => "Conflict",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        504 => "Gateway Timeout",
        _ => "Unknown Status",
    }
}

/// Why the test account could not be registered.
#[derive(Error, Debug)]
pub enum ProvisionError {
    #[error("registration rejected with HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("connection failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("registration response carried no usable token: {0}")]
    MissingToken(String),
}

/// Invalid configuration read from the environment.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("{var}: '{value}' is not a valid http(s) URL")]
    InvalidUrl { var: &'static str, value: String },

    #[error("{var}: '{value}' is not a valid number")]
    InvalidNumber { var: &'static str, value: String },

    #[error("{var}: {message}")]
    OutOfRange { var: &'static str, message: String },

    #[error("{var}: {message}")]
    InvalidDuration { var: &'static str, message: String },

    #[error("{var}: '{value}' is not a boolean (use true or false)")]
    InvalidFlag { var: &'static str, value: String },
}
