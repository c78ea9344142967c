use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

use crate::connection_pool::PoolConfig;
use crate::utils::split_escaped_list;

/// Configuration for building the HTTP client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub request_timeout: Duration,
    pub skip_tls_verify: bool,
    pub resolve_target_addr: Option<String>,
    pub custom_headers: Option<String>,
    pub pool_config: PoolConfig,
}

/// Result of building the client, includes parsed headers for logging.
pub struct ClientBuildResult {
    pub client: reqwest::Client,
    pub parsed_headers: HeaderMap,
}

/// Builds the reqwest client shared by registration, health check and probes.
pub fn build_client(
    config: &ClientConfig,
) -> Result<ClientBuildResult, Box<dyn std::error::Error + Send + Sync>> {
    let mut client_builder = reqwest::Client::builder().timeout(config.request_timeout);

    if let Some(resolve_str) = config.resolve_target_addr.as_deref() {
        if !resolve_str.trim().is_empty() {
            let (hostname, addr) = parse_resolve_override(resolve_str)?;
            debug!(hostname = %hostname, addr = %addr, "Applying DNS override");
            client_builder = client_builder.resolve(&hostname, addr);
        }
    }

    let parsed_headers = parse_custom_headers(config.custom_headers.as_deref())?;
    if !parsed_headers.is_empty() {
        client_builder = client_builder.default_headers(parsed_headers.clone());
    }

    client_builder = config.pool_config.apply_to_builder(client_builder);

    if config.skip_tls_verify {
        println!("WARNING: Skipping TLS certificate verification.");
        client_builder = client_builder
            .danger_accept_invalid_certs(true)
            .danger_accept_invalid_hostnames(true);
    }

    Ok(ClientBuildResult {
        client: client_builder.build()?,
        parsed_headers,
    })
}

/// Parses a `hostname:ip:port` DNS override.
pub fn parse_resolve_override(
    resolve_str: &str,
) -> Result<(String, SocketAddr), Box<dyn std::error::Error + Send + Sync>> {
    let parts: Vec<&str> = resolve_str.trim().split(':').map(str::trim).collect();
    let [hostname, ip, port] = parts.as_slice() else {
        return Err(format!(
            "RESOLVE_TARGET_ADDR ('{}') is not in the expected format 'hostname:ip:port'",
            resolve_str
        )
        .into());
    };

    if hostname.is_empty() || ip.is_empty() || port.is_empty() {
        return Err(format!(
            "RESOLVE_TARGET_ADDR ('{}') has an empty part. Format: 'hostname:ip:port'",
            resolve_str
        )
        .into());
    }

    let socket_addr: SocketAddr = format!("{}:{}", ip, port).parse().map_err(|e| {
        format!(
            "RESOLVE_TARGET_ADDR: '{}:{}' is not a valid IP and port: {}",
            ip, port, e
        )
    })?;

    Ok((hostname.to_string(), socket_addr))
}

/// Parses `Name:Value` pairs separated by commas (`\,` for a literal comma).
pub fn parse_custom_headers(
    custom_headers_str: Option<&str>,
) -> Result<HeaderMap, Box<dyn std::error::Error + Send + Sync>> {
    let mut parsed_headers = HeaderMap::new();

    let headers_str = match custom_headers_str {
        Some(s) if !s.trim().is_empty() => s,
        _ => return Ok(parsed_headers),
    };

    for pair in split_escaped_list(headers_str) {
        let pair = pair.trim();
        let (name, value) = pair.split_once(':').ok_or_else(|| {
            format!(
                "Invalid header format in CUSTOM_HEADERS: '{}'. Expected 'Name:Value'.",
                pair
            )
        })?;

        let name = name.trim();
        if name.is_empty() {
            return Err(format!("Header name cannot be empty in '{}'.", pair).into());
        }

        let header_name = HeaderName::from_str(name)
            .map_err(|e| format!("Invalid header name '{}': {}", name, e))?;
        let header_value = HeaderValue::from_str(value.trim())
            .map_err(|e| format!("Invalid header value for '{}': {}", name, e))?;

        parsed_headers.insert(header_name, header_value);
    }

    Ok(parsed_headers)
}
