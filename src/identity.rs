//! Test account provisioning.
//!
//! A run needs exactly one bearer token. It is obtained by registering a
//! brand-new company account with randomized identifiers so that repeated
//! runs against the same database never collide on email or tax id.

use std::fmt;

use rand::distributions::Alphanumeric;
use rand::Rng;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::errors::ProvisionError;
use crate::metrics::REGISTRATION_ATTEMPTS;

const IDENTIFIER_LEN: usize = 10;
const TAX_ID_LEN: usize = 8;

/// Bearer token shared read-only by every probe.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Value for the `Authorization` header.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Credential(<{} bytes redacted>)", self.0.len())
    }
}

/// A successfully registered test account.
#[derive(Debug, Clone)]
pub struct Registration {
    pub email: String,
    pub credential: Credential,
}

/// JSON body of `POST /auth/register` for a new company.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationPayload {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub registration_type: String,
    pub company_name: String,
    pub tax_id: String,
    pub company_address: String,
    pub company_phone: String,
    pub company_email: String,
}

impl RegistrationPayload {
    /// Builds a payload with fresh random identifiers.
    pub fn random(password: &str) -> Self {
        let email = format!("loadtest_{}@example.com", random_alphanumeric(IDENTIFIER_LEN));
        Self {
            email: email.clone(),
            password: password.to_string(),
            first_name: "Load".to_string(),
            last_name: "Test".to_string(),
            registration_type: "NEW_COMPANY".to_string(),
            company_name: format!("Company {}", random_alphanumeric(IDENTIFIER_LEN)),
            tax_id: format!("B{}", random_alphanumeric(TAX_ID_LEN)),
            company_address: "123 Test St".to_string(),
            company_phone: "555-0123".to_string(),
            company_email: email,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: Option<String>,
}

/// Random string of ASCII letters and digits.
pub fn random_alphanumeric(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Registers a test account, retrying with a fresh identity when configured.
pub async fn register(
    client: &reqwest::Client,
    config: &Config,
) -> Result<Registration, ProvisionError> {
    let attempts = config.registration_retries.saturating_add(1);
    let mut attempt = 1;

    loop {
        match register_once(client, config).await {
            Ok(registration) => return Ok(registration),
            Err(e) if attempt < attempts => {
                warn!(
                    attempt = attempt,
                    max_attempts = attempts,
                    error = %e,
                    "Registration attempt failed, retrying"
                );
                tokio::time::sleep(config.registration_retry_delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// One registration round-trip with a newly generated payload.
pub async fn register_once(
    client: &reqwest::Client,
    config: &Config,
) -> Result<Registration, ProvisionError> {
    let payload = RegistrationPayload::random(&config.password);
    let url = config.register_url();
    debug!(url = %url, email = %payload.email, "Registering test account");

    let response = match client.post(&url).json(&payload).send().await {
        Ok(r) => r,
        Err(e) => {
            REGISTRATION_ATTEMPTS.with_label_values(&["transport"]).inc();
            return Err(ProvisionError::Transport(e));
        }
    };

    let status = response.status();
    if status != StatusCode::CREATED {
        REGISTRATION_ATTEMPTS.with_label_values(&["rejected"]).inc();
        let body = response.text().await.unwrap_or_default();
        return Err(ProvisionError::Rejected {
            status: status.as_u16(),
            body,
        });
    }

    let body = response.text().await?;
    let token = serde_json::from_str::<TokenResponse>(&body)
        .ok()
        .and_then(|r| r.token)
        .filter(|t| !t.is_empty());

    match token {
        Some(token) => {
            REGISTRATION_ATTEMPTS.with_label_values(&["success"]).inc();
            info!(email = %payload.email, "Registered test account");
            Ok(Registration {
                email: payload.email,
                credential: Credential::new(token),
            })
        }
        None => {
            REGISTRATION_ATTEMPTS
                .with_label_values(&["missing_token"])
                .inc();
            Err(ProvisionError::MissingToken(body))
        }
    }
}
