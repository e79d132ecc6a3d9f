//! Client for the third-party WHOIS lookup HTTP API.
//!
//! One lookup is one `GET <endpoint>?domain=<domain>` carrying a fixed
//! `User-Agent`. A 200 response holds a JSON object whose `data` member may
//! report a DNS service; the API spells that key two different ways, so both
//! spellings are checked. Any DNS service value means the domain is
//! registered, none means it is available.

use crate::error::LookupError;
use crate::protocols::DomainLookup;
use crate::types::{BatchConfig, Lookup};
use reqwest::header::USER_AGENT;
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Keys under `data` that signal a DNS service. Both casings occur upstream.
pub const DNS_SERVE_KEYS: [&str; 2] = ["dns_serve", "DNS Serve"];

/// HTTP client for the WHOIS lookup API.
#[derive(Clone)]
pub struct WhoisApiClient {
    /// HTTP client, shared across all workers of a batch
    http_client: reqwest::Client,
    /// Lookup endpoint without query string
    endpoint: String,
    /// Identifying User-Agent header value
    user_agent: String,
    /// Per-request timeout, kept for error reporting
    timeout: Duration,
}

impl WhoisApiClient {
    /// Create a client with the default endpoint, header and timeout.
    pub fn new() -> Result<Self, LookupError> {
        Self::with_config(&BatchConfig::default())
    }

    /// Create a client from a batch configuration.
    pub fn with_config(config: &BatchConfig) -> Result<Self, LookupError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| {
                LookupError::network_with_source("Failed to create WHOIS API client", e.to_string())
            })?;

        Ok(Self {
            http_client,
            endpoint: config.endpoint.clone(),
            user_agent: config.user_agent.clone(),
            timeout: config.request_timeout,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Query the API for one domain and classify the answer.
    ///
    /// # Errors
    ///
    /// - `HttpStatus` for any status other than 200
    /// - `Timeout` when the request exceeds the configured timeout
    /// - `NetworkError` for connection failures
    /// - `ParseError` for malformed JSON or a missing `data` object
    pub async fn lookup_domain(&self, domain: &str) -> Result<Lookup, LookupError> {
        debug!(domain, endpoint = %self.endpoint, "sending WHOIS API request");

        let response = self
            .http_client
            .get(&self.endpoint)
            .query(&[("domain", domain)])
            .header(USER_AGENT, &self.user_agent)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        debug!(domain, status = status.as_u16(), body = %body, "WHOIS API response");

        classify_response(domain, status.as_u16(), &body)
    }

    fn map_transport_error(&self, err: reqwest::Error) -> LookupError {
        if err.is_timeout() {
            LookupError::timeout("WHOIS API request", self.timeout)
        } else if err.is_connect() {
            LookupError::network_with_source("Connection failed", err.to_string())
        } else {
            LookupError::network_with_source("HTTP request failed", err.to_string())
        }
    }
}

impl DomainLookup for WhoisApiClient {
    async fn lookup(&self, domain: &str) -> Result<Lookup, LookupError> {
        self.lookup_domain(domain).await
    }
}

/// Classify a raw API response.
///
/// Only status 200 is a usable answer; its body must be JSON.
pub fn classify_response(domain: &str, status: u16, body: &str) -> Result<Lookup, LookupError> {
    if status != StatusCode::OK.as_u16() {
        return Err(LookupError::http_status(domain, status));
    }

    let json: Value = serde_json::from_str(body).map_err(|e| {
        LookupError::parse(format!("Invalid JSON for '{}': {}", domain, e), Some(body))
    })?;

    classify_body(&json).map_err(|e| match e {
        LookupError::ParseError { message, .. } => {
            LookupError::parse(format!("{} (domain '{}')", message, domain), Some(body))
        }
        other => other,
    })
}

/// Classify a parsed 200 response body.
///
/// `data` must be an object. A key present with a `null` value counts as
/// absent.
pub fn classify_body(json: &Value) -> Result<Lookup, LookupError> {
    let data = json
        .get("data")
        .ok_or_else(|| LookupError::parse("Response has no 'data' member", None))?;

    let data = data
        .as_object()
        .ok_or_else(|| LookupError::parse("Response 'data' is not an object", None))?;

    let dns_serve = DNS_SERVE_KEYS
        .iter()
        .filter_map(|key| data.get(*key))
        .find(|value| !value.is_null());

    Ok(match dns_serve {
        Some(value) => Lookup::Registered {
            dns_serve: describe_value(value),
        },
        None => Lookup::Available,
    })
}

fn describe_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}
