//! Core data types for batch registration checks.
//!
//! This module defines lookup outcomes and results, the per-batch report,
//! progress snapshots and the checker configuration.

use crate::error::ErrorKind;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default WHOIS lookup endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://v2.xxapi.cn/api/whois";

/// Identifying User-Agent sent with every lookup.
pub const DEFAULT_USER_AGENT: &str = "xiaoxiaoapi/1.0.0 (https://xxapi.cn)";

/// Terminal classification of one domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupOutcome {
    /// No DNS service reported, the domain looks free
    Available,
    /// The API reported a DNS service for the domain
    Registered,
    /// Validation, transport or parsing failed
    Error,
}

/// What a successful upstream lookup told us about a domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Available,
    /// Registered, with the DNS service value the API returned
    Registered { dns_serve: String },
}

/// Result of checking a single domain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupResult {
    /// The domain name that was checked (e.g., "example.com")
    pub domain: String,

    /// Which bucket the domain ended up in
    pub outcome: LookupOutcome,

    /// DNS service value reported for registered domains
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dns_serve: Option<String>,

    /// Error category when `outcome` is `Error`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,

    /// Human readable error when `outcome` is `Error`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    /// Time spent on the lookup itself, excluding the throttle delay
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_duration: Option<Duration>,
}

impl LookupResult {
    pub fn available<D: Into<String>>(domain: D) -> Self {
        Self {
            domain: domain.into(),
            outcome: LookupOutcome::Available,
            dns_serve: None,
            error_kind: None,
            error_message: None,
            check_duration: None,
        }
    }

    pub fn registered<D: Into<String>, S: Into<String>>(domain: D, dns_serve: S) -> Self {
        Self {
            dns_serve: Some(dns_serve.into()),
            outcome: LookupOutcome::Registered,
            ..Self::available(domain)
        }
    }

    pub fn error<D: Into<String>>(domain: D, error: &crate::LookupError) -> Self {
        Self {
            outcome: LookupOutcome::Error,
            error_kind: Some(error.kind()),
            error_message: Some(error.to_string()),
            ..Self::available(domain)
        }
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.check_duration = Some(duration);
        self
    }
}

/// Completion snapshot emitted after every finished domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BatchProgress {
    pub completed: usize,
    pub total: usize,
}

impl BatchProgress {
    /// Completion percentage in `0.0..=100.0`. An empty batch counts as done.
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            100.0
        } else {
            self.completed as f64 / self.total as f64 * 100.0
        }
    }

    pub fn is_complete(&self) -> bool {
        self.completed == self.total
    }
}

/// Everything a finished batch produced.
///
/// The three bucket lists hold each submitted domain exactly once, in the order
/// lookups completed. `results` carries the per-domain detail in the same order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub total: usize,
    pub available: Vec<String>,
    pub registered: Vec<String>,
    pub errors: Vec<String>,
    pub results: Vec<LookupResult>,
    pub elapsed: Duration,
}

impl BatchReport {
    /// Number of domains classified so far across all buckets.
    pub fn classified(&self) -> usize {
        self.available.len() + self.registered.len() + self.errors.len()
    }

    /// Look up the bucket a domain landed in.
    pub fn outcome_of(&self, domain: &str) -> Option<LookupOutcome> {
        self.results
            .iter()
            .find(|r| r.domain == domain)
            .map(|r| r.outcome)
    }
}

/// Configuration for batch checking.
///
/// Pool size bounds how many lookups run at once; the per-request delay is
/// slept by each worker after every upstream request to throttle the aggregate
/// request rate against the shared API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Maximum number of concurrent lookups
    /// Default: 5, Range: 1-100
    pub pool_size: usize,

    /// Delay slept after each upstream request before the slot is released
    /// Default: 1 second
    #[serde(skip)]
    pub per_request_delay: Duration,

    /// Timeout for each HTTP request
    /// Default: 10 seconds
    #[serde(skip)]
    pub request_timeout: Duration,

    /// WHOIS lookup endpoint; the domain is sent as the `domain` query parameter
    pub endpoint: String,

    /// Value of the `User-Agent` header
    pub user_agent: String,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            pool_size: 5,
            per_request_delay: Duration::from_secs(1),
            request_timeout: Duration::from_secs(10),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl BatchConfig {
    /// Set the worker pool size, clamped to 1-100.
    pub fn with_pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = pool_size.clamp(1, 100);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.per_request_delay = delay;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_endpoint<S: Into<String>>(mut self, endpoint: S) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_user_agent<S: Into<String>>(mut self, user_agent: S) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

impl std::fmt::Display for LookupOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LookupOutcome::Available => write!(f, "AVAILABLE"),
            LookupOutcome::Registered => write!(f, "REGISTERED"),
            LookupOutcome::Error => write!(f, "ERROR"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LookupError;

    #[test]
    fn test_default_config() {
        let config = BatchConfig::default();
        assert_eq!(config.pool_size, 5);
        assert_eq!(config.per_request_delay, Duration::from_secs(1));
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
    }

    #[test]
    fn test_pool_size_is_clamped() {
        assert_eq!(BatchConfig::default().with_pool_size(0).pool_size, 1);
        assert_eq!(BatchConfig::default().with_pool_size(500).pool_size, 100);
    }

    #[test]
    fn test_progress_percent() {
        let p = BatchProgress {
            completed: 1,
            total: 4,
        };
        assert_eq!(p.percent(), 25.0);
        assert!(!p.is_complete());

        let empty = BatchProgress {
            completed: 0,
            total: 0,
        };
        assert_eq!(empty.percent(), 100.0);
        assert!(empty.is_complete());
    }

    #[test]
    fn test_error_result_carries_kind() {
        let err = LookupError::http_status("abc.com", 404);
        let result = LookupResult::error("abc.com", &err);
        assert_eq!(result.outcome, LookupOutcome::Error);
        assert_eq!(result.error_kind, Some(ErrorKind::Http));
        assert!(result.error_message.unwrap().contains("404"));
    }

    #[test]
    fn test_result_json_omits_empty_fields() {
        let json = serde_json::to_value(LookupResult::available("abc.com")).unwrap();
        assert_eq!(json["outcome"], "available");
        assert!(json.get("error_kind").is_none());
        assert!(json.get("dns_serve").is_none());
    }
}
