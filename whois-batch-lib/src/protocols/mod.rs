//! Lookup backends for registration checks.
//!
//! The orchestrator talks to a backend through [`DomainLookup`]; the only
//! production backend is the WHOIS lookup HTTP API client.

use crate::error::LookupError;
use crate::types::Lookup;
use std::future::Future;

/// WHOIS lookup HTTP API implementation
pub mod whois_api;

pub use whois_api::{classify_body, classify_response, WhoisApiClient, DNS_SERVE_KEYS};

/// A single-domain registration lookup.
///
/// Implementations receive domains that already passed validation and must
/// report every failure through the returned `Result`.
pub trait DomainLookup: Send + Sync + 'static {
    fn lookup(&self, domain: &str) -> impl Future<Output = Result<Lookup, LookupError>> + Send;
}
