//! # WHOIS Batch Library
//!
//! Batch domain registration checks against a WHOIS lookup HTTP API.
//!
//! Candidate domains are validated, dispatched over a bounded worker pool,
//! throttled with a fixed per-request delay and sorted into Available,
//! Registered and Error buckets while progress is reported.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use whois_batch_lib::{build_domains, BatchChecker, BatchConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let checker = BatchChecker::with_config(BatchConfig::default())?;
//!     let domains = build_domains(&["888888".to_string(), "example".to_string()], "com");
//!
//!     let report = checker
//!         .check_batch_with_progress(&domains, |p| eprintln!("{}/{}", p.completed, p.total))
//!         .await;
//!
//!     println!("Available: {:?}", report.available);
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Bounded concurrency**: at most `pool_size` lookups in flight
//! - **Rate limiting**: fixed delay after every request
//! - **Exact accounting**: every domain lands in one bucket exactly once
//! - **Layered configuration**: TOML files and `WB_*` environment variables
//! - **Lucky numbers**: built-in numeric prefix dictionary

// Re-export main public API types and functions
// This makes them available as whois_batch_lib::TypeName
pub use checker::BatchChecker;
pub use config::{
    load_env_config, load_env_config_from, parse_duration_string, ApiConfig, ConfigManager,
    DefaultsConfig, EnvConfig, FileConfig, OutputConfig,
};
pub use error::{ErrorKind, LookupError};
pub use protocols::{classify_body, classify_response, DomainLookup, WhoisApiClient};
pub use types::{
    BatchConfig, BatchProgress, BatchReport, Lookup, LookupOutcome, LookupResult,
    DEFAULT_ENDPOINT, DEFAULT_USER_AGENT,
};
pub use utils::{build_domains, dedup_domains, is_valid_domain, parse_prefix_lines, validate_domain};

// Public modules
pub mod generate;
pub mod report;

pub use generate::{generate_lucky_numbers, write_lucky_numbers, DEFAULT_LUCKY_LIMIT};
pub use report::{default_report_name, save_report};

// Internal modules - these are not part of the public API
mod batch;
mod checker;
mod config;
mod error;
mod protocols;
mod types;
mod utils;

// Type alias for convenience
pub type Result<T> = std::result::Result<T, LookupError>;

// Library version and metadata
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
