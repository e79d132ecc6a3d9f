//! Error handling for registration lookups.
//!
//! Every way a single lookup can fail is represented here. Inside a batch these
//! errors never propagate: the orchestrator turns each one into an Error-bucket
//! entry and keeps the variant's [`ErrorKind`] for diagnostics.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Main error type for lookup and configuration operations.
#[derive(Debug, Clone)]
pub enum LookupError {
    /// Domain failed syntax validation and was never sent upstream
    InvalidDomain { domain: String, reason: String },

    /// Upstream answered with a non-200 status
    HttpStatus { domain: String, status_code: u16 },

    /// Connection-level failure (DNS, refused, reset, TLS, ...)
    NetworkError {
        message: String,
        source: Option<String>,
    },

    /// The request did not finish within the configured timeout
    Timeout {
        operation: String,
        duration: Duration,
    },

    /// Malformed JSON or a body without the expected `data` object
    ParseError {
        message: String,
        content: Option<String>,
    },

    /// Configuration errors (invalid settings, bad TOML, etc.)
    ConfigError { message: String },

    /// File I/O errors when reading prefixes or writing reports
    FileError { path: String, message: String },

    /// Anything else, including a worker task that panicked
    Internal { message: String },
}

/// Coarse error category used for logging and the CLI error summary.
///
/// All kinds land in the same Error bucket; the kind only tells a reader why.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidFormat,
    Http,
    Network,
    Timeout,
    Parse,
    Internal,
}

impl LookupError {
    /// Create a new invalid domain error.
    pub fn invalid_domain<D: Into<String>, R: Into<String>>(domain: D, reason: R) -> Self {
        Self::InvalidDomain {
            domain: domain.into(),
            reason: reason.into(),
        }
    }

    /// Create a new HTTP status error.
    pub fn http_status<D: Into<String>>(domain: D, status_code: u16) -> Self {
        Self::HttpStatus {
            domain: domain.into(),
            status_code,
        }
    }

    /// Create a new network error.
    pub fn network<M: Into<String>>(message: M) -> Self {
        Self::NetworkError {
            message: message.into(),
            source: None,
        }
    }

    /// Create a new network error with source information.
    pub fn network_with_source<M: Into<String>, S: Into<String>>(message: M, source: S) -> Self {
        Self::NetworkError {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Create a new timeout error.
    pub fn timeout<O: Into<String>>(operation: O, duration: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    /// Create a new parse error, keeping a truncated copy of the offending body.
    pub fn parse<M: Into<String>>(message: M, content: Option<&str>) -> Self {
        Self::ParseError {
            message: message.into(),
            content: content.map(|c| c.chars().take(200).collect()),
        }
    }

    /// Create a new configuration error.
    pub fn config<M: Into<String>>(message: M) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create a new file error.
    pub fn file_error<P: Into<String>, M: Into<String>>(path: P, message: M) -> Self {
        Self::FileError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new internal error.
    pub fn internal<M: Into<String>>(message: M) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Category of this error for reporting.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidDomain { .. } => ErrorKind::InvalidFormat,
            Self::HttpStatus { .. } => ErrorKind::Http,
            Self::NetworkError { .. } => ErrorKind::Network,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::ParseError { .. } => ErrorKind::Parse,
            Self::ConfigError { .. } | Self::FileError { .. } | Self::Internal { .. } => {
                ErrorKind::Internal
            }
        }
    }
}

impl fmt::Display for LookupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidDomain { domain, reason } => {
                write!(f, "Invalid domain '{}': {}", domain, reason)
            }
            Self::HttpStatus {
                domain,
                status_code,
            } => {
                write!(f, "Lookup for '{}' failed (HTTP {})", domain, status_code)
            }
            Self::NetworkError { message, source } => {
                if let Some(source) = source {
                    write!(f, "Network error: {} (source: {})", message, source)
                } else {
                    write!(f, "Network error: {}", message)
                }
            }
            Self::Timeout {
                operation,
                duration,
            } => {
                write!(f, "Timeout after {:?} during: {}", duration, operation)
            }
            Self::ParseError { message, content: _ } => {
                write!(f, "Parse error: {}", message)
            }
            Self::ConfigError { message } => {
                write!(f, "Configuration error: {}", message)
            }
            Self::FileError { path, message } => {
                write!(f, "File error at '{}': {}", path, message)
            }
            Self::Internal { message } => {
                write!(f, "Internal error: {}", message)
            }
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ErrorKind::InvalidFormat => "invalid format",
            ErrorKind::Http => "HTTP error",
            ErrorKind::Network => "network error",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Parse => "parsing error",
            ErrorKind::Internal => "internal error",
        };
        f.write_str(label)
    }
}

impl std::error::Error for LookupError {}

// Configuration files surface TOML syntax errors through `?`
impl From<toml::de::Error> for LookupError {
    fn from(err: toml::de::Error) -> Self {
        Self::ConfigError {
            message: format!("Failed to parse TOML configuration: {}", err),
        }
    }
}
