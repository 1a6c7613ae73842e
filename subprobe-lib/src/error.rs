//! Error handling for subdomain resolution.
//!
//! This module defines the error type shared by every stage of a scan, from
//! loading the wordlist to the individual DNS queries issued by workers.
//! Only setup errors (`Load`, `Config`, `InvalidDomain`) ever reach the caller
//! of a scan; per-candidate errors are absorbed by the worker that hit them.

use std::fmt;

/// Main error type for subdomain scanning operations.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanError {
    /// The wordlist could not be read. Fatal: no query is issued.
    Load { path: String, message: String },

    /// A DNS record type outside the supported set was requested.
    InvalidQueryType { query_type: String },

    /// The resolver reported a failure (NXDOMAIN, SERVFAIL, timeout, ...).
    Resolver { code: u16, message: String },

    /// The pending query was abandoned before a result was delivered.
    Cancelled { domain: String },

    /// Invalid configuration (rate, nameservers, config file contents).
    Config { message: String },

    /// The target domain is not a usable domain name.
    InvalidDomain { domain: String, reason: String },

    /// Generic internal errors that don't fit other categories
    Internal { message: String },
}

impl ScanError {
    /// Create a new wordlist load error.
    pub fn load<P: Into<String>, M: Into<String>>(path: P, message: M) -> Self {
        Self::Load {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new invalid query type error.
    pub fn invalid_query_type<Q: Into<String>>(query_type: Q) -> Self {
        Self::InvalidQueryType {
            query_type: query_type.into(),
        }
    }

    /// Create a new resolver error from a numeric code and message.
    pub fn resolver<M: Into<String>>(code: u16, message: M) -> Self {
        Self::Resolver {
            code,
            message: message.into(),
        }
    }

    /// Create a new cancellation error for `domain`.
    pub fn cancelled<D: Into<String>>(domain: D) -> Self {
        Self::Cancelled {
            domain: domain.into(),
        }
    }

    /// Create a new configuration error.
    pub fn config<M: Into<String>>(message: M) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new invalid domain error.
    pub fn invalid_domain<D: Into<String>, R: Into<String>>(domain: D, reason: R) -> Self {
        Self::InvalidDomain {
            domain: domain.into(),
            reason: reason.into(),
        }
    }

    /// Create a new internal error.
    pub fn internal<M: Into<String>>(message: M) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether this error aborts a whole run rather than a single candidate.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Load { .. } | Self::Config { .. } | Self::InvalidDomain { .. }
        )
    }

    /// The resolver's numeric code, if this is a resolver failure.
    pub fn resolver_code(&self) -> Option<u16> {
        match self {
            Self::Resolver { code, .. } => Some(*code),
            _ => None,
        }
    }
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Load { path, message } => {
                write!(f, "Failed to load wordlist '{}': {}", path, message)
            }
            Self::InvalidQueryType { query_type } => {
                write!(f, "Invalid query type: {}", query_type)
            }
            Self::Resolver { code, message } => {
                write!(f, "Resolver error {}: {}", code, message)
            }
            Self::Cancelled { domain } => {
                write!(f, "Query for '{}' was cancelled", domain)
            }
            Self::Config { message } => {
                write!(f, "Configuration error: {}", message)
            }
            Self::InvalidDomain { domain, reason } => {
                write!(f, "Invalid domain '{}': {}", domain, reason)
            }
            Self::Internal { message } => {
                write!(f, "Internal error: {}", message)
            }
        }
    }
}

impl std::error::Error for ScanError {}

impl From<std::io::Error> for ScanError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal {
            message: format!("I/O error: {}", err),
        }
    }
}

impl From<toml::de::Error> for ScanError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config {
            message: format!("Failed to parse TOML configuration: {}", err),
        }
    }
}
