//! Core data types for subdomain resolution.
//!
//! This module defines the data structures shared by the library and the CLI:
//! query types, resolved records, scan configuration and scan summaries.

use crate::concurrent::LimiterStats;
use crate::error::ScanError;
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::time::Duration;

/// Default number of concurrently in-flight DNS queries.
pub const DEFAULT_RATE: usize = 5000;

/// Public resolvers used when the caller does not supply any.
pub const DEFAULT_NAMESERVERS: &[&str] = &[
    "223.5.5.5",
    "223.6.6.6",
    "114.114.114.114",
    "8.8.4.4",
    "8.8.8.8",
];

/// Wordlist read when no path is configured.
pub const DEFAULT_WORDLIST: &str = "subnames.txt";

/// DNS record types the resolver adapter accepts.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QueryType {
    A,
    AAAA,
    CNAME,
    MX,
    NAPTR,
    NS,
    PTR,
    SOA,
    SRV,
    TXT,
}

impl QueryType {
    /// Every supported query type, in symbol order.
    pub const ALL: [QueryType; 10] = [
        QueryType::A,
        QueryType::AAAA,
        QueryType::CNAME,
        QueryType::MX,
        QueryType::NAPTR,
        QueryType::NS,
        QueryType::PTR,
        QueryType::SOA,
        QueryType::SRV,
        QueryType::TXT,
    ];

    /// The numeric DNS TYPE code (RFC 1035 and successors).
    pub fn code(self) -> u16 {
        match self {
            QueryType::A => 1,
            QueryType::NS => 2,
            QueryType::CNAME => 5,
            QueryType::SOA => 6,
            QueryType::PTR => 12,
            QueryType::MX => 15,
            QueryType::TXT => 16,
            QueryType::AAAA => 28,
            QueryType::SRV => 33,
            QueryType::NAPTR => 35,
        }
    }

    /// The symbolic name, e.g. `"AAAA"`.
    pub fn as_str(self) -> &'static str {
        match self {
            QueryType::A => "A",
            QueryType::AAAA => "AAAA",
            QueryType::CNAME => "CNAME",
            QueryType::MX => "MX",
            QueryType::NAPTR => "NAPTR",
            QueryType::NS => "NS",
            QueryType::PTR => "PTR",
            QueryType::SOA => "SOA",
            QueryType::SRV => "SRV",
            QueryType::TXT => "TXT",
        }
    }
}

impl FromStr for QueryType {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let symbol = s.trim();
        QueryType::ALL
            .into_iter()
            .find(|qtype| qtype.as_str().eq_ignore_ascii_case(symbol))
            .ok_or_else(|| ScanError::invalid_query_type(s))
    }
}

impl std::fmt::Display for QueryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A name that resolved successfully.
///
/// Two records are the same entity when their `domain` matches, whatever
/// addresses they carry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedRecord {
    /// Fully qualified name that was queried (e.g. "www.example.com")
    pub domain: String,

    /// Answers in the order the resolver returned them
    pub addresses: Vec<String>,
}

impl ResolvedRecord {
    pub fn new<D: Into<String>>(domain: D, addresses: Vec<String>) -> Self {
        Self {
            domain: domain.into(),
            addresses,
        }
    }
}

impl PartialEq for ResolvedRecord {
    fn eq(&self, other: &Self) -> bool {
        self.domain == other.domain
    }
}

impl Eq for ResolvedRecord {}

impl Hash for ResolvedRecord {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.domain.hash(state);
    }
}

impl std::fmt::Display for ResolvedRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} [{}]", self.domain, self.addresses.join(", "))
    }
}

/// Configuration options for a scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Maximum number of concurrently in-flight queries
    /// Default: 5000, Minimum: 1
    pub rate: usize,

    /// Nameserver addresses handed to the resolver, in preference order.
    /// An empty list means "use the system resolver configuration".
    pub nameservers: Vec<String>,

    /// Per-query timeout enforced by the resolver
    /// Default: 5 seconds
    #[serde(skip)] // Don't serialize Duration directly
    pub timeout: Duration,

    /// How many times the resolver tries each nameserver before giving up
    /// Default: 2
    pub attempts: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            rate: DEFAULT_RATE,
            nameservers: DEFAULT_NAMESERVERS.iter().map(|s| s.to_string()).collect(),
            timeout: Duration::from_secs(5),
            attempts: 2,
        }
    }
}

impl ScanConfig {
    /// Set the concurrency rate. Values below 1 are raised to 1.
    pub fn with_rate(mut self, rate: usize) -> Self {
        self.rate = rate.max(1);
        self
    }

    /// Replace the nameserver list.
    pub fn with_nameservers<I, S>(mut self, nameservers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.nameservers = nameservers.into_iter().map(Into::into).collect();
        self
    }

    /// Use the system resolver configuration instead of explicit nameservers.
    pub fn with_system_resolver(mut self) -> Self {
        self.nameservers.clear();
        self
    }

    /// Set the per-query timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the number of resolver attempts per query.
    pub fn with_attempts(mut self, attempts: usize) -> Self {
        self.attempts = attempts.max(1);
        self
    }

    /// Reject settings the scanner cannot run with.
    pub fn validate(&self) -> Result<(), ScanError> {
        if self.rate == 0 {
            return Err(ScanError::config("Rate must be a positive integer"));
        }
        if self.attempts == 0 {
            return Err(ScanError::config("Attempts must be at least 1"));
        }
        if self.timeout.is_zero() {
            return Err(ScanError::config("Timeout must be greater than zero"));
        }
        Ok(())
    }
}

/// Counts reported at the end of a scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanSummary {
    /// Target domain the candidates were appended to
    pub domain: String,

    /// Number of candidates a worker was spawned for
    pub attempted: usize,

    /// Number of distinct names that resolved
    pub found: usize,

    /// Wall-clock duration of the run
    #[serde(skip)]
    pub elapsed: Duration,
}

impl std::fmt::Display for ScanSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} found out of {}", self.found, self.attempted)
    }
}

/// Everything a finished scan hands back to its caller.
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    /// Resolved names, in worker completion order
    pub records: Vec<ResolvedRecord>,

    pub summary: ScanSummary,

    /// Limiter counters sampled after every worker finished
    #[serde(skip)]
    pub limiter: LimiterStats,
}

impl ScanReport {
    /// Serialize records and summary as a JSON document.
    pub fn to_json(&self, pretty: bool) -> Result<String, ScanError> {
        let json = if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        };
        json.map_err(|e| ScanError::internal(format!("Failed to serialize report: {}", e)))
    }
}
