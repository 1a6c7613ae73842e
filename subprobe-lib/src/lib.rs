//! # Subprobe Library
//!
//! A fast library for enumerating live subdomains by resolving a wordlist of
//! candidate labels against a target domain.
//!
//! Candidates are fanned out to one worker each, with the number of queries in
//! flight bounded by a configurable rate. Names that resolve are collected;
//! names that don't are silently dropped.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use subprobe_lib::{CandidateQueue, ScanConfig, SubdomainScanner};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let queue = CandidateQueue::from_file("subnames.txt")?;
//!     let config = ScanConfig::default().with_rate(500);
//!     let scanner = SubdomainScanner::new("example.com", config, queue)?;
//!
//!     let report = scanner.run().await;
//!     for record in &report.records {
//!         println!("{}", record);
//!     }
//!     println!("{}", report.summary);
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Bounded Concurrency**: At most `rate` queries in flight at any time
//! - **Pluggable Backends**: Any [`QueryBackend`] can stand in for hickory
//! - **Fault Isolation**: A failing or panicking lookup never stops the scan
//! - **Configurable**: TOML files and `SP_*` environment variables

// Re-export main public API types and functions
// This makes them available as subprobe_lib::TypeName
pub use concurrent::{ConcurrencyLimiter, LimiterPermit, LimiterStats};
pub use config::{
    load_env_config, parse_timeout_string, ConfigManager, DefaultsConfig, EnvConfig, FileConfig,
    OutputConfig,
};
pub use error::ScanError;
pub use resolver::{
    Completion, DnsResolver, HickoryBackend, PendingQuery, QueryBackend, QueryOutcome,
};
pub use scanner::SubdomainScanner;
pub use types::{
    QueryType, ResolvedRecord, ScanConfig, ScanReport, ScanSummary, DEFAULT_NAMESERVERS,
    DEFAULT_RATE, DEFAULT_WORDLIST,
};
pub use utils::{join_fqdn, normalize_domain};
pub use wordlist::CandidateQueue;
pub use worker::{ResolutionWorker, WorkerState};

// Public modules
pub mod resolver;

// Internal modules - these are not part of the public API
mod concurrent;
mod config;
mod error;
mod scanner;
mod types;
mod utils;
mod wordlist;
mod worker;

// Type alias for convenience
pub type Result<T> = std::result::Result<T, ScanError>;

// Library version and metadata
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const AUTHOR: &str = env!("CARGO_PKG_AUTHORS");

/// Get library information for debugging or display purposes.
pub fn info() -> LibraryInfo {
    LibraryInfo {
        version: VERSION,
        author: AUTHOR,
        query_types: QueryType::ALL.iter().map(|q| q.as_str()).collect(),
    }
}

/// Information about the library build
#[derive(Debug, Clone)]
pub struct LibraryInfo {
    pub version: &'static str,
    pub author: &'static str,
    /// Record types [`DnsResolver::query`] accepts
    pub query_types: Vec<&'static str>,
}
