//! Scan orchestration.
//!
//! This module provides the `SubdomainScanner`, which fans a candidate queue
//! out to one resolution worker per candidate, waits for every worker, and
//! collects the names that resolved.

use crate::concurrent::{ConcurrencyLimiter, LimiterStats};
use crate::error::ScanError;
use crate::resolver::{DnsResolver, HickoryBackend, QueryBackend};
use crate::types::{ResolvedRecord, ScanConfig, ScanReport, ScanSummary};
use crate::utils::normalize_domain;
use crate::wordlist::CandidateQueue;
use crate::worker::ResolutionWorker;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Enumerates live subdomains of one target domain.
///
/// The scanner owns the candidate queue, the concurrency limiter and the
/// resolver adapter. Each call to [`run`](Self::run) drains whatever is queued
/// at that moment.
///
/// # Example
///
/// ```rust,no_run
/// use subprobe_lib::{CandidateQueue, ScanConfig, SubdomainScanner};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let queue = CandidateQueue::load(["www", "mail", "dev"]);
///     let scanner = SubdomainScanner::new("example.com", ScanConfig::default(), queue)?;
///
///     let report = scanner.run().await;
///     for record in &report.records {
///         println!("{} {:?}", record.domain, record.addresses);
///     }
///     println!("{}", report.summary);
///     Ok(())
/// }
/// ```
pub struct SubdomainScanner<B = HickoryBackend> {
    /// Normalized target domain
    domain: Arc<str>,
    /// Settings this scanner was built with
    config: ScanConfig,
    /// Candidates waiting for a worker
    queue: Arc<CandidateQueue>,
    /// Bounds in-flight queries to `config.rate`
    limiter: Arc<ConcurrencyLimiter>,
    /// Adapter over the DNS backend
    resolver: Arc<DnsResolver<B>>,
}

impl SubdomainScanner<HickoryBackend> {
    /// Create a scanner that resolves through hickory with `config`'s
    /// nameservers, timeout and attempts.
    ///
    /// # Errors
    ///
    /// Returns `ScanError` if the domain or configuration is invalid.
    pub fn new(domain: &str, config: ScanConfig, queue: CandidateQueue) -> Result<Self, ScanError> {
        config.validate()?;
        let backend = HickoryBackend::from_config(&config)?;
        Self::with_backend(domain, config, queue, backend)
    }
}

impl<B: QueryBackend> SubdomainScanner<B> {
    /// Create a scanner over a caller-supplied backend.
    ///
    /// # Errors
    ///
    /// Returns `ScanError` if the domain or configuration is invalid.
    pub fn with_backend(
        domain: &str,
        config: ScanConfig,
        queue: CandidateQueue,
        backend: B,
    ) -> Result<Self, ScanError> {
        config.validate()?;
        let domain = normalize_domain(domain)?;

        Ok(Self {
            domain: Arc::from(domain),
            limiter: Arc::new(ConcurrencyLimiter::new(config.rate)),
            resolver: Arc::new(DnsResolver::new(backend)),
            queue: Arc::new(queue),
            config,
        })
    }

    /// Resolve every queued candidate and collect the results.
    ///
    /// The queue size is sampled once; candidates queued after that are left
    /// for a later run. Records come back in completion order, one per
    /// distinct name. A run where nothing resolves is a normal outcome.
    pub async fn run(&self) -> ScanReport {
        self.run_inner(None).await
    }

    /// Like [`run`](Self::run), also sending each new record to `sink` as
    /// soon as its worker finishes. A closed receiver is ignored.
    pub async fn run_with_sink(&self, sink: UnboundedSender<ResolvedRecord>) -> ScanReport {
        self.run_inner(Some(sink)).await
    }

    async fn run_inner(&self, sink: Option<UnboundedSender<ResolvedRecord>>) -> ScanReport {
        let start = Instant::now();
        let attempted = self.queue.len();
        info!(
            domain = %self.domain,
            candidates = attempted,
            rate = self.config.rate,
            "starting scan"
        );

        let mut tasks = JoinSet::new();
        for id in 0..attempted {
            let worker = ResolutionWorker::new(
                id,
                self.domain.clone(),
                self.queue.clone(),
                self.limiter.clone(),
                self.resolver.clone(),
            );
            tasks.spawn(worker.run());
        }

        let mut seen = HashSet::new();
        let mut records = Vec::new();

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Some(record)) => {
                    if !seen.insert(record.domain.clone()) {
                        debug!(name = %record.domain, "duplicate candidate, keeping first answer");
                        continue;
                    }
                    info!(name = %record.domain, addresses = ?record.addresses, "resolved");
                    if let Some(sink) = &sink {
                        // The receiver going away only stops streaming.
                        let _ = sink.send(record.clone());
                    }
                    records.push(record);
                }
                Ok(None) => {}
                Err(err) => warn!(error = %err, "resolution worker aborted"),
            }
        }

        let summary = ScanSummary {
            domain: self.domain.to_string(),
            attempted,
            found: records.len(),
            elapsed: start.elapsed(),
        };
        info!(
            domain = %summary.domain,
            found = summary.found,
            attempted = summary.attempted,
            elapsed_ms = summary.elapsed.as_millis() as u64,
            "scan finished"
        );

        ScanReport {
            records,
            summary,
            limiter: self.limiter.stats(),
        }
    }

    /// Resolve a single name through the scanner's resolver.
    ///
    /// Useful for checking that the configured nameservers answer at all
    /// before starting a large run. Unlike workers, errors are returned.
    pub async fn test_resolver(
        &self,
        name: &str,
        query_type: &str,
    ) -> Result<ResolvedRecord, ScanError> {
        self.resolver.query(name, query_type).await
    }

    /// Add more candidates for a later run.
    pub fn enqueue(&self, candidate: &str) -> bool {
        self.queue.push(candidate)
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn limiter_stats(&self) -> LimiterStats {
        self.limiter.stats()
    }
}
