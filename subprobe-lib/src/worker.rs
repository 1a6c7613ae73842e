//! Resolution worker: the unit of concurrent work in a scan.
//!
//! A worker takes one candidate from the queue, resolves
//! `<candidate>.<domain>` for A records while holding a limiter slot, and
//! yields the record or nothing. A name that does not resolve is not a
//! finding, so every failure ends quietly as "no result".

use crate::concurrent::ConcurrencyLimiter;
use crate::error::ScanError;
use crate::resolver::{DnsResolver, QueryBackend};
use crate::types::{QueryType, ResolvedRecord};
use crate::utils::join_fqdn;
use crate::wordlist::CandidateQueue;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, trace};

/// Lifecycle of a single worker.
///
/// `Idle → Dequeued → LimiterWait → Querying → Resolved | Failed → Done`,
/// or `Idle → Done` when the queue is already empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Idle,
    Dequeued,
    LimiterWait,
    Querying,
    Resolved,
    Failed,
    Done,
}

/// One resolution attempt for one candidate.
pub struct ResolutionWorker<B> {
    id: usize,
    domain: Arc<str>,
    queue: Arc<CandidateQueue>,
    limiter: Arc<ConcurrencyLimiter>,
    resolver: Arc<DnsResolver<B>>,
    state: WorkerState,
}

impl<B: QueryBackend> ResolutionWorker<B> {
    pub fn new(
        id: usize,
        domain: Arc<str>,
        queue: Arc<CandidateQueue>,
        limiter: Arc<ConcurrencyLimiter>,
        resolver: Arc<DnsResolver<B>>,
    ) -> Self {
        Self {
            id,
            domain,
            queue,
            limiter,
            resolver,
            state: WorkerState::Idle,
        }
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    /// Drive the worker to `Done`.
    ///
    /// Never returns an error: resolver failures, cancellations and panics
    /// inside the attempt all end as `None`. The limiter slot, if one was
    /// taken, is released before this returns.
    pub async fn run(mut self) -> Option<ResolvedRecord> {
        let Some(candidate) = self.queue.pop() else {
            self.transition(WorkerState::Done);
            return None;
        };
        self.transition(WorkerState::Dequeued);

        let fqdn = join_fqdn(&candidate, &self.domain);
        let attempt = AssertUnwindSafe(self.attempt(&fqdn)).catch_unwind().await;

        let result = match attempt {
            Ok(Ok(record)) => {
                self.transition(WorkerState::Resolved);
                Some(record)
            }
            Ok(Err(err)) => {
                debug!(worker = self.id, name = %fqdn, error = %err, "candidate did not resolve");
                self.transition(WorkerState::Failed);
                None
            }
            Err(_) => {
                debug!(worker = self.id, name = %fqdn, "resolution attempt panicked");
                self.transition(WorkerState::Failed);
                None
            }
        };

        self.transition(WorkerState::Done);
        result
    }

    async fn attempt(&mut self, fqdn: &str) -> Result<ResolvedRecord, ScanError> {
        self.transition(WorkerState::LimiterWait);
        let limiter = self.limiter.clone();
        let _permit = limiter.acquire().await?;

        self.transition(WorkerState::Querying);
        let resolver = self.resolver.clone();
        resolver.resolve(fqdn, QueryType::A).await
    }

    fn transition(&mut self, next: WorkerState) {
        trace!(worker = self.id, from = ?self.state, to = ?next, "worker transition");
        self.state = next;
    }
}
