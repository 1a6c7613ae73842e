//! Concurrency limiting for DNS resolution.
//!
//! The limiter is a counting semaphore sized to the configured rate. Slots are
//! handed out as RAII permits: dropping a permit frees the slot, so a slot is
//! released exactly once whether the guarded query succeeded, failed, panicked
//! or was cancelled.

use crate::error::ScanError;
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{Semaphore, SemaphorePermit};

/// Bounds the number of simultaneously in-flight resolutions.
///
/// Waiters are woken in FIFO order (tokio's `Semaphore` is fair).
#[derive(Debug)]
pub struct ConcurrencyLimiter {
    semaphore: Semaphore,
    capacity: usize,
    acquired: AtomicUsize,
    released: AtomicUsize,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

/// Point-in-time view of a limiter's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LimiterStats {
    pub capacity: usize,
    pub acquired: usize,
    pub released: usize,
    pub in_flight: usize,
    /// Highest number of permits held at the same time
    pub peak: usize,
}

impl LimiterStats {
    /// Every acquire has been matched by a release.
    pub fn is_balanced(&self) -> bool {
        self.acquired == self.released && self.in_flight == 0
    }
}

impl ConcurrencyLimiter {
    /// Create a limiter with `capacity` slots. A capacity of 0 is raised to 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.clamp(1, Semaphore::MAX_PERMITS);
        Self {
            semaphore: Semaphore::new(capacity),
            capacity,
            acquired: AtomicUsize::new(0),
            released: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    /// Wait for a free slot.
    ///
    /// Suspends the calling task without blocking its thread. The slot is
    /// returned when the permit is dropped.
    pub async fn acquire(&self) -> Result<LimiterPermit<'_>, ScanError> {
        let permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| ScanError::internal("concurrency limiter was closed"))?;

        self.acquired.fetch_add(1, Ordering::SeqCst);
        let held = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(held, Ordering::SeqCst);

        Ok(LimiterPermit {
            limiter: self,
            _permit: permit,
        })
    }

    /// Number of slots currently free.
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn stats(&self) -> LimiterStats {
        LimiterStats {
            capacity: self.capacity,
            acquired: self.acquired.load(Ordering::SeqCst),
            released: self.released.load(Ordering::SeqCst),
            in_flight: self.in_flight.load(Ordering::SeqCst),
            peak: self.peak.load(Ordering::SeqCst),
        }
    }
}

/// A held limiter slot.
#[derive(Debug)]
pub struct LimiterPermit<'a> {
    limiter: &'a ConcurrencyLimiter,
    // Dropped after `Drop::drop` runs, so the counters settle before the slot
    // becomes visible to the next waiter.
    _permit: SemaphorePermit<'a>,
}

impl Drop for LimiterPermit<'_> {
    fn drop(&mut self) {
        self.limiter.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.limiter.released.fetch_add(1, Ordering::SeqCst);
    }
}
