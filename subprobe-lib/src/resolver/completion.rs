//! Single-assignment completion slot.
//!
//! Backends report their answer through a [`Completion`] callback handle; the
//! adapter awaits the matching [`PendingQuery`]. The slot accepts exactly one
//! write, and a write after the waiting side has gone away is dropped instead
//! of being delivered.

use crate::error::ScanError;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll};
use tokio::sync::oneshot;

/// What a backend reports for one query: the answers, or the resolver's error.
pub type QueryOutcome = Result<Vec<String>, ScanError>;

/// Callback half of a pending query. Cheap to clone; all clones share the
/// same slot, so only the first successful `complete` is observed.
#[derive(Debug, Clone)]
pub struct Completion {
    slot: Arc<Mutex<Option<oneshot::Sender<QueryOutcome>>>>,
}

/// Awaitable half of a pending query.
#[derive(Debug)]
pub struct PendingQuery {
    receiver: oneshot::Receiver<QueryOutcome>,
}

impl Completion {
    /// Create a linked callback/awaitable pair.
    pub fn channel() -> (Completion, PendingQuery) {
        let (sender, receiver) = oneshot::channel();
        (
            Completion {
                slot: Arc::new(Mutex::new(Some(sender))),
            },
            PendingQuery { receiver },
        )
    }

    /// Fulfil the slot.
    ///
    /// Returns `true` if the outcome was delivered. Returns `false` when the
    /// slot was already fulfilled or the waiter was dropped; in both cases the
    /// outcome is discarded.
    pub fn complete(&self, outcome: QueryOutcome) -> bool {
        let mut guard = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        match guard.take() {
            Some(sender) if !sender.is_closed() => sender.send(outcome).is_ok(),
            _ => false,
        }
    }

    /// Whether the waiting side has given up.
    pub fn is_cancelled(&self) -> bool {
        let guard = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        guard.as_ref().map_or(true, |sender| sender.is_closed())
    }

    /// Whether the slot can still accept a result.
    pub fn is_pending(&self) -> bool {
        !self.is_cancelled()
    }
}

impl Future for PendingQuery {
    /// `None` if every `Completion` was dropped without a result.
    type Output = Option<QueryOutcome>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver)
            .poll(cx)
            .map(|received| received.ok())
    }
}
