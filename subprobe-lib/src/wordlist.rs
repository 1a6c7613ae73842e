//! Candidate subdomain labels waiting to be resolved.
//!
//! The queue is filled once from a wordlist and then drained concurrently by
//! resolution workers, one label per worker.

use crate::error::ScanError;
use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

/// Ordered work queue of candidate labels.
#[derive(Debug, Default)]
pub struct CandidateQueue {
    items: Mutex<VecDeque<String>>,
}

impl CandidateQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a queue from raw wordlist lines.
    ///
    /// Each line is trimmed; lines that are empty after trimming are skipped.
    /// Input order is preserved.
    pub fn load<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let queue = Self::new();
        for line in lines {
            queue.push(line.as_ref());
        }
        queue
    }

    /// Read a wordlist file, one label per line.
    ///
    /// # Errors
    ///
    /// Returns `ScanError::Load` if the file cannot be opened or read. The
    /// queue is never returned half-filled.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ScanError> {
        let path = path.as_ref();
        let shown = path.display().to_string();
        info!(path = %shown, "loading wordlist");

        let file = File::open(path).map_err(|e| ScanError::load(&shown, e.to_string()))?;
        let reader = BufReader::new(file);

        let mut lines = Vec::new();
        for line in reader.lines() {
            lines.push(line.map_err(|e| ScanError::load(&shown, e.to_string()))?);
        }

        let queue = Self::load(lines);
        debug!(path = %shown, candidates = queue.len(), "wordlist loaded");
        Ok(queue)
    }

    /// Append one label. Returns `false` if the label was blank and skipped.
    pub fn push(&self, line: &str) -> bool {
        let label = line.trim();
        if label.is_empty() {
            return false;
        }
        self.lock().push_back(label.to_string());
        true
    }

    /// Take the next label, or `None` once the queue is drained.
    pub fn pop(&self) -> Option<String> {
        self.lock().pop_front()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<String>> {
        // The queue holds plain strings; a poisoned lock leaves it consistent.
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
