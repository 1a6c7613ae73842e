//! Shared test backend for scanner integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use subprobe_lib::{Completion, QueryBackend, QueryType, ScanError};

/// In-memory backend that answers from a fixed table after a delay.
///
/// Answers are delivered from a spawned task, the way a real resolver
/// completes after `submit` has returned.
#[derive(Clone, Default)]
pub struct StubBackend {
    answers: HashMap<String, Vec<String>>,
    panics: HashSet<String>,
    drops: HashSet<String>,
    delay: Duration,
    pub calls: Arc<AtomicUsize>,
}

impl StubBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn answer(mut self, name: &str, addresses: &[&str]) -> Self {
        self.answers.insert(
            name.to_string(),
            addresses.iter().map(|a| a.to_string()).collect(),
        );
        self
    }

    /// Panic inside `submit` when `name` is queried.
    pub fn panic_on(mut self, name: &str) -> Self {
        self.panics.insert(name.to_string());
        self
    }

    /// Drop the completion without a result when `name` is queried.
    pub fn drop_on(mut self, name: &str) -> Self {
        self.drops.insert(name.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl QueryBackend for StubBackend {
    fn submit(&self, name: &str, _query_type: QueryType, completion: Completion) {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.panics.contains(name) {
            panic!("stub backend failure for {}", name);
        }

        let outcome = match self.answers.get(name) {
            Some(addresses) => Ok(addresses.clone()),
            None => Err(ScanError::resolver(3, "Domain name not found")),
        };
        let drop_it = self.drops.contains(name);
        let delay = self.delay;

        tokio::spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            if drop_it {
                drop(completion);
            } else {
                completion.complete(outcome);
            }
        });
    }
}

/// Stub knowing `www` and `mail` under example.com.
pub fn example_backend() -> StubBackend {
    StubBackend::new()
        .answer("www.example.com", &["93.184.216.34"])
        .answer("mail.example.com", &["93.184.216.35", "93.184.216.36"])
}

/// A backend resolving `w0..w{n}` under example.com.
pub fn numbered_backend(n: usize) -> StubBackend {
    (0..n).fold(StubBackend::new(), |backend, i| {
        let name = format!("w{}.example.com", i);
        backend.answer(&name, &["10.0.0.1"])
    })
}

pub fn numbered_labels(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("w{}", i)).collect()
}
