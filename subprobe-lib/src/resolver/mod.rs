//! DNS resolution adapter.
//!
//! Resolution backends are callback driven: they receive a query plus a
//! [`Completion`] handle and fulfil it whenever their answer arrives. The
//! [`DnsResolver`] adapter turns that into a plain `async fn` returning one
//! [`ResolvedRecord`] or one error per call.

/// Single-assignment slot bridging backend callbacks to futures
pub mod completion;

/// hickory-resolver backed implementation
pub mod hickory;

pub use completion::{Completion, PendingQuery, QueryOutcome};
pub use hickory::HickoryBackend;

use crate::error::ScanError;
use crate::types::{QueryType, ResolvedRecord};
use tracing::trace;

/// A source of DNS answers with a callback-style completion signal.
///
/// Implementations must issue exactly one query per `submit` call and
/// fulfil `completion` at most once. They may complete synchronously inside
/// `submit` or later from another task.
pub trait QueryBackend: Send + Sync + 'static {
    fn submit(&self, name: &str, query_type: QueryType, completion: Completion);
}

impl<B: QueryBackend + ?Sized> QueryBackend for std::sync::Arc<B> {
    fn submit(&self, name: &str, query_type: QueryType, completion: Completion) {
        (**self).submit(name, query_type, completion)
    }
}

/// Awaitable front-end over a [`QueryBackend`].
///
/// The adapter keeps no per-call state beyond the completion slot it hands to
/// the backend.
#[derive(Debug, Clone)]
pub struct DnsResolver<B = HickoryBackend> {
    backend: B,
}

impl<B: QueryBackend> DnsResolver<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Resolve `name` for a symbolic record type such as `"A"` or `"MX"`.
    ///
    /// # Errors
    ///
    /// - `InvalidQueryType` if `query_type` is not supported. The backend is
    ///   not contacted in that case.
    /// - Any error [`resolve`](Self::resolve) can return.
    pub async fn query(&self, name: &str, query_type: &str) -> Result<ResolvedRecord, ScanError> {
        let query_type: QueryType = query_type.parse()?;
        self.resolve(name, query_type).await
    }

    /// Resolve `name` for `query_type`.
    ///
    /// Dropping the returned future before it finishes abandons the query;
    /// the backend's late completion is then discarded.
    ///
    /// # Errors
    ///
    /// - `Resolver` with the backend's code and message on lookup failure.
    /// - `Cancelled` if the backend dropped the completion without a result.
    pub async fn resolve(
        &self,
        name: &str,
        query_type: QueryType,
    ) -> Result<ResolvedRecord, ScanError> {
        let (completion, pending) = Completion::channel();
        trace!(name, %query_type, "submitting query");
        self.backend.submit(name, query_type, completion);

        match pending.await {
            Some(Ok(addresses)) => Ok(ResolvedRecord::new(name, addresses)),
            Some(Err(err)) => Err(err),
            None => Err(ScanError::cancelled(name)),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Answers every query synchronously from inside `submit`.
    #[derive(Default)]
    struct EchoBackend {
        calls: AtomicUsize,
    }

    impl QueryBackend for EchoBackend {
        fn submit(&self, name: &str, query_type: QueryType, completion: Completion) {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if name.starts_with("missing.") {
                completion.complete(Err(ScanError::resolver(3, "Domain name not found")));
            } else if name.starts_with("dropped.") {
                drop(completion);
            } else {
                completion.complete(Ok(vec![format!("{}:{}", query_type, name)]));
            }
        }
    }

    #[tokio::test]
    async fn test_resolve_success() {
        let resolver = DnsResolver::new(EchoBackend::default());
        let record = resolver
            .resolve("www.example.com", QueryType::A)
            .await
            .unwrap();

        assert_eq!(record.domain, "www.example.com");
        assert_eq!(record.addresses, vec!["A:www.example.com"]);
        assert_eq!(resolver.backend().calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_resolver_error_is_passed_through() {
        let resolver = DnsResolver::new(EchoBackend::default());
        let err = resolver
            .resolve("missing.example.com", QueryType::A)
            .await
            .unwrap_err();
        assert_eq!(err.resolver_code(), Some(3));
    }

    #[tokio::test]
    async fn test_dropped_completion_is_cancelled() {
        let resolver = DnsResolver::new(EchoBackend::default());
        let err = resolver
            .resolve("dropped.example.com", QueryType::A)
            .await
            .unwrap_err();
        assert_eq!(err, ScanError::cancelled("dropped.example.com"));
    }

    #[tokio::test]
    async fn test_invalid_query_type_never_reaches_backend() {
        let backend = Arc::new(EchoBackend::default());
        let resolver = DnsResolver::new(backend.clone());

        let err = resolver.query("www.example.com", "BOGUS").await.unwrap_err();
        assert!(matches!(err, ScanError::InvalidQueryType { .. }));
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);

        let record = resolver.query("www.example.com", "mx").await.unwrap();
        assert_eq!(record.addresses, vec!["MX:www.example.com"]);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    }
}
