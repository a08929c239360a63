//! Bounded concurrency for independent async operations

use std::future::Future;
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::Semaphore;

/// Caps the number of in-flight operations across every batch run through it.
///
/// Cloning shares the cap: two batches started from clones of the same
/// limiter together never exceed `limit` outstanding operations.
#[derive(Debug, Clone)]
pub struct ConcurrencyLimiter {
    semaphore: Arc<Semaphore>,
    limit: usize,
}

impl ConcurrencyLimiter {
    /// Create a limiter allowing `limit` concurrent operations (at least one)
    pub fn new(limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(limit)),
            limit,
        }
    }

    /// Maximum number of concurrent operations
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Run `op` for every item with at most `limit` invocations outstanding.
    ///
    /// `result[i]` is the output for the `i`th item regardless of completion
    /// order. A failing invocation does not cancel the others; per-item
    /// `Result`s are returned as-is.
    pub async fn run<I, T, F, Fut>(&self, items: I, op: F) -> Vec<Fut::Output>
    where
        I: IntoIterator<Item = T>,
        F: Fn(T) -> Fut,
        Fut: Future,
    {
        let op = &op;
        let tasks = items.into_iter().map(|item| {
            let semaphore = &self.semaphore;
            async move {
                // The semaphore is never closed, so acquire only fails if that changes
                let _permit = semaphore.acquire().await.ok();
                op(item).await
            }
        });

        join_all(tasks).await
    }
}
