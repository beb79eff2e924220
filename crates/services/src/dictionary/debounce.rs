use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tracing::debug;

pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(500);

/// Outcome of a debounced call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Debounced<T> {
    Ready(T),
    /// A newer input arrived before this one settled.
    Superseded,
}

impl<T> Debounced<T> {
    #[must_use]
    pub fn ready(self) -> Option<T> {
        match self {
            Self::Ready(value) => Some(value),
            Self::Superseded => None,
        }
    }

    #[must_use]
    pub fn is_superseded(&self) -> bool {
        matches!(self, Self::Superseded)
    }
}

/// Coalesces bursts of input into one dispatch after a quiet period.
///
/// Each `submit` takes a generation ticket. Only the latest ticket survives
/// the delay, and only the latest ticket's result is reported as ready.
#[derive(Debug)]
pub struct SearchDebouncer {
    delay: Duration,
    generation: AtomicU64,
}

impl Default for SearchDebouncer {
    fn default() -> Self {
        Self::new(SEARCH_DEBOUNCE)
    }
}

impl SearchDebouncer {
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            generation: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Wait out the delay, then run `dispatch` unless a newer submit arrived.
    pub async fn submit<T, F, Fut>(&self, dispatch: F) -> Debounced<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::time::sleep(self.delay).await;
        if !self.is_current(ticket) {
            debug!(ticket, "debounced input superseded before dispatch");
            return Debounced::Superseded;
        }
        let value = dispatch().await;
        if !self.is_current(ticket) {
            debug!(ticket, "debounced result superseded after dispatch");
            return Debounced::Superseded;
        }
        Debounced::Ready(value)
    }

    /// Invalidate whatever is pending or in flight.
    pub fn cancel_pending(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    fn is_current(&self, ticket: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == ticket
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;

    #[tokio::test(start_paused = true)]
    async fn single_input_dispatches_after_delay() {
        let debouncer = SearchDebouncer::default();
        let started = tokio::time::Instant::now();
        let result = debouncer.submit(|| async { 42 }).await;
        assert_eq!(result, Debounced::Ready(42));
        assert!(started.elapsed() >= SEARCH_DEBOUNCE);
    }

    #[tokio::test(start_paused = true)]
    async fn burst_dispatches_only_latest() {
        let debouncer = Arc::new(SearchDebouncer::default());
        let calls = Arc::new(AtomicUsize::new(0));

        let first = {
            let debouncer = Arc::clone(&debouncer);
            let calls = Arc::clone(&calls);
            tokio::spawn(async move {
                debouncer
                    .submit(|| async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        "hou"
                    })
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(200)).await;
        let second = {
            let calls = Arc::clone(&calls);
            debouncer
                .submit(|| async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    "house"
                })
                .await
        };

        assert_eq!(first.await.unwrap(), Debounced::Superseded);
        assert_eq!(second, Debounced::Ready("house"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_drops_pending_input() {
        let debouncer = Arc::new(SearchDebouncer::default());
        let pending = {
            let debouncer = Arc::clone(&debouncer);
            tokio::spawn(async move { debouncer.submit(|| async { 1 }).await })
        };
        tokio::time::sleep(Duration::from_millis(100)).await;
        debouncer.cancel_pending();
        assert!(pending.await.unwrap().is_superseded());
    }
}
