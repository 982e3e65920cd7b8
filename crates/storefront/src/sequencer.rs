//! Latest-wins request sequencing.
//!
//! When the same region of a page can be refreshed by overlapping triggers,
//! only the most recently started refresh may update it. [`Sequencer`] hands
//! out monotonically increasing tickets; [`LatestWins`] runs each refresh as
//! a task, aborts the one it supersedes, and turns any stale result into
//! [`ApiError::Cancelled`].

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use tokio::task::AbortHandle;

use crate::api::ApiError;

/// A position in a [`Sequencer`]'s order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

/// Monotonic request sequence numbers.
#[derive(Debug, Default)]
pub struct Sequencer {
    latest: AtomicU64,
}

impl Sequencer {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            latest: AtomicU64::new(0),
        }
    }

    /// Start a new request. Every earlier ticket becomes stale.
    pub fn next(&self) -> Ticket {
        Ticket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Whether no request has started since `ticket`.
    #[must_use]
    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }
}

/// Runs futures so that only the most recently started one delivers a result.
#[derive(Debug)]
pub struct LatestWins {
    sequencer: Sequencer,
    in_flight: Mutex<Option<(Ticket, AbortHandle)>>,
}

impl Default for LatestWins {
    fn default() -> Self {
        Self::new()
    }
}

impl LatestWins {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            sequencer: Sequencer::new(),
            in_flight: Mutex::new(None),
        }
    }

    /// Run `fut` as a task, aborting whatever this runner started before it.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Cancelled` if a newer call started before this one
    /// finished, otherwise whatever `fut` returned.
    ///
    /// # Panics
    ///
    /// Resumes the panic if `fut` panicked.
    pub async fn run<T, F>(&self, fut: F) -> Result<T, ApiError>
    where
        F: Future<Output = Result<T, ApiError>> + Send + 'static,
        T: Send + 'static,
    {
        // Ticket order and in-flight order must agree, so both are taken
        // under the same lock.
        let (ticket, handle) = {
            let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
            let ticket = self.sequencer.next();
            let handle = tokio::spawn(fut);
            if let Some((previous, abort)) = in_flight.replace((ticket, handle.abort_handle()))
                && previous < ticket
            {
                tracing::debug!("Aborting superseded request");
                abort.abort();
            }
            (ticket, handle)
        };

        match handle.await {
            Ok(result) if self.sequencer.is_current(ticket) => result,
            Ok(_) => Err(ApiError::Cancelled),
            Err(e) if e.is_cancelled() => Err(ApiError::Cancelled),
            Err(e) => std::panic::resume_unwind(e.into_panic()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_only_latest_ticket_is_current() {
        let sequencer = Sequencer::new();
        let first = sequencer.next();
        assert!(sequencer.is_current(first));

        let second = sequencer.next();
        assert!(!sequencer.is_current(first));
        assert!(sequencer.is_current(second));
        assert!(second > first);
    }

    #[tokio::test(start_paused = true)]
    async fn test_newer_call_cancels_older() {
        let runner = Arc::new(LatestWins::new());

        let slow = {
            let runner = Arc::clone(&runner);
            tokio::spawn(async move {
                runner
                    .run(async {
                        tokio::time::sleep(Duration::from_secs(5)).await;
                        Ok("slow")
                    })
                    .await
            })
        };
        // Let the slow call start before the fast one supersedes it.
        tokio::task::yield_now().await;

        let fast = runner.run(async { Ok("fast") }).await;
        assert_eq!(fast.unwrap(), "fast");

        let slow = slow.await.unwrap();
        assert!(matches!(slow, Err(ApiError::Cancelled)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_calls_leave_exactly_one_winner() {
        let runner = Arc::new(LatestWins::new());
        let barrier = Arc::new(tokio::sync::Barrier::new(16));

        let calls: Vec<_> = (0..16)
            .map(|i| {
                let runner = Arc::clone(&runner);
                let barrier = Arc::clone(&barrier);
                tokio::spawn(async move {
                    barrier.wait().await;
                    runner
                        .run(async move {
                            tokio::time::sleep(Duration::from_millis(200)).await;
                            Ok(i)
                        })
                        .await
                })
            })
            .collect();

        let mut winners = 0;
        for call in calls {
            match call.await.unwrap() {
                Ok(_) => winners += 1,
                Err(e) => assert!(matches!(e, ApiError::Cancelled)),
            }
        }
        assert_eq!(winners, 1);
    }

    #[tokio::test]
    async fn test_single_call_passes_through() {
        let runner = LatestWins::new();
        let result: Result<u32, _> = runner
            .run(async { Err(ApiError::NotFound { message: None }) })
            .await;
        assert!(matches!(result, Err(ApiError::NotFound { .. })));
    }
}
