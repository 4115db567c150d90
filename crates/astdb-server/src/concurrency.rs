//! Concurrency cap and request queue (spec §4.C10: serviced up to
//! `maxConcurrentRequests`, excess queued up to `requestQueueSize` and
//! rejected `overloaded` beyond that).

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Bounds in-flight work and the wait line behind it.
pub struct ConcurrencyLimiter {
    semaphore: Arc<Semaphore>,
    queue_size: usize,
    queued: AtomicUsize,
}

/// Guard held for the lifetime of one admitted request; dropping it frees
/// the slot for the next queued request.
pub struct Admission {
    _permit: OwnedSemaphorePermit,
}

impl ConcurrencyLimiter {
    #[must_use]
    pub fn new(max_concurrent: usize, queue_size: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent.max(1))),
            queue_size,
            queued: AtomicUsize::new(0),
        }
    }

    /// Admits one request, waiting in the queue if every slot is taken.
    /// Returns `None` (caller should respond `overloaded`) once the queue
    /// itself is full.
    pub async fn admit(&self) -> Option<Admission> {
        if let Ok(permit) = Arc::clone(&self.semaphore).try_acquire_owned() {
            return Some(Admission { _permit: permit });
        }

        if self.queued.fetch_add(1, Ordering::AcqRel) >= self.queue_size {
            self.queued.fetch_sub(1, Ordering::AcqRel);
            return None;
        }

        let permit = Arc::clone(&self.semaphore).acquire_owned().await.ok();
        self.queued.fetch_sub(1, Ordering::AcqRel);
        permit.map(|permit| Admission { _permit: permit })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn admits_up_to_the_concurrency_cap() {
        let limiter = ConcurrencyLimiter::new(1, 1);
        let first = limiter.admit().await;
        assert!(first.is_some());
    }

    #[tokio::test]
    async fn queues_and_admits_after_a_slot_frees() {
        let limiter = Arc::new(ConcurrencyLimiter::new(1, 1));
        let first = limiter.admit().await.unwrap();

        let limiter2 = Arc::clone(&limiter);
        let waiter = tokio::spawn(async move { limiter2.admit().await.is_some() });

        tokio::task::yield_now().await;
        drop(first);

        assert!(waiter.await.unwrap());
    }

    #[tokio::test]
    async fn rejects_once_the_queue_itself_is_full() {
        let limiter = Arc::new(ConcurrencyLimiter::new(1, 0));
        let _first = limiter.admit().await.unwrap();
        assert!(limiter.admit().await.is_none());
    }
}
