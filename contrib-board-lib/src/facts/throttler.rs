use core::time::Duration;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Bounds the number of in-flight API requests and lets a rate-limited request hold off new ones.
///
/// Call [`Throttler::acquire`] before each request and keep the permit while the request runs.
/// When a request learns that the rate limit is exhausted it calls [`Throttler::pause_for`];
/// the longest pause wins when several callers overlap.
#[derive(Debug)]
pub struct Throttler {
    semaphore: Arc<Semaphore>,
    resume_at: Mutex<Option<Instant>>,
}

impl Throttler {
    /// Minimum extension required for a new pause to override an active one.
    const MIN_PAUSE_EXTENSION: Duration = Duration::from_secs(1);

    /// Create a throttler that allows at most `max_concurrent` requests at a time.
    #[must_use]
    pub fn new(max_concurrent: usize) -> Arc<Self> {
        Arc::new(Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent.max(1))),
            resume_at: Mutex::new(None),
        })
    }

    /// Wait out any active pause, then take a concurrency slot.
    pub async fn acquire(&self) -> OwnedSemaphorePermit {
        while let Some(wait) = self.remaining_pause() {
            tokio::time::sleep(wait).await;
        }

        Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .expect("semaphore is never closed")
    }

    /// Returns whether new requests are currently held back.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.remaining_pause().is_some()
    }

    /// Hold back new requests for `duration`.
    ///
    /// Returns `false` without changing anything when an equivalent or longer pause is
    /// already active.
    pub fn pause_for(&self, duration: Duration) -> bool {
        let new_resume_at = Instant::now() + duration;
        let mut guard = self.resume_at.lock().expect("lock not poisoned");

        if guard.is_some_and(|existing| existing + Self::MIN_PAUSE_EXTENSION >= new_resume_at) {
            return false;
        }

        *guard = Some(new_resume_at);
        true
    }

    fn remaining_pause(&self) -> Option<Duration> {
        let mut guard = self.resume_at.lock().expect("lock not poisoned");
        let remaining = guard
            .and_then(|resume_at| resume_at.checked_duration_since(Instant::now()))
            .filter(|d| !d.is_zero());

        if remaining.is_none() {
            *guard = None;
        }
        remaining
    }
}
