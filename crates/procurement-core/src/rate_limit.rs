//! Process-wide minimum-interval limiter for outbound provider calls

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Fixed-delay discipline: successive `acquire` calls complete at least
/// `interval` apart, across every request sharing the limiter.
pub struct MinIntervalLimiter {
    next_slot: Mutex<Option<Instant>>,
    interval: Duration,
}

impl MinIntervalLimiter {
    pub fn new(interval: Duration) -> Self {
        Self {
            next_slot: Mutex::new(None),
            interval,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Wait for the next free slot.
    ///
    /// The slot is reserved before sleeping, so the lock is never held
    /// across the wait and a cancelled caller simply leaves a gap.
    pub async fn acquire(&self) {
        let wait_until = {
            let mut next_slot = self.next_slot.lock().await;
            let now = Instant::now();
            let slot = match *next_slot {
                Some(reserved) if reserved > now => reserved,
                _ => now,
            };
            *next_slot = Some(slot + self.interval);
            slot
        };

        if wait_until > Instant::now() {
            tracing::trace!("Rate limiter waiting {:?}", wait_until - Instant::now());
            tokio::time::sleep_until(wait_until).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_successive_calls_are_spaced() {
        let limiter = MinIntervalLimiter::new(Duration::from_millis(500));
        let start = Instant::now();

        limiter.acquire().await;
        limiter.acquire().await;
        limiter.acquire().await;

        assert!(start.elapsed() >= Duration::from_millis(1000));
        assert!(start.elapsed() < Duration::from_millis(1100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_callers_share_the_limit() {
        let limiter = Arc::new(MinIntervalLimiter::new(Duration::from_millis(200)));
        let start = Instant::now();

        let tasks: Vec<_> = (0..4)
            .map(|_| {
                let limiter = limiter.clone();
                async move {
                    limiter.acquire().await;
                    Instant::now()
                }
            })
            .collect();

        let mut finished = futures::future::join_all(tasks).await;
        finished.sort();

        for pair in finished.windows(2) {
            assert!(pair[1] - pair[0] >= Duration::from_millis(200));
        }
        assert!(start.elapsed() >= Duration::from_millis(600));
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_limiter_does_not_wait() {
        let limiter = MinIntervalLimiter::new(Duration::from_millis(300));
        limiter.acquire().await;
        tokio::time::advance(Duration::from_secs(1)).await;

        let before = Instant::now();
        limiter.acquire().await;
        assert_eq!(Instant::now(), before);
    }
}
