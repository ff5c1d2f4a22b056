//! Token bucket rate limiter.
//!
//! Holds up to `capacity` permits. One permit is added per elapsed refill
//! interval, never beyond capacity. A blocked [`TokenBucket::acquire`] polls
//! the clock at a fixed interval instead of spinning.

use std::time::Duration;

use crate::clock::{Clock, SystemClock};
use crate::constants::{DEFAULT_BUCKET_POLL_MS, DEFAULT_REFILL_INTERVAL_MS};

#[derive(Debug)]
pub struct TokenBucket<C: Clock = SystemClock> {
    capacity: u32,
    tokens: u32,
    refill_interval_ms: u64,
    poll_interval: Duration,
    last_refill_ms: u64,
    clock: C,
}

impl TokenBucket<SystemClock> {
    /// Full bucket refilled every 20ms on the system clock
    pub fn new(capacity: u32) -> Self {
        Self::with_clock(
            capacity,
            Duration::from_millis(DEFAULT_REFILL_INTERVAL_MS),
            SystemClock::new(),
        )
    }
}

impl<C: Clock> TokenBucket<C> {
    /// Full bucket on an explicit clock. A zero refill interval is treated as 1ms.
    pub fn with_clock(capacity: u32, refill_interval: Duration, clock: C) -> Self {
        let last_refill_ms = clock.now_ms();
        TokenBucket {
            capacity,
            tokens: capacity,
            refill_interval_ms: u64::try_from(refill_interval.as_millis())
                .unwrap_or(u64::MAX)
                .max(1),
            poll_interval: Duration::from_millis(DEFAULT_BUCKET_POLL_MS),
            last_refill_ms,
            clock,
        }
    }

    /// How long a blocked acquire sleeps between refill checks, at least 1ms
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval.max(Duration::from_millis(1));
        self
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn refill_interval(&self) -> Duration {
        Duration::from_millis(self.refill_interval_ms)
    }

    /// Tokens available right now
    pub fn available(&mut self) -> u32 {
        self.refill();
        self.tokens
    }

    /// Take a token if one is available, without blocking
    pub fn try_acquire(&mut self) -> bool {
        self.refill();
        if self.tokens == 0 {
            return false;
        }
        self.tokens -= 1;
        true
    }

    /// Take a token, blocking the calling thread until one is available.
    /// A zero-capacity bucket never has one, so this blocks forever.
    pub fn acquire(&mut self) {
        while !self.try_acquire() {
            self.clock.sleep(self.poll_interval);
        }
    }

    /// Take a token, yielding to the tokio timer between refill checks.
    /// Never completes on a zero-capacity bucket.
    #[cfg(feature = "async")]
    pub async fn acquire_async(&mut self) {
        while !self.try_acquire() {
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    fn refill(&mut self) {
        let now = self.clock.now_ms();
        let elapsed = now.saturating_sub(self.last_refill_ms);
        let to_add = elapsed / self.refill_interval_ms;

        if to_add > 0 {
            let tokens = (self.tokens as u64 + to_add).min(self.capacity as u64);
            self.tokens = tokens as u32;
            self.last_refill_ms = now;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn bucket(capacity: u32, refill_ms: u64) -> (TokenBucket<ManualClock>, ManualClock) {
        let clock = ManualClock::new();
        let bucket = TokenBucket::with_clock(capacity, Duration::from_millis(refill_ms), clock.clone());
        (bucket, clock)
    }

    #[test]
    fn full_bucket_drains_without_delay() {
        let (mut bucket, clock) = bucket(5, 20);
        for _ in 0..5 {
            bucket.acquire();
        }
        assert_eq!(clock.now_ms(), 0);
        assert_eq!(bucket.available(), 0);
    }

    #[test]
    fn sixth_acquire_waits_one_refill_interval() {
        let (mut bucket, clock) = bucket(5, 20);
        for _ in 0..5 {
            bucket.acquire();
        }
        bucket.acquire();
        assert_eq!(clock.now_ms(), 20);
    }

    #[test]
    fn try_acquire_fails_on_empty_bucket() {
        let (mut bucket, clock) = bucket(1, 20);
        assert!(bucket.try_acquire());
        assert!(!bucket.try_acquire());
        clock.advance(Duration::from_millis(19));
        assert!(!bucket.try_acquire());
        clock.advance(Duration::from_millis(1));
        assert!(bucket.try_acquire());
    }

    #[test]
    fn refill_never_exceeds_capacity() {
        let (mut bucket, clock) = bucket(5, 20);
        bucket.acquire();
        bucket.acquire();
        clock.advance(Duration::from_secs(10));
        assert_eq!(bucket.available(), 5);

        for step in [1, 7, 19, 20, 21, 40, 1000] {
            clock.advance(Duration::from_millis(step));
            assert!(bucket.available() <= bucket.capacity());
            bucket.try_acquire();
        }
    }

    #[test]
    fn idle_time_at_capacity_is_not_banked() {
        let (mut bucket, clock) = bucket(2, 20);
        clock.advance(Duration::from_secs(1));
        assert_eq!(bucket.available(), 2);
        bucket.acquire();
        bucket.acquire();
        // The refill at t=1s moved the reference, so the next token needs a whole interval
        clock.advance(Duration::from_millis(10));
        assert!(!bucket.try_acquire());
        clock.advance(Duration::from_millis(10));
        assert!(bucket.try_acquire());
    }

    #[test]
    fn refill_drops_partial_interval() {
        let (mut bucket, clock) = bucket(3, 20);
        for _ in 0..3 {
            bucket.acquire();
        }
        clock.advance(Duration::from_millis(30));
        assert_eq!(bucket.available(), 1);
        // The leftover 10ms went with the refill at t=30
        clock.advance(Duration::from_millis(10));
        assert_eq!(bucket.available(), 1);
        clock.advance(Duration::from_millis(10));
        assert_eq!(bucket.available(), 2);
    }

    #[test]
    fn polling_faster_than_interval_still_refills() {
        let (mut bucket, clock) = bucket(1, 20);
        bucket.acquire();
        for _ in 0..19 {
            clock.advance(Duration::from_millis(1));
            assert!(!bucket.try_acquire());
        }
        clock.advance(Duration::from_millis(1));
        assert!(bucket.try_acquire());
    }

    #[test]
    fn zero_poll_interval_is_clamped() {
        let (bucket, clock) = bucket(1, 20);
        let mut bucket = bucket.with_poll_interval(Duration::ZERO);
        assert_eq!(bucket.refill_interval(), Duration::from_millis(20));
        bucket.acquire();
        bucket.acquire();
        assert_eq!(clock.now_ms(), 20);
    }

    #[test]
    fn zero_capacity_bucket_never_reports_tokens() {
        let (mut bucket, clock) = bucket(0, 20);
        clock.advance(Duration::from_secs(1));
        assert!(!bucket.try_acquire());
    }
}
