//! Rate Limiter (Token Bucket)
//!
//! Guards the methods that trigger upstream fetches.

use std::sync::Mutex;
use std::time::Instant;

/// Token bucket: `burst` tokens, refilled continuously at `per_sec`
pub struct RateLimiter {
    bucket: Mutex<Bucket>,
    burst: f64,
    per_sec: f64,
}

struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

impl RateLimiter {
    /// # Arguments
    /// * `burst` - Maximum requests allowed back to back
    /// * `per_sec` - Tokens restored per second (may be fractional)
    pub fn new(burst: u32, per_sec: f64) -> Self {
        Self {
            bucket: Mutex::new(Bucket {
                tokens: burst as f64,
                last_refill: Instant::now(),
            }),
            burst: burst as f64,
            per_sec: per_sec.max(0.0),
        }
    }

    /// Consume one token; false when the caller should be throttled
    pub fn check(&self) -> bool {
        self.check_at(Instant::now())
    }

    fn check_at(&self, now: Instant) -> bool {
        let mut bucket = match self.bucket.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        let elapsed = now.saturating_duration_since(bucket.last_refill).as_secs_f64();
        bucket.tokens = (bucket.tokens + elapsed * self.per_sec).min(self.burst);
        bucket.last_refill = now;

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}
