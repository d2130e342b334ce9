use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

#[derive(Debug, Clone)]
struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

/// Per-user stats exposed for observability.
#[derive(Debug, Clone)]
pub struct RateLimiterStats {
    pub tracked_users: usize,
    pub max_requests_per_window: u32,
    pub window_seconds: u64,
    pub last_cleanup: Instant,
}

struct Inner {
    buckets: HashMap<String, Bucket>,
    last_cleanup: Instant,
}

/// Per-user token bucket. Refill rate is `max_requests / window_seconds`
/// tokens per second, capacity `max_requests`. Continuous refill, unlike the
/// teacher's fixed-window counter: tokens trickle back in rather than
/// resetting all at once at the window boundary.
#[derive(Clone)]
pub struct RateLimiter {
    inner: Arc<RwLock<Inner>>,
    max_requests: u32,
    window_seconds: u64,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window_seconds: u64) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner {
                buckets: HashMap::new(),
                last_cleanup: Instant::now(),
            })),
            max_requests,
            window_seconds,
        }
    }

    fn refill_rate(&self) -> f64 {
        self.max_requests as f64 / self.window_seconds.max(1) as f64
    }

    /// `Ok(())` if a token was available and consumed; `Err(retry_after_secs)`
    /// otherwise.
    pub async fn check(&self, user_id: &str) -> Result<(), u64> {
        let now = Instant::now();
        let refill_rate = self.refill_rate();
        let mut inner = self.inner.write().await;

        if now.duration_since(inner.last_cleanup) > Duration::from_secs(5 * self.window_seconds) {
            inner.buckets.retain(|_, b| now.duration_since(b.last_refill) < Duration::from_secs(self.window_seconds));
            inner.last_cleanup = now;
        }

        let max_requests = self.max_requests;
        let bucket = inner.buckets.entry(user_id.to_string()).or_insert(Bucket {
            tokens: max_requests as f64,
            last_refill: now,
        });

        let elapsed = now.duration_since(bucket.last_refill).as_secs_f64();
        bucket.tokens = (bucket.tokens + elapsed * refill_rate).min(max_requests as f64);
        bucket.last_refill = now;

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            Ok(())
        } else {
            let retry_after = ((1.0 - bucket.tokens) / refill_rate).ceil() as u64;
            Err(retry_after)
        }
    }

    pub async fn stats(&self) -> RateLimiterStats {
        let inner = self.inner.read().await;
        RateLimiterStats {
            tracked_users: inner.buckets.len(),
            max_requests_per_window: self.max_requests,
            window_seconds: self.window_seconds,
            last_cleanup: inner.last_cleanup,
        }
    }
}
