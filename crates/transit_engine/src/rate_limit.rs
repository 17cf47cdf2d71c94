//! Per-api-key token-bucket rate limiting (§5). The map is keyed by api
//! key; each entry pairs a token bucket with an atomically-updated
//! `lastSeen` so a periodic cleanup task can evict idle entries without
//! taking a write lock on the hot path. Grounded on the same concurrent-map
//! shape the wider example pack reaches for (`dashmap`) rather than
//! hand-rolling the double-checked-locking insert over a bare
//! `std::sync::RwLock<HashMap<_,_>>`.

use std::{
    sync::atomic::{AtomicI64, Ordering},
    time::{Duration, Instant},
};

use dashmap::DashMap;

struct Bucket {
    tokens: std::sync::Mutex<f64>,
    last_refill: std::sync::Mutex<Instant>,
    last_seen_unix_millis: AtomicI64,
}

impl Bucket {
    fn new(capacity: f64, now: Instant, now_unix_millis: i64) -> Self {
        Self {
            tokens: std::sync::Mutex::new(capacity),
            last_refill: std::sync::Mutex::new(now),
            last_seen_unix_millis: AtomicI64::new(now_unix_millis),
        }
    }
}

pub struct RateLimiterConfig {
    /// Sustained requests per minute; also the bucket capacity, so a
    /// caller can burst a full minute's allowance immediately.
    pub requests_per_minute: f64,
    /// How long an idle bucket survives before `cleanup` evicts it.
    pub idle_evict: Duration,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            requests_per_minute: 60.0,
            idle_evict: Duration::from_secs(600),
        }
    }
}

pub struct RateLimiter {
    buckets: DashMap<String, Bucket>,
    config: RateLimiterConfig,
}

pub enum Admission {
    Allowed,
    Denied { retry_after_secs: u64 },
}

impl RateLimiter {
    pub fn new(config: RateLimiterConfig) -> Self {
        Self {
            buckets: DashMap::new(),
            config,
        }
    }

    /// Checks out (and refills) one token for `api_key`. Hot path: reads
    /// through the map's sharded read lock and updates per-bucket state via
    /// interior mutability, never taking the map's insert-path write lock
    /// unless the key is new.
    pub fn check(&self, api_key: &str, now: Instant, now_unix_millis: i64) -> Admission {
        if let Some(bucket) = self.buckets.get(api_key) {
            bucket
                .last_seen_unix_millis
                .store(now_unix_millis, Ordering::Relaxed);
            return Self::take_token(&bucket, now, self.config.requests_per_minute);
        }

        // Double-checked: another thread may have inserted between the
        // read-miss above and this write-path entry.
        let bucket = self
            .buckets
            .entry(api_key.to_owned())
            .or_insert_with(|| Bucket::new(self.config.requests_per_minute, now, now_unix_millis));
        bucket
            .last_seen_unix_millis
            .store(now_unix_millis, Ordering::Relaxed);
        Self::take_token(&bucket, now, self.config.requests_per_minute)
    }

    fn take_token(bucket: &Bucket, now: Instant, capacity: f64) -> Admission {
        let mut tokens = bucket.tokens.lock().expect("rate limiter bucket poisoned");
        let mut last_refill = bucket
            .last_refill
            .lock()
            .expect("rate limiter bucket poisoned");

        let elapsed = now.saturating_duration_since(*last_refill).as_secs_f64();
        let refill_rate_per_sec = capacity / 60.0;
        *tokens = (*tokens + elapsed * refill_rate_per_sec).min(capacity);
        *last_refill = now;

        if *tokens >= 1.0 {
            *tokens -= 1.0;
            Admission::Allowed
        } else {
            let deficit = 1.0 - *tokens;
            let wait_secs = (deficit / refill_rate_per_sec).ceil().max(1.0) as u64;
            Admission::Denied {
                retry_after_secs: wait_secs,
            }
        }
    }

    /// Evicts buckets whose `lastSeen` predates `now - idle_evict`. Intended
    /// to run on a periodic interval (default five minutes, per §5),
    /// independent of request traffic.
    pub fn cleanup(&self, now_unix_millis: i64) {
        let idle_threshold_millis = self.config.idle_evict.as_millis() as i64;
        self.buckets.retain(|_, bucket| {
            now_unix_millis - bucket.last_seen_unix_millis.load(Ordering::Relaxed)
                < idle_threshold_millis
        });
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// The configured sustained rate, reported back to callers as the
    /// `X-RateLimit-Limit` header value on a 429 (§6).
    pub fn requests_per_minute(&self) -> f64 {
        self.config.requests_per_minute
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_requests_within_capacity() {
        let limiter = RateLimiter::new(RateLimiterConfig {
            requests_per_minute: 5.0,
            idle_evict: Duration::from_secs(600),
        });
        let now = Instant::now();
        for _ in 0..5 {
            assert!(matches!(
                limiter.check("key", now, 0),
                Admission::Allowed
            ));
        }
    }

    #[test]
    fn denies_once_capacity_is_exhausted() {
        let limiter = RateLimiter::new(RateLimiterConfig {
            requests_per_minute: 1.0,
            idle_evict: Duration::from_secs(600),
        });
        let now = Instant::now();
        assert!(matches!(limiter.check("key", now, 0), Admission::Allowed));
        assert!(matches!(
            limiter.check("key", now, 0),
            Admission::Denied { .. }
        ));
    }

    #[test]
    fn refills_over_time() {
        let limiter = RateLimiter::new(RateLimiterConfig {
            requests_per_minute: 60.0,
            idle_evict: Duration::from_secs(600),
        });
        let now = Instant::now();
        assert!(matches!(limiter.check("key", now, 0), Admission::Allowed));
        let later = now + Duration::from_secs(2);
        assert!(matches!(
            limiter.check("key", later, 0),
            Admission::Allowed
        ));
    }

    #[test]
    fn cleanup_evicts_idle_keys() {
        let limiter = RateLimiter::new(RateLimiterConfig {
            requests_per_minute: 5.0,
            idle_evict: Duration::from_secs(60),
        });
        let now = Instant::now();
        limiter.check("key", now, 0);
        assert_eq!(limiter.len(), 1);
        limiter.cleanup(61_000);
        assert_eq!(limiter.len(), 0);
    }
}
