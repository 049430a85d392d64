//! Fixed-window request rate limiting, keyed per session.
//!
//! Requests without a session id share the "anonymous" bucket. The
//! limiter is checked before classification so an abusive client never
//! reaches the collaborators.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

struct Window {
    started_at: Instant,
    count: u32,
}

pub struct RateLimiter {
    window: Duration,
    max_requests: u32,
    buckets: Mutex<HashMap<String, Window>>,
}

impl RateLimiter {
    pub fn new(window: Duration, max_requests: u32) -> Self {
        Self {
            window,
            max_requests,
            buckets: Mutex::new(HashMap::new()),
        }
    }

    /// Record one request against the key and report whether it is
    /// within the current window's budget.
    pub fn check(&self, key: &str) -> bool {
        let mut buckets = self.buckets.lock().unwrap();
        let now = Instant::now();
        buckets.retain(|_, w| now.duration_since(w.started_at) < self.window);

        let bucket = buckets.entry(key.to_string()).or_insert(Window {
            started_at: now,
            count: 0,
        });
        bucket.count += 1;
        bucket.count <= self.max_requests
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_up_to_limit_then_rejects() {
        let limiter = RateLimiter::new(Duration::from_secs(60), 3);
        assert!(limiter.check("s1"));
        assert!(limiter.check("s1"));
        assert!(limiter.check("s1"));
        assert!(!limiter.check("s1"));
    }

    #[test]
    fn keys_are_independent() {
        let limiter = RateLimiter::new(Duration::from_secs(60), 1);
        assert!(limiter.check("s1"));
        assert!(!limiter.check("s1"));
        assert!(limiter.check("s2"));
    }

    #[test]
    fn window_expiry_resets_budget() {
        let limiter = RateLimiter::new(Duration::from_millis(20), 1);
        assert!(limiter.check("s1"));
        assert!(!limiter.check("s1"));
        std::thread::sleep(Duration::from_millis(30));
        assert!(limiter.check("s1"));
    }
}
