//! Per-client request throttling.
//!
//! The generation entry point consults a [`RateLimiter`] before it builds a
//! prompt, so a throttled client never costs a model call. The trait is the
//! seam for a shared external store (Redis, a KV service); the store's own
//! atomicity is what makes the window consistent across processes.
//!
//! [`SlidingWindowLimiter`] is the in-process implementation: one deque of
//! request instants per client key, pruned lazily on every check.

use crate::error::RateLimitExceeded;
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::debug;

/// Admission check performed once per generation request.
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Record a request for `client_key`, or refuse it when the key is over budget.
    ///
    /// A refused request is not recorded.
    async fn check_and_record(&self, client_key: &str) -> Result<(), RateLimitExceeded>;
}

/// Sliding-window limiter: at most `limit` requests per `window` per key.
pub struct SlidingWindowLimiter {
    limit: usize,
    window: Duration,
    entries: Mutex<HashMap<String, VecDeque<Instant>>>,
}

impl SlidingWindowLimiter {
    pub fn new(limit: usize, window: Duration) -> Self {
        Self {
            limit: limit.max(1),
            window,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// `limit` requests per minute.
    pub fn per_minute(limit: usize) -> Self {
        Self::new(limit, Duration::from_secs(60))
    }

    /// Check against an explicit clock reading.
    fn check_at(&self, client_key: &str, now: Instant) -> Result<(), RateLimitExceeded> {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        // Drop idle keys so the map does not grow with every client ever seen.
        let window = self.window;
        entries.retain(|_, stamps| {
            prune(stamps, now, window);
            !stamps.is_empty()
        });

        let stamps = entries.entry(client_key.to_string()).or_default();
        if stamps.len() >= self.limit {
            let oldest = stamps.front().copied().unwrap_or(now);
            let retry_after = (oldest + self.window).saturating_duration_since(now);
            debug!(
                "Rate limit hit for '{}': {} requests in window",
                client_key,
                stamps.len()
            );
            return Err(RateLimitExceeded {
                client_key: client_key.to_string(),
                limit: self.limit,
                window: self.window,
                retry_after,
            });
        }

        stamps.push_back(now);
        Ok(())
    }

    /// Requests currently counted against `client_key`.
    pub fn in_window(&self, client_key: &str) -> usize {
        let now = Instant::now();
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        match entries.get_mut(client_key) {
            Some(stamps) => {
                prune(stamps, now, self.window);
                stamps.len()
            }
            None => 0,
        }
    }
}

fn prune(stamps: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    while let Some(&front) = stamps.front() {
        if now.saturating_duration_since(front) >= window {
            stamps.pop_front();
        } else {
            break;
        }
    }
}

#[async_trait]
impl RateLimiter for SlidingWindowLimiter {
    async fn check_and_record(&self, client_key: &str) -> Result<(), RateLimitExceeded> {
        self.check_at(client_key, Instant::now())
    }
}
