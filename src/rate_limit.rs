//! Per-caller token-bucket rate limiting.
//!
//! Buckets refill lazily on each check; there is no background timer. A
//! bucket is created the first time a key is seen and lives until
//! [`RateLimiter::prune_idle`] removes it.

use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde::Serialize;

use crate::config::RateLimitConfig;

/// Key used for callers that present no API key.
pub const ANONYMOUS_KEY: &str = "anonymous";

#[derive(Debug, Clone, Copy)]
struct RateBucket {
    tokens: f64,
    last_refill: Instant,
}

impl RateBucket {
    fn full(max_tokens: f64, now: Instant) -> Self {
        Self {
            tokens: max_tokens,
            last_refill: now,
        }
    }

    fn refill(&mut self, now: Instant, max_tokens: f64, refill_rate: f64) {
        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * refill_rate).min(max_tokens);
        self.last_refill = now;
    }
}

/// Outcome of one rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitDecision {
    pub allowed: bool,
    /// Whole tokens left after this request
    pub remaining: u64,
    pub limit: u64,
    /// Seconds until the bucket is full again
    pub reset_in: u64,
}

pub struct RateLimiter {
    buckets: DashMap<String, RateBucket>,
    config: RateLimitConfig,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            buckets: DashMap::new(),
            config,
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Check (and consume) the default request cost for `key`.
    pub fn check(&self, key: Option<&str>) -> RateLimitDecision {
        self.check_with_cost_at(key, self.config.cost_per_request, Instant::now())
    }

    pub fn check_with_cost(&self, key: Option<&str>, cost: f64) -> RateLimitDecision {
        self.check_with_cost_at(key, cost, Instant::now())
    }

    pub fn check_at(&self, key: Option<&str>, now: Instant) -> RateLimitDecision {
        self.check_with_cost_at(key, self.config.cost_per_request, now)
    }

    /// Refill the bucket up to `now`, then consume `cost` tokens if available.
    ///
    /// A negative or non-finite `cost` is charged as the configured `cost_per_request`.
    pub fn check_with_cost_at(&self, key: Option<&str>, cost: f64, now: Instant) -> RateLimitDecision {
        let key = key.filter(|k| !k.is_empty()).unwrap_or(ANONYMOUS_KEY);
        let cost = if cost.is_finite() && cost >= 0.0 {
            cost
        } else {
            self.config.cost_per_request
        };
        let max_tokens = self.config.max_tokens;
        let refill_rate = self.config.refill_rate;

        let mut bucket = self
            .buckets
            .entry(key.to_string())
            .or_insert_with(|| RateBucket::full(max_tokens, now));

        bucket.refill(now, max_tokens, refill_rate);

        let allowed = bucket.tokens >= cost;
        if allowed {
            bucket.tokens -= cost;
        }

        RateLimitDecision {
            allowed,
            remaining: bucket.tokens.max(0.0).floor() as u64,
            limit: max_tokens.floor() as u64,
            reset_in: seconds_to_full(bucket.tokens, max_tokens, refill_rate),
        }
    }

    /// Drop buckets untouched for at least `max_idle`. Returns how many were removed.
    pub fn prune_idle(&self, max_idle: Duration) -> usize {
        self.prune_idle_at(max_idle, Instant::now())
    }

    pub fn prune_idle_at(&self, max_idle: Duration, now: Instant) -> usize {
        let before = self.buckets.len();
        self.buckets
            .retain(|_, bucket| now.saturating_duration_since(bucket.last_refill) < max_idle);
        let removed = before.saturating_sub(self.buckets.len());
        crate::logging::log_buckets_pruned(removed, self.buckets.len());
        removed
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }
}

fn seconds_to_full(tokens: f64, max_tokens: f64, refill_rate: f64) -> u64 {
    let missing = (max_tokens - tokens).max(0.0);
    if missing == 0.0 || refill_rate <= 0.0 {
        return 0;
    }
    (missing / refill_rate).ceil() as u64
}
