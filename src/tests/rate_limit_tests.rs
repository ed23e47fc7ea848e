//! Rate Limiter Tests
//!
//! Time is injected through the `*_at` methods so refill is checked without sleeping.

#[cfg(test)]
use {
    crate::{
        config::RateLimitConfig,
        rate_limit::{RateLimiter, ANONYMOUS_KEY},
    },
    std::time::{Duration, Instant},
};

fn limiter(max_tokens: f64, refill_rate: f64) -> RateLimiter {
    RateLimiter::new(RateLimitConfig {
        max_tokens,
        refill_rate,
        cost_per_request: 1.0,
        idle_ttl_secs: None,
    })
}

#[test]
fn test_fresh_bucket_is_full() {
    let limiter = limiter(100.0, 10.0);
    let decision = limiter.check_at(Some("k"), Instant::now());

    assert!(decision.allowed);
    assert_eq!(decision.remaining, 99);
    assert_eq!(decision.limit, 100);
    assert_eq!(decision.reset_in, 1);
}

#[test]
fn test_exhaust_then_refill() {
    let limiter = limiter(100.0, 10.0);
    let start = Instant::now();

    for i in 0..100 {
        assert!(limiter.check_at(Some("k"), start).allowed, "request {i} denied");
    }

    let denied = limiter.check_at(Some("k"), start);
    assert!(!denied.allowed);
    assert_eq!(denied.remaining, 0);
    assert_eq!(denied.reset_in, 10);

    let later = start + Duration::from_secs(10);
    let decision = limiter.check_at(Some("k"), later);
    assert!(decision.allowed);
    assert_eq!(decision.remaining, 99);
}

#[test]
fn test_exhaust_with_larger_cost() {
    let limiter = limiter(100.0, 10.0);
    let start = Instant::now();

    for _ in 0..10 {
        assert!(limiter.check_with_cost_at(Some("k"), 10.0, start).allowed);
    }
    assert!(!limiter.check_with_cost_at(Some("k"), 10.0, start).allowed);
    assert!(!limiter.check_at(Some("k"), start).allowed);
}

#[test]
fn test_empty_bucket_fully_refills_after_capacity_over_rate() {
    let limiter = limiter(20.0, 4.0);
    let start = Instant::now();

    assert!(limiter.check_with_cost_at(Some("k"), 20.0, start).allowed);
    assert!(!limiter.check_at(Some("k"), start).allowed);

    let refilled = start + Duration::from_secs(5);
    let decision = limiter.check_at(Some("k"), refilled);
    assert!(decision.allowed);
    assert_eq!(decision.remaining, 19);
}

#[test]
fn test_refill_is_capped() {
    let limiter = limiter(10.0, 10.0);
    let start = Instant::now();

    limiter.check_at(Some("k"), start);
    let decision = limiter.check_at(Some("k"), start + Duration::from_secs(3600));
    assert_eq!(decision.remaining, 9);
}

#[test]
fn test_partial_refill() {
    let limiter = limiter(10.0, 2.0);
    let start = Instant::now();

    assert!(limiter.check_with_cost_at(Some("k"), 10.0, start).allowed);
    let decision = limiter.check_at(Some("k"), start + Duration::from_millis(1500));
    // 3 tokens refilled, 1 spent
    assert!(decision.allowed);
    assert_eq!(decision.remaining, 2);
    assert_eq!(decision.reset_in, 4);
}

#[test]
fn test_denied_request_consumes_nothing() {
    let limiter = limiter(5.0, 1.0);
    let start = Instant::now();

    assert!(limiter.check_with_cost_at(Some("k"), 5.0, start).allowed);
    for _ in 0..10 {
        assert!(!limiter.check_at(Some("k"), start).allowed);
    }
    assert!(limiter.check_at(Some("k"), start + Duration::from_secs(1)).allowed);
}

#[test]
fn test_keys_are_independent() {
    let limiter = limiter(1.0, 0.5);
    let now = Instant::now();

    assert!(limiter.check_at(Some("a"), now).allowed);
    assert!(!limiter.check_at(Some("a"), now).allowed);
    assert!(limiter.check_at(Some("b"), now).allowed);
    assert_eq!(limiter.bucket_count(), 2);
}

#[test]
fn test_missing_and_empty_keys_share_anonymous_bucket() {
    let limiter = limiter(2.0, 1.0);
    let now = Instant::now();

    assert!(limiter.check_at(None, now).allowed);
    assert!(limiter.check_at(Some(""), now).allowed);
    assert!(!limiter.check_at(Some(ANONYMOUS_KEY), now).allowed);
    assert_eq!(limiter.bucket_count(), 1);
}

#[test]
fn test_prune_idle_buckets() {
    let limiter = limiter(10.0, 1.0);
    let start = Instant::now();

    limiter.check_at(Some("old"), start);
    limiter.check_at(Some("fresh"), start + Duration::from_secs(50));

    let removed = limiter.prune_idle_at(Duration::from_secs(30), start + Duration::from_secs(60));
    assert_eq!(removed, 1);
    assert_eq!(limiter.bucket_count(), 1);

    // A pruned key starts over with a full bucket
    let decision = limiter.check_at(Some("old"), start + Duration::from_secs(61));
    assert_eq!(decision.remaining, 9);
}

#[tokio::test]
async fn test_concurrent_checks_never_overspend() {
    use std::sync::Arc;

    let limiter = Arc::new(limiter(50.0, 0.0001));
    let mut handles = Vec::new();
    for _ in 0..10 {
        let limiter = Arc::clone(&limiter);
        handles.push(tokio::spawn(async move {
            (0..10).filter(|_| limiter.check(Some("shared")).allowed).count()
        }));
    }

    let mut allowed = 0;
    for handle in handles {
        allowed += handle.await.unwrap();
    }
    assert_eq!(allowed, 50);
}

#[test]
fn test_negative_cost_never_overfills_bucket() {
    let limiter = limiter(100.0, 10.0);
    let now = Instant::now();

    let decision = limiter.check_with_cost_at(Some("k"), -50.0, now);
    assert!(decision.allowed);
    assert_eq!(decision.remaining, 99);
    assert!(decision.remaining <= decision.limit);
}

#[test]
fn test_non_finite_cost_charges_default() {
    let limiter = limiter(100.0, 10.0);
    let now = Instant::now();

    let decision = limiter.check_with_cost_at(Some("k"), f64::NAN, now);
    assert!(decision.allowed);
    assert_eq!(decision.remaining, 99);

    let decision = limiter.check_with_cost_at(Some("k"), f64::INFINITY, now);
    assert!(decision.allowed);
    assert_eq!(decision.remaining, 98);
}
