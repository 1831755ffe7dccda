//! Per-client token-bucket rate limiting.
//!
//! Each client IP gets a bucket holding `max` tokens that refills at
//! `max / window` tokens per second, so a client can burst up to `max`
//! requests and then sustain `max` requests per window.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderName, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use configs::RateLimitConfig;
use dashmap::DashMap;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::errors::JsonApiError;
use crate::observability;

const LIMIT_HEADER: HeaderName = HeaderName::from_static("x-ratelimit-limit");
const REMAINING_HEADER: HeaderName = HeaderName::from_static("x-ratelimit-remaining");

#[derive(Debug)]
pub struct TokenBucket {
    capacity: f64,
    tokens: f64,
    refill_rate: f64, // tokens per second
    last_refill: Instant,
}

impl TokenBucket {
    pub fn new(capacity: f64, refill_rate: f64, now: Instant) -> Self {
        Self { capacity, tokens: capacity, refill_rate, last_refill: now }
    }

    /// Take one token. On success returns the tokens left, otherwise how
    /// long until a token is available.
    pub fn try_acquire(&mut self, now: Instant) -> Result<u64, Duration> {
        self.refill(now);
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            Ok(self.tokens.floor() as u64)
        } else {
            let missing = 1.0 - self.tokens;
            Err(Duration::from_secs_f64(missing / self.refill_rate))
        }
    }

    fn refill(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_refill);
        self.tokens = (self.tokens + elapsed.as_secs_f64() * self.refill_rate).min(self.capacity);
        self.last_refill = now;
    }

    /// True once the bucket has refilled completely.
    fn is_idle(&mut self, now: Instant) -> bool {
        self.refill(now);
        self.tokens >= self.capacity
    }
}

/// Outcome of a rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed { remaining: u64 },
    Limited { retry_after: Duration },
}

#[derive(Clone)]
pub struct RateLimiter {
    buckets: Arc<DashMap<IpAddr, TokenBucket>>,
    max: u64,
    refill_rate: f64,
    enabled: bool,
}

impl RateLimiter {
    pub fn new(max: u64, window: Duration, enabled: bool) -> Self {
        let max = max.max(1);
        let window = window.max(Duration::from_millis(1));
        Self {
            buckets: Arc::new(DashMap::new()),
            max,
            refill_rate: max as f64 / window.as_secs_f64(),
            enabled,
        }
    }

    pub fn from_config(cfg: &RateLimitConfig) -> Self {
        Self::new(cfg.max, Duration::from_secs(cfg.window_secs), cfg.enabled)
    }

    pub fn disabled() -> Self { Self::new(1, Duration::from_secs(1), false) }

    pub fn is_enabled(&self) -> bool { self.enabled }

    pub fn max(&self) -> u64 { self.max }

    pub fn check(&self, client: IpAddr) -> Decision {
        self.check_at(client, Instant::now())
    }

    pub fn check_at(&self, client: IpAddr, now: Instant) -> Decision {
        if !self.enabled {
            return Decision::Allowed { remaining: self.max };
        }
        let mut bucket = self
            .buckets
            .entry(client)
            .or_insert_with(|| TokenBucket::new(self.max as f64, self.refill_rate, now));
        match bucket.try_acquire(now) {
            Ok(remaining) => Decision::Allowed { remaining },
            Err(retry_after) => Decision::Limited { retry_after },
        }
    }

    /// Drop buckets of clients that have been quiet long enough to refill.
    pub fn prune_idle(&self, now: Instant) -> usize {
        let before = self.buckets.len();
        self.buckets.retain(|_, bucket| !bucket.is_idle(now));
        before.saturating_sub(self.buckets.len())
    }

    /// Periodically prune idle buckets so the map does not grow without bound.
    pub fn spawn_pruner(&self, every: Duration) -> JoinHandle<()> {
        let limiter = self.clone();
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(every);
            loop {
                tick.tick().await;
                let pruned = limiter.prune_idle(Instant::now());
                if pruned > 0 {
                    debug!(pruned, "rate limit buckets pruned");
                }
            }
        })
    }
}

/// Middleware: reject with 429 once a client exhausts its bucket.
///
/// Requests without connection info (e.g. in-process tests) share one bucket.
pub async fn limit_by_ip(
    State(limiter): State<RateLimiter>,
    connect: Option<ConnectInfo<SocketAddr>>,
    req: Request,
    next: Next,
) -> Response {
    if !limiter.is_enabled() {
        return next.run(req).await;
    }
    let client = connect
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));

    match limiter.check(client) {
        Decision::Allowed { remaining } => {
            let mut res = next.run(req).await;
            let headers = res.headers_mut();
            headers.insert(LIMIT_HEADER, HeaderValue::from(limiter.max()));
            headers.insert(REMAINING_HEADER, HeaderValue::from(remaining));
            res
        }
        Decision::Limited { retry_after } => {
            let secs = retry_after.as_secs_f64().ceil().max(1.0) as u64;
            warn!(%client, retry_after_secs = secs, "rate limit exceeded");
            observability::RATE_LIMITED_TOTAL.inc();
            let mut res = JsonApiError::new(
                StatusCode::TOO_MANY_REQUESTS,
                "Too Many Requests",
                Some(format!("Rate limit exceeded, retry in {secs} seconds")),
            )
            .into_response();
            let headers = res.headers_mut();
            headers.insert(axum::http::header::RETRY_AFTER, HeaderValue::from(secs));
            headers.insert(LIMIT_HEADER, HeaderValue::from(limiter.max()));
            headers.insert(REMAINING_HEADER, HeaderValue::from(0u64));
            res
        }
    }
}
