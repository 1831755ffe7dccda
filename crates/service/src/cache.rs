//! Listing cache side-channel.
//!
//! The provider service may consult a `ListingCache` before hitting storage.
//! Implementations never fail: a miss, an outage, or a disabled cache all
//! look the same to the caller, so results never depend on the cache.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::{future::Cache, Expiry};

use crate::provider::ProviderPage;

/// Key for one listing request, `providers:pg:q={q}:p={page}:l={limit}`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn listing(q: &str, page: u64, limit: u64) -> Self {
        Self(format!("providers:pg:q={q}:p={page}:l={limit}"))
    }

    pub fn as_str(&self) -> &str { &self.0 }
}

#[async_trait]
pub trait ListingCache: Send + Sync {
    async fn get(&self, key: &CacheKey) -> Option<ProviderPage>;
    async fn set(&self, key: &CacheKey, value: ProviderPage, ttl: Duration);
}

/// Cache that stores nothing. Used when caching is disabled.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopCache;

#[async_trait]
impl ListingCache for NoopCache {
    async fn get(&self, _key: &CacheKey) -> Option<ProviderPage> { None }
    async fn set(&self, _key: &CacheKey, _value: ProviderPage, _ttl: Duration) {}
}

#[derive(Clone)]
struct Entry {
    page: ProviderPage,
    ttl: Duration,
}

struct PerEntryTtl;

impl Expiry<CacheKey, Entry> for PerEntryTtl {
    fn expire_after_create(&self, _key: &CacheKey, value: &Entry, _created_at: Instant) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// In-process cache backed by moka; each entry carries its own TTL.
#[derive(Clone)]
pub struct MokaListingCache {
    inner: Cache<CacheKey, Entry>,
}

impl MokaListingCache {
    pub fn new(max_capacity: u64) -> Self {
        let inner = Cache::builder()
            .max_capacity(max_capacity)
            .expire_after(PerEntryTtl)
            .build();
        Self { inner }
    }
}

#[async_trait]
impl ListingCache for MokaListingCache {
    async fn get(&self, key: &CacheKey) -> Option<ProviderPage> {
        self.inner.get(key).await.map(|e| e.page)
    }

    async fn set(&self, key: &CacheKey, value: ProviderPage, ttl: Duration) {
        if ttl.is_zero() {
            return;
        }
        self.inner.insert(key.clone(), Entry { page: value, ttl }).await;
    }
}
