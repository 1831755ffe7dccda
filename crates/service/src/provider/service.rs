use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, instrument};

use crate::cache::{CacheKey, ListingCache, NoopCache};
use crate::errors::ServiceError;
use crate::pagination::Pagination;
use crate::provider::{repository::ProviderRepository, Provider, ProviderPage};

/// A listing request as received from a caller.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ListRequest {
    /// Search term; empty lists everything.
    pub q: String,
    pub pagination: Pagination,
}

impl ListRequest {
    pub fn new(q: impl Into<String>, page: i64, limit: i64) -> Self {
        Self { q: q.into(), pagination: Pagination::new(page, limit) }
    }
}

/// Read-side application service for the provider directory.
pub struct ProviderService {
    repo: Arc<dyn ProviderRepository>,
    cache: Arc<dyn ListingCache>,
    cache_ttl: Duration,
}

impl ProviderService {
    pub fn new(repo: Arc<dyn ProviderRepository>) -> Self {
        Self { repo, cache: Arc::new(NoopCache), cache_ttl: Duration::ZERO }
    }

    /// Consult `cache` before storage and store fresh pages for `ttl`.
    pub fn with_cache(mut self, cache: Arc<dyn ListingCache>, ttl: Duration) -> Self {
        self.cache = cache;
        self.cache_ttl = ttl;
        self
    }

    /// Filter, count, order by name and slice one page.
    ///
    /// `total` counts every match regardless of the window. A window past the
    /// last match yields no items.
    #[instrument(skip(self, req), fields(q = %req.q))]
    pub async fn list(&self, req: ListRequest) -> Result<ProviderPage, ServiceError> {
        let window = req.pagination.normalize();
        let key = CacheKey::listing(&req.q, window.page, window.limit);
        if let Some(hit) = self.cache.get(&key).await {
            debug!(key = key.as_str(), "listing cache hit");
            return Ok(hit);
        }

        let term = Some(req.q.as_str()).filter(|q| !q.is_empty());
        let total = self.repo.count_matching(term).await?;
        let items = if window.offset >= total {
            Vec::new()
        } else {
            self.repo.find_matching(term, window.offset, window.limit).await?
        };
        debug!(total, returned = items.len(), page = window.page, limit = window.limit, "providers listed");

        let page = ProviderPage { items, total, page: window.page, limit: window.limit };
        self.cache.set(&key, page.clone(), self.cache_ttl).await;
        Ok(page)
    }

    /// Exact-id lookup.
    pub async fn get(&self, id: &str) -> Result<Provider, ServiceError> {
        self.repo
            .get(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("provider"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MokaListingCache;
    use crate::provider::memory::InMemoryProviderRepository;
    use crate::sample::sample_providers;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn sample_service() -> ProviderService {
        let repo = InMemoryProviderRepository::new(sample_providers()).unwrap();
        ProviderService::new(Arc::new(repo))
    }

    fn expected_matches(term: &str) -> Vec<Provider> {
        let needle = term.to_lowercase();
        let mut v: Vec<Provider> = sample_providers()
            .into_iter()
            .filter(|p| needle.is_empty() || p.matches_lowercase(&needle))
            .collect();
        v.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        v
    }

    #[tokio::test]
    async fn empty_term_matches_whole_collection() {
        let page = sample_service().list(ListRequest::new("", 1, 10)).await.unwrap();
        assert_eq!(page.total, 40);
        assert_eq!(page.items.len(), 10);
        assert_eq!((page.page, page.limit), (1, 10));
    }

    #[tokio::test]
    async fn anxiety_search_is_counted_and_sorted() {
        let expected = expected_matches("anxiety");
        assert!(!expected.is_empty());
        let page = sample_service().list(ListRequest::new("anxiety", 1, 10)).await.unwrap();
        assert_eq!(page.total as usize, expected.len());
        assert!(page.items.len() <= 10);
        let want: Vec<&str> = expected.iter().take(10).map(|p| p.id.as_str()).collect();
        let got: Vec<&str> = page.items.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(got, want);
        assert!(page.items.windows(2).all(|w| w[0].name <= w[1].name));
    }

    #[tokio::test]
    async fn specialty_match_ignores_case() {
        let svc = sample_service();
        let lower = svc.list(ListRequest::new("cbt", 1, 50)).await.unwrap();
        let upper = svc.list(ListRequest::new("CBT", 1, 50)).await.unwrap();
        assert!(lower.total > 0);
        assert_eq!(lower, upper);
        assert!(lower.items.iter().all(|p| p.specialties.iter().any(|s| s == "CBT")));
    }

    #[tokio::test]
    async fn total_is_independent_of_window() {
        let svc = sample_service();
        let mut totals = Vec::new();
        for (page, limit) in [(1, 1), (2, 5), (3, 7), (1, 50), (99, 10)] {
            let res = svc.list(ListRequest::new("trauma", page, limit)).await.unwrap();
            assert!(res.items.len() as u64 <= res.limit);
            totals.push(res.total);
        }
        assert!(totals.windows(2).all(|w| w[0] == w[1]));
    }

    #[tokio::test]
    async fn oversized_limit_is_clamped() {
        let svc = sample_service();
        let big = svc.list(ListRequest::new("", 1, 1000)).await.unwrap();
        let max = svc.list(ListRequest::new("", 1, 50)).await.unwrap();
        assert_eq!(big.limit, 50);
        assert_eq!(big, max);
        assert_eq!(big.items.len(), 40);
    }

    #[tokio::test]
    async fn pages_partition_the_matches() {
        let svc = sample_service();
        let expected = expected_matches("");
        let mut seen = Vec::new();
        for page in 1..=5 {
            let res = svc.list(ListRequest::new("", page, 9)).await.unwrap();
            seen.extend(res.items);
        }
        assert_eq!(seen, expected);
    }

    #[tokio::test]
    async fn page_past_end_is_empty_with_true_total() {
        let res = sample_service().list(ListRequest::new("", 5, 10)).await.unwrap();
        assert!(res.items.is_empty());
        assert_eq!(res.total, 40);
        assert_eq!(res.page, 5);
    }

    #[tokio::test]
    async fn unknown_term_yields_empty_page() {
        let res = sample_service().list(ListRequest::new("zzz-no-match", 1, 10)).await.unwrap();
        assert_eq!(res.total, 0);
        assert!(res.items.is_empty());
    }

    #[tokio::test]
    async fn get_returns_not_found_for_missing_id() {
        let svc = sample_service();
        let first = sample_providers().remove(0);
        assert_eq!(svc.get(&first.id).await.unwrap(), first);
        assert!(matches!(svc.get("missing").await, Err(ServiceError::NotFound(_))));
    }

    /// Counts storage calls and can be switched to fail.
    struct CountingRepo {
        inner: InMemoryProviderRepository,
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl ProviderRepository for CountingRepo {
        async fn count_matching(&self, term: Option<&str>) -> Result<u64, ServiceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(ServiceError::Db("connection refused".into()));
            }
            self.inner.count_matching(term).await
        }

        async fn find_matching(&self, term: Option<&str>, offset: u64, limit: u64) -> Result<Vec<Provider>, ServiceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.find_matching(term, offset, limit).await
        }

        async fn get(&self, id: &str) -> Result<Option<Provider>, ServiceError> {
            self.inner.get(id).await
        }
    }

    fn counting_repo(fail: bool) -> Arc<CountingRepo> {
        Arc::new(CountingRepo {
            inner: InMemoryProviderRepository::new(sample_providers()).unwrap(),
            calls: AtomicUsize::new(0),
            fail,
        })
    }

    #[tokio::test]
    async fn out_of_range_page_skips_the_fetch() {
        let repo = counting_repo(false);
        let svc = ProviderService::new(repo.clone());
        svc.list(ListRequest::new("", 10, 10)).await.unwrap();
        assert_eq!(repo.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn cache_short_circuits_repeat_listings() {
        let repo = counting_repo(false);
        let svc = ProviderService::new(repo.clone())
            .with_cache(Arc::new(MokaListingCache::new(100)), Duration::from_secs(30));

        let first = svc.list(ListRequest::new("cbt", 1, 10)).await.unwrap();
        let calls = repo.calls.load(Ordering::SeqCst);
        let second = svc.list(ListRequest::new("cbt", 1, 10)).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(repo.calls.load(Ordering::SeqCst), calls);

        // Different window is a different key.
        svc.list(ListRequest::new("cbt", 2, 10)).await.unwrap();
        assert!(repo.calls.load(Ordering::SeqCst) > calls);
    }

    #[tokio::test]
    async fn cached_and_uncached_results_agree() {
        let plain = sample_service();
        let cached = sample_service().with_cache(Arc::new(MokaListingCache::new(10)), Duration::from_secs(30));
        for q in ["", "anxiety", "therapist 1", "nothing"] {
            let a = plain.list(ListRequest::new(q, 2, 4)).await.unwrap();
            let b = cached.list(ListRequest::new(q, 2, 4)).await.unwrap();
            let c = cached.list(ListRequest::new(q, 2, 4)).await.unwrap();
            assert_eq!(a, b);
            assert_eq!(b, c);
        }
    }

    #[tokio::test]
    async fn storage_errors_propagate_without_retry() {
        let repo = counting_repo(true);
        let svc = ProviderService::new(repo.clone());
        let err = svc.list(ListRequest::new("", 1, 10)).await.unwrap_err();
        assert!(matches!(err, ServiceError::Db(_)));
        assert_eq!(repo.calls.load(Ordering::SeqCst), 1);
    }
}
