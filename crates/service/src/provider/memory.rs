use std::collections::HashSet;

use async_trait::async_trait;
use models::{errors::ModelError, provider::Provider};

use crate::errors::ServiceError;
use crate::provider::repository::ProviderRepository;

/// Repository over a fixed in-memory collection.
///
/// Rows are sorted once at construction so listings only filter and slice.
#[derive(Clone, Debug, Default)]
pub struct InMemoryProviderRepository {
    providers: Vec<Provider>,
}

impl InMemoryProviderRepository {
    /// Fails when two providers share an id.
    pub fn new(mut providers: Vec<Provider>) -> Result<Self, ModelError> {
        let mut seen = HashSet::with_capacity(providers.len());
        for p in &providers {
            if !seen.insert(p.id.as_str()) {
                return Err(ModelError::Decode(format!("duplicate provider id {}", p.id)));
            }
        }
        providers.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(Self { providers })
    }

    pub fn len(&self) -> usize { self.providers.len() }

    pub fn is_empty(&self) -> bool { self.providers.is_empty() }

    fn matching<'a>(&'a self, term: Option<&str>) -> impl Iterator<Item = &'a Provider> + 'a {
        let needle = term.map(str::to_lowercase);
        self.providers
            .iter()
            .filter(move |p| needle.as_deref().map_or(true, |n| p.matches_lowercase(n)))
    }
}

#[async_trait]
impl ProviderRepository for InMemoryProviderRepository {
    async fn count_matching(&self, term: Option<&str>) -> Result<u64, ServiceError> {
        Ok(self.matching(term).count() as u64)
    }

    async fn find_matching(&self, term: Option<&str>, offset: u64, limit: u64) -> Result<Vec<Provider>, ServiceError> {
        let offset = usize::try_from(offset).unwrap_or(usize::MAX);
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        Ok(self.matching(term).skip(offset).take(limit).cloned().collect())
    }

    async fn get(&self, id: &str) -> Result<Option<Provider>, ServiceError> {
        Ok(self.providers.iter().find(|p| p.id == id).cloned())
    }
}
