use std::sync::Arc;

use service::provider::ProviderService;

/// Shared handler state. Cheap to clone; everything inside is behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub providers: Arc<ProviderService>,
}

impl AppState {
    pub fn new(providers: ProviderService) -> Self {
        Self { providers: Arc::new(providers) }
    }
}
