//! Provider listing and lookup.

pub mod memory;
pub mod repository;
pub mod service;

use serde::{Deserialize, Serialize};

pub use models::provider::Provider;
pub use repository::{ProviderRepository, SeaOrmProviderRepository};
pub use service::{ListRequest, ProviderService};

/// One page of a filtered, name-ordered provider listing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderPage {
    pub items: Vec<Provider>,
    /// Number of matching providers across all pages.
    pub total: u64,
    pub page: u64,
    pub limit: u64,
}
