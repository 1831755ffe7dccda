//! Service layer for the provider directory.
//! - `provider`: listing and point lookup over a `ProviderRepository`.
//! - `pagination`: clamping of caller-supplied page/limit.
//! - `cache`: optional listing cache that never affects results.

pub mod errors;
pub mod pagination;
pub mod cache;
pub mod provider;
pub mod sample;
#[cfg(test)]
pub mod test_support;
