use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use tracing::{debug, info};

use service::pagination::Pagination;
use service::provider::{ListRequest, Provider, ProviderPage};

use crate::{errors::JsonApiError, observability, state::AppState};

/// Listing query string. Values are taken verbatim; `page` and `limit` fall
/// back to their defaults when missing or not numeric.
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListParams {
    /// Case-insensitive substring of the name or of any specialty.
    pub q: Option<String>,
    /// 1-based page number, default 1.
    pub page: Option<String>,
    /// Page size, default 10, at most 50.
    pub limit: Option<String>,
}

impl ListParams {
    /// First occurrence of each key wins.
    fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut params = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "q" => &mut params.q,
                "page" => &mut params.page,
                "limit" => &mut params.limit,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value);
            }
        }
        params
    }

    fn into_request(self) -> ListRequest {
        ListRequest {
            q: self.q.unwrap_or_default(),
            pagination: Pagination::from_raw(self.page.as_deref(), self.limit.as_deref()),
        }
    }
}

#[utoipa::path(
    get, path = "/v1/providers", tag = "providers",
    params(ListParams),
    responses(
        (status = 200, description = "One page of matching providers", body = crate::openapi::ProviderPageDoc),
        (status = 429, description = "Rate limited", body = crate::openapi::ErrorDoc),
        (status = 503, description = "Storage unavailable", body = crate::openapi::ErrorDoc)
    )
)]
pub async fn list(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<ProviderPage>, JsonApiError> {
    let req = ListParams::from_pairs(pairs).into_request();
    let timer = observability::LISTING_DURATION.start_timer();
    let page = state.providers.list(req).await?;
    timer.observe_duration();
    observability::PROVIDER_LISTINGS_TOTAL.inc();
    info!(total = page.total, returned = page.items.len(), page = page.page, limit = page.limit, "list providers");
    Ok(Json(page))
}

#[utoipa::path(
    get, path = "/v1/providers/{id}", tag = "providers",
    params(("id" = String, Path, description = "Provider id")),
    responses(
        (status = 200, description = "Provider found", body = crate::openapi::ProviderDoc),
        (status = 404, description = "Provider not found", body = crate::openapi::ErrorDoc),
        (status = 429, description = "Rate limited", body = crate::openapi::ErrorDoc)
    )
)]
pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Provider>, JsonApiError> {
    match state.providers.get(&id).await {
        Ok(p) => {
            observability::PROVIDER_LOOKUPS_TOTAL.with_label_values(&["found"]).inc();
            Ok(Json(p))
        }
        Err(e) => {
            let outcome = if matches!(e, service::errors::ServiceError::NotFound(_)) { "not_found" } else { "error" };
            observability::PROVIDER_LOOKUPS_TOTAL.with_label_values(&[outcome]).inc();
            debug!(%id, outcome, "provider lookup failed");
            Err(e.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn first_occurrence_wins() {
        let p = ListParams::from_pairs(pairs(&[("q", "cbt"), ("q", "adhd"), ("page", "2"), ("page", "9")]));
        assert_eq!(p.q.as_deref(), Some("cbt"));
        assert_eq!(p.page.as_deref(), Some("2"));
        assert!(p.limit.is_none());
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let p = ListParams::from_pairs(pairs(&[("sort", "city"), ("limit", "5")]));
        assert!(p.q.is_none());
        assert_eq!(p.limit.as_deref(), Some("5"));
    }

    #[test]
    fn garbage_numbers_fall_back_to_defaults() {
        let req = ListParams::from_pairs(pairs(&[("page", "abc"), ("limit", "")])).into_request();
        let window = req.pagination.normalize();
        assert_eq!((window.page, window.limit, window.offset), (1, 10, 0));
        assert_eq!(req.q, "");
    }

    #[test]
    fn query_is_not_trimmed() {
        let req = ListParams::from_pairs(pairs(&[("q", " cbt ")])).into_request();
        assert_eq!(req.q, " cbt ");
    }
}
