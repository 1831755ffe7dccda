pub mod providers;

use axum::{
    http::{header, StatusCode},
    middleware,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use common::types::Health;

use crate::observability;
use crate::openapi::ApiDoc;
use crate::rate_limit::{self, RateLimiter};
use crate::state::AppState;

#[utoipa::path(get, path = "/healthz", tag = "health", responses((status = 200, description = "Service is up", body = crate::openapi::HealthResponse)))]
pub async fn health() -> Json<Health> {
    Json(Health::ok())
}

/// Old docs location, kept as a redirect.
async fn docs_redirect() -> impl IntoResponse {
    (StatusCode::FOUND, [(header::LOCATION, "/documentation")])
}

async fn metrics() -> impl IntoResponse {
    observability::encode_metrics()
}

/// Build the application router.
///
/// Only the `/v1` API sits behind the rate limiter; health, docs and metrics
/// stay reachable for probes.
pub fn build_router(state: AppState, cors: CorsLayer, limiter: RateLimiter) -> Router {
    let api = Router::new()
        .route("/v1/providers", get(providers::list))
        .route("/v1/providers/:id", get(providers::get))
        .route_layer(middleware::from_fn_with_state(limiter, rate_limit::limit_by_ip));

    let public = Router::new()
        .route("/healthz", get(health))
        .route("/docs", get(docs_redirect))
        .route("/metrics", get(metrics));

    public
        .merge(api)
        .merge(SwaggerUi::new("/documentation").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
