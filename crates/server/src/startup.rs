use std::{future::Future, net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Context;
use axum::http::HeaderValue;
use configs::{AppConfig, CorsConfig, StorageBackend};
use dotenvy::dotenv;
use migration::MigratorTrait;
use sea_orm::DatabaseConnection;
use service::{
    cache::MokaListingCache,
    provider::{memory::InMemoryProviderRepository, ProviderRepository, ProviderService, SeaOrmProviderRepository},
    sample::sample_providers,
};
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{info, warn};

use crate::rate_limit::RateLimiter;
use crate::routes;
use crate::state::AppState;

const PRUNE_EVERY: Duration = Duration::from_secs(60);

/// Allow the configured origins, or any origin when none are configured.
pub fn build_cors(cfg: &CorsConfig) -> CorsLayer {
    if cfg.origins.is_empty() {
        return CorsLayer::very_permissive();
    }
    let origins: Vec<HeaderValue> = cfg
        .origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(origin = %o, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([axum::http::Method::GET, axum::http::Method::OPTIONS])
        .allow_headers(tower_http::cors::Any)
}

/// Handles that must be released after the server stops.
#[derive(Default)]
pub struct Resources {
    db: Option<DatabaseConnection>,
}

impl Resources {
    pub async fn release(self) {
        if let Some(db) = self.db {
            match db.close().await {
                Ok(()) => info!(service = "server", event = "db_closed", "database pool closed"),
                Err(e) => warn!(service = "server", event = "db_close_failed", error = %e, "database pool close failed"),
            }
        }
    }
}

/// Wire the configured storage backend and cache into handler state.
pub async fn build_state(cfg: &AppConfig) -> anyhow::Result<(AppState, Resources)> {
    let (repo, resources): (Arc<dyn ProviderRepository>, Resources) = match cfg.storage.backend {
        StorageBackend::Postgres => {
            let db = models::db::connect_with_config(&cfg.database)
                .await
                .context("connect to database")?;
            if cfg.database.auto_migrate {
                migration::Migrator::up(&db, None).await.context("run migrations")?;
                info!(service = "server", event = "migrated", "migrations applied");
            }
            let repo = SeaOrmProviderRepository::new(db.clone());
            (Arc::new(repo), Resources { db: Some(db) })
        }
        StorageBackend::Memory => {
            let repo = InMemoryProviderRepository::new(sample_providers())?;
            info!(service = "server", event = "memory_backend", providers = repo.len(), "serving sample dataset");
            (Arc::new(repo), Resources::default())
        }
    };

    let mut providers = ProviderService::new(repo);
    if cfg.cache.enabled {
        info!(ttl_secs = cfg.cache.ttl_secs, capacity = cfg.cache.max_capacity, "listing cache enabled");
        providers = providers.with_cache(Arc::new(MokaListingCache::new(cfg.cache.max_capacity)), cfg.cache.ttl());
    }
    Ok((AppState::new(providers), resources))
}

pub fn bind_addr(cfg: &AppConfig) -> anyhow::Result<SocketAddr> {
    let raw = format!("{}:{}", cfg.server.host, cfg.server.port);
    raw.parse().with_context(|| format!("invalid bind address {raw}"))
}

/// Resolves on Ctrl+C or, on unix, SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for ctrl_c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!(service = "server", event = "shutdown_signal", "shutdown requested");
}

/// Serve on `listener` until `shutdown` resolves, then release resources.
pub async fn serve<F>(cfg: &AppConfig, listener: TcpListener, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let (state, resources) = build_state(cfg).await?;
    let limiter = RateLimiter::from_config(&cfg.rate_limit);
    let pruner = limiter.is_enabled().then(|| limiter.spawn_pruner(PRUNE_EVERY));
    let app = routes::build_router(state, build_cors(&cfg.cors), limiter);

    let addr = listener.local_addr()?;
    info!(service = "server", event = "listening", %addr, backend = ?cfg.storage.backend, "provider directory listening");

    let result = axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown)
        .await;

    if let Some(p) = pruner {
        p.abort();
    }
    resources.release().await;
    result.context("http server")
}

/// Public entry: load config, bind and serve until a shutdown signal.
pub async fn run() -> anyhow::Result<()> {
    dotenv().ok();
    let cfg = AppConfig::load_and_validate()?;
    let addr = bind_addr(&cfg)?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind {addr}"))?;
    serve(&cfg, listener, shutdown_signal()).await
}
