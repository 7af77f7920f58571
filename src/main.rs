use notes_api::{
    api::{create_router, AppState},
    auth::JwtManager,
    cache::CacheService,
    config::{CacheConfig, Config},
    db::{create_pool, run_migrations, PgNoteRepository, PgUserRepository},
    observability::{init_tracing, HealthChecker},
    rate_limit::RateLimiters,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Connect the response cache; the service runs without it when Redis is
/// disabled or unreachable
async fn connect_cache(config: &CacheConfig) -> Option<CacheService> {
    if !config.enabled {
        tracing::info!("Cache disabled via configuration");
        return None;
    }

    match CacheService::connect(config).await {
        Ok(cache) => {
            tracing::info!("Cache connection established");
            Some(cache)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Cache unavailable, running without cache");
            None
        }
    }
}

async fn shutdown_signal(shutdown: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
    shutdown.cancel();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::load()?;
    config.validate()?;

    init_tracing(&config.observability)?;

    tracing::info!("Starting notes API");
    tracing::info!("Configuration loaded: {:?}", config.server);

    let db_pool = create_pool(&config.database).await?;
    run_migrations(&db_pool).await?;

    let cache = connect_cache(&config.cache).await;

    // Stops the limiter reapers together with the server
    let shutdown = CancellationToken::new();
    let limiters = RateLimiters::new(&config.rate_limit, &shutdown)?;

    let state = AppState {
        users: Arc::new(PgUserRepository::new(db_pool.clone())),
        notes: Arc::new(PgNoteRepository::new(db_pool.clone())),
        health_checker: Arc::new(HealthChecker::new(db_pool, cache.clone())),
        cache,
        jwt: Arc::new(JwtManager::new(&config.auth)?),
        limiters,
        password_min_length: config.auth.password_min_length,
    };
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
    .await
    .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    tracing::info!("Notes API stopped");
    Ok(())
}
