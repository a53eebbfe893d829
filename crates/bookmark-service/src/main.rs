//! Bookmark Service
//!
//! Entry point: loads configuration, connects to Postgres, applies
//! migrations and serves the HTTP API.

use bookmark_service::config::Config;
use bookmark_service::observability::metrics::init_metrics_recorder;
use bookmark_service::repositories::PgStore;
use bookmark_service::routes::{self, AppState};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_DRAIN_SECONDS: u64 = 30;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bookmark_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Bookmark Service");

    let config = Config::from_env().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!(
        bind_address = %config.bind_address,
        auth_domain = %config.auth_domain,
        jwks_url = %config.jwks_url,
        jwks_cache_ttl_seconds = config.jwks_cache_ttl_seconds,
        "Configuration loaded successfully"
    );

    let metrics_handle = init_metrics_recorder().map_err(|e| {
        error!("Failed to initialize metrics recorder: {}", e);
        e
    })?;

    info!("Connecting to database...");
    let db_url_with_timeout = add_query_timeout(&config.database_url, 5);
    let db_pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(10)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(5))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .connect(&db_url_with_timeout)
        .await
        .map_err(|e| {
            error!("Failed to connect to database: {}", e);
            e
        })?;

    info!("Database connection established");

    sqlx::migrate!("../../migrations")
        .run(&db_pool)
        .await
        .map_err(|e| {
            error!("Failed to run migrations: {}", e);
            e
        })?;

    info!("Database migrations applied");

    let bind_address = config.bind_address.clone();

    let state = Arc::new(AppState {
        store: Arc::new(PgStore::new(db_pool)),
        config,
    });

    let app = routes::build_routes(state, metrics_handle);

    let drain = drain_period(std::env::var("BM_DRAIN_SECONDS").ok().as_deref());

    let addr: SocketAddr = bind_address.parse().map_err(|e| {
        error!("Invalid bind address: {}", e);
        e
    })?;

    info!("Bookmark Service listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(drain))
        .await?;

    info!("Bookmark Service shutdown complete");

    Ok(())
}

/// Drain period after a shutdown signal, from `BM_DRAIN_SECONDS`.
fn drain_period(raw: Option<&str>) -> Duration {
    let seconds = raw
        .and_then(|s| s.trim().parse::<u64>().ok())
        .unwrap_or(DEFAULT_DRAIN_SECONDS);
    Duration::from_secs(seconds)
}

/// Resolves once SIGINT or SIGTERM arrives and `drain` has elapsed.
async fn shutdown_signal(drain: Duration) {
    let interrupt = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for SIGINT: {}", e);
            std::future::pending::<()>().await;
        }
        "SIGINT"
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
        "SIGTERM"
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<&str>();

    let received = tokio::select! {
        name = interrupt => name,
        name = terminate => name,
    };
    info!(signal = received, "Shutdown signal received");

    if drain.is_zero() {
        return;
    }
    warn!(drain_seconds = drain.as_secs(), "Draining in-flight requests");
    tokio::time::sleep(drain).await;
    info!("Drain period complete");
}

/// Adds statement_timeout to the database URL so queries cannot hang.
fn add_query_timeout(url: &str, timeout_secs: u32) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    format!(
        "{}{}options=-c%20statement_timeout%3D{}s",
        url, separator, timeout_secs
    )
}
