//! # Trimly Server
//!
//! Main entry point: loads configuration, connects to PostgreSQL, and serves
//! the REST API until a shutdown signal arrives.

use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};
use trimly_config::{AppConfig, ConfigLoader, ObservabilityConfig};
use trimly_core::{TrimlyError, TrimlyResult};
use trimly_repository::{create_pool, DatabaseHealthCheck, DatabasePoolInterface, Repositories};
use trimly_server::{
    startup::{print_banner, print_startup_info},
    AppBuilder,
};

#[tokio::main]
async fn main() {
    let config = match ConfigLoader::from_default_location().load() {
        Ok(config) => config,
        Err(e) => {
            init_logging(&ObservabilityConfig::default());
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config.observability);
    print_banner();

    info!("Starting Trimly server...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(config).await {
        error!("Application error: {}", e);
        std::process::exit(1);
    }
}

async fn run(config: AppConfig) -> TrimlyResult<()> {
    info!("Environment: {}", config.app.environment);

    let pool = create_pool(&config.database).await?;
    let pool: Arc<dyn DatabasePoolInterface> = pool;
    if config.database.run_migrations {
        pool.run_migrations().await?;
    }

    let app = AppBuilder::new()
        .with_repositories(Repositories::postgres(Arc::clone(&pool)))
        .with_readiness_check(Arc::new(DatabaseHealthCheck::new(Arc::clone(&pool))))
        .with_config(config)
        .build()
        .await?;

    let rest_addr = app.config.server.rest_addr();
    info!("Starting REST server on http://{}", rest_addr);
    print_startup_info(&rest_addr);

    let listener = tokio::net::TcpListener::bind(&rest_addr)
        .await
        .map_err(|e| TrimlyError::Internal(format!("Failed to bind REST: {}", e)))?;

    axum::serve(listener, app.router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| TrimlyError::Internal(format!("REST server error: {}", e)))?;

    pool.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Installs the global subscriber. `RUST_LOG` wins over the configured level.
fn init_logging(observability: &ObservabilityConfig) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = || {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&observability.log_level))
    };

    if observability.log_format.eq_ignore_ascii_case("json") {
        tracing_subscriber::registry()
            .with(filter())
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter())
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            info!("Received terminate signal, initiating graceful shutdown...");
        }
    }
}
