//! Petly API server

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use petly_api::{
    bootstrap::{ensure_admin, BootstrapOutcome},
    config::Config,
    logging::init_logging,
    routes::create_router,
    state::AppState,
    store::{InMemoryUserStore, PgUserStore, UserStore},
};
use petly_shared::db::{create_pool, run_migrations};

/// How often expired sessions are swept from the session table
const SESSION_PURGE_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = Config::from_env().context("Failed to load configuration")?;
    init_logging(config.log_format);

    tracing::info!(
        bind_address = %config.bind_address,
        signup_enabled = config.enable_signup,
        "Starting Petly API"
    );

    let users: Arc<dyn UserStore> = if config.uses_memory_store() {
        tracing::warn!("Using in-memory user store; accounts will not survive a restart");
        Arc::new(InMemoryUserStore::new())
    } else {
        let pool = create_pool(&config.database_url, config.database_max_connections)
            .await
            .context("Failed to connect to database")?;
        run_migrations(&pool)
            .await
            .context("Failed to run database migrations")?;
        tracing::info!("Database migrations applied");
        Arc::new(PgUserStore::new(pool))
    };

    match ensure_admin(users.as_ref(), config.bootstrap_admin.as_ref())
        .await
        .context("Failed to bootstrap administrator")?
    {
        BootstrapOutcome::Created(id) => tracing::info!(user_id = %id, "Administrator account ready"),
        BootstrapOutcome::AlreadyPresent | BootstrapOutcome::Skipped => {}
    }

    let bind_address = config.bind_address.clone();
    let state = AppState::new(config, users).context("Failed to build application state")?;

    // Sweep expired sessions in the background
    let sessions = state.sessions.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_PURGE_INTERVAL);
        loop {
            interval.tick().await;
            sessions.purge_expired().await;
        }
    });

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;
    tracing::info!("Listening on {}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server shutdown complete");

    Ok(())
}

/// Resolves on Ctrl+C, or SIGTERM on Unix
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
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

    tracing::info!("Shutdown signal received, draining connections");
}
