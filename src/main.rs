use std::net::SocketAddr;

use axum::Router;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use duomeet_backend::api;
use duomeet_backend::auth::AuthService;
use duomeet_backend::config::Config;
use duomeet_backend::redis::{create_pool, MeetingRepository};
use duomeet_backend::state::AppState;
use duomeet_backend::ws::ws_routes;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    tracing::info!("Starting DuoMeet Backend...");

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!(
        host = %config.server_host,
        port = %config.server_port,
        "Configuration loaded"
    );

    // Create Redis connection pool
    let redis_pool = create_pool(&config)?;
    let meeting_repo = MeetingRepository::new(redis_pool, config.meeting_ttl_seconds);

    // Test Redis connection
    match meeting_repo.health_check().await {
        Ok(true) => tracing::info!("Redis connection established"),
        Ok(false) => tracing::warn!("Redis health check returned false"),
        Err(e) => {
            tracing::error!(error = %e, "Failed to connect to Redis");
            // Continue anyway, might recover later
        }
    }

    // Create auth service
    let auth = AuthService::new(&config);

    // Create application state
    let state = AppState::new(config.clone(), auth, meeting_repo);

    // Build router
    let app = Router::new()
        .merge(ws_routes().with_state(state.clone()))
        .merge(api::create_router(state))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr: SocketAddr = config.server_addr().parse()?;
    let listener = TcpListener::bind(addr).await?;

    tracing::info!(address = %addr, "Server listening");

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");

    Ok(())
}

/// Handle shutdown signals
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down...");
        },
        _ = terminate => {
            tracing::info!("Received terminate signal, shutting down...");
        },
    }
}
