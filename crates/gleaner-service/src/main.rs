use anyhow::Context;
use gleaner_service::{
    DefaultAppState,
    config::Config,
    create_app,
    db::establish_connection,
    shutdown::{GracefulShutdownLayer, ShutdownState},
};
use std::sync::{Arc, Mutex};
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("gleaner_service=debug".parse()?),
        )
        .init();

    let config = Config::from_env().context("failed to load configuration")?;

    let connection = establish_connection(&config.database_url)
        .with_context(|| format!("failed to open database {}", config.database_url))?;
    info!(database_url = %config.database_url, "Connected to database");

    if config.webhook_signing_secret.is_none() {
        warn!("WEBHOOK_SIGNING_SECRET is not set; inbound webhooks will not be verified");
    }
    if config.summary.api_key.is_none() {
        warn!("SUMMARY_API_KEY is not set; summary requests will fail");
    }

    let bind_address = config.bind_address.clone();
    let request_timeout = config.request_timeout;
    let app_state = DefaultAppState::new(Arc::new(Mutex::new(connection)), config)
        .context("failed to build HTTP clients")?;
    let shutdown_state = ShutdownState::new();

    let app = create_app(app_state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(GracefulShutdownLayer::new(shutdown_state.clone()))
            .layer(TimeoutLayer::new(request_timeout)),
    );

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("failed to bind to {bind_address}"))?;

    info!(bind_address = %bind_address, "Server running");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown_state))
        .await
        .context("server error")?;

    Ok(())
}

async fn shutdown_signal(shutdown_state: ShutdownState) {
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
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!(
        in_flight = shutdown_state.in_flight_count(),
        "Shutdown signal received, draining in-flight requests"
    );
    let shutdown_completed = shutdown_state.completed();
    shutdown_state.start_shutdown();

    shutdown_completed.await;
    info!("Graceful shutdown completed - all requests finished");
}
