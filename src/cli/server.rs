use std::sync::Arc;

use anyhow::Result;
use unicorn_sport::{
    AppState, Config,
    billing::StripeGateway,
    storage::{MediaStorage, S3Store},
};

pub async fn serve(
    config: Config,
    host_override: Option<String>,
    port_override: Option<u16>,
) -> Result<()> {
    tracing::info!("Starting unicorn-sport server...");

    // CLI overrides win over the config file
    let host = host_override.unwrap_or(config.server.host.to_owned());
    let port = port_override.unwrap_or(config.server.port);

    let pool = unicorn_sport::create_pool(&config.database.url, config.database.max_connections)
        .await?;
    unicorn_sport::migrate(&pool).await?;

    if !config.storage.is_configured() {
        tracing::warn!("Object storage credentials missing, uploads and streams will return 503");
    }
    if config.stripe.secret_key.is_empty() {
        tracing::warn!("Stripe secret key missing, checkout will return 503");
    }

    let storage = MediaStorage::new(
        Arc::new(S3Store::new(config.storage.clone())),
        &config.storage.cdn_url,
    );
    let payments = Arc::new(StripeGateway::new(&config.stripe.secret_key));

    let state = AppState::new(config, pool.clone(), storage, payments);
    let app = unicorn_sport::router(state);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Closing database pool...");
    pool.close().await;
    tracing::info!("Shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {e}");
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
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal");
        },
    }

    tracing::info!("Starting graceful shutdown...");
}
