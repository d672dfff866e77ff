//! Object Relay - storage notification to stream bridge
//!
//! Process boundary: loads configuration, initializes logging and metrics,
//! builds the storage/stream clients and serves the invocation endpoint
//! until SIGINT/SIGTERM.

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::info;

use object_relay::config::RelayConfig;
use object_relay::server::{self, AppState};
use object_relay::storage::ObjectStorageClient;
use object_relay::stream::StreamClient;
use object_relay::telemetry::RelayMetrics;
use object_relay::{http, EventRelay};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first to get log level
    let config = RelayConfig::from_env()?;

    // Initialize tracing with configured log level
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("object_relay={}", config.log_level).parse()?)
                .add_directive("reqwest=warn".parse()?)
                .add_directive("hyper=warn".parse()?),
        )
        .json()
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        region = %config.region,
        stream_id = %config.stream_id,
        "Starting Object Relay"
    );

    let metrics = RelayMetrics::install()?;
    info!("Prometheus metrics initialized");

    let http_client = http::build_client(&config)?;
    let store = ObjectStorageClient::new(http_client.clone(), &config.object_storage_endpoint)?;
    let stream = StreamClient::new(http_client, &config.stream_endpoint)?;
    info!(
        object_storage = %config.object_storage_endpoint,
        stream_endpoint = %config.stream_endpoint,
        "Clients configured"
    );

    let relay = Arc::new(EventRelay::new(
        Arc::new(store),
        Arc::new(stream),
        config.stream_id.clone(),
    ));

    let app = server::router(AppState {
        relay,
        metrics: Some(metrics),
    });

    if let Some(path) = config.unix_socket_path() {
        #[cfg(unix)]
        {
            remove_stale_socket(path)?;
            let listener = tokio::net::UnixListener::bind(path)?;
            info!(path, "Listening on unix socket");
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await?;
        }

        #[cfg(not(unix))]
        anyhow::bail!("FN_LISTENER unix sockets are not supported on this platform: {path}");
    } else {
        let addr: SocketAddr = ([0, 0, 0, 0], config.http_port).into();
        info!(port = config.http_port, "Starting HTTP server");
        axum::serve(tokio::net::TcpListener::bind(addr).await?, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
    }

    info!("Relay shutdown complete");
    Ok(())
}

/// Remove a socket left behind by a previous run; it would block bind
fn remove_stale_socket(path: &str) -> std::io::Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

/// Wait for shutdown signal (SIGTERM or SIGINT)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
