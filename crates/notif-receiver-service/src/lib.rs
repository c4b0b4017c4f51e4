//! Axum application wiring: router construction and the server loop.

pub mod config;
pub mod errors;
pub mod handler;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use notif_receiver_core::ObjectStore;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ObjectStore>,
    pub cancellation: CancellationToken,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/hook/:path", post(handler::receive_webhook))
        .route("/healthz", get(handler::healthz))
        .route("/readyz", get(handler::readyz))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new()),
        )
        .with_state(state)
}

/// Bind `addr`, serve `router`, and shut down cleanly on `SIGINT`/`SIGTERM`.
///
/// Shutdown cancels `cancellation`, which the notify pipeline checks
/// periodically while iterating a Receiver's resolved resource set; any
/// request still in flight abandons further annotation writes rather than
/// completing against a process that is already exiting.
pub async fn serve(addr: SocketAddr, router: Router, cancellation: CancellationToken) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal(cancellation))
        .await?;

    Ok(())
}

async fn shutdown_signal(cancellation: CancellationToken) {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
    cancellation.cancel();
}
