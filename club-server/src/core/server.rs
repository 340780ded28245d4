//! HTTP 服务器启动和管理

use axum::Router;
use std::future::Future;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api;
use crate::core::{Config, ServerState};

/// Build a router with all routes registered (no middleware, no state)
pub fn build_router() -> Router<ServerState> {
    Router::new()
        .merge(api::health::router())
        .merge(api::app_data::router())
        .merge(api::mutate::router())
}

/// Fully configured application
pub fn build_app(state: ServerState) -> Router {
    build_router()
        .layer(
            ServiceBuilder::new()
                // Trace - Request tracing (logs at INFO level)
                .layer(TraceLayer::new_for_http())
                // CORS - the web client is served from another origin
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

pub struct Server {
    config: Config,
    state: ServerState,
}

impl Server {
    pub fn new(config: Config, state: ServerState) -> Self {
        Self { config, state }
    }

    /// Bind the configured address and serve until Ctrl-C
    pub async fn run(self) -> std::io::Result<()> {
        let addr = self
            .config
            .bind_addr()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;
        let listener = TcpListener::bind(addr).await?;
        tracing::info!("Club server listening on {}", listener.local_addr()?);
        serve(listener, self.state, shutdown_signal()).await
    }
}

/// Serve on an already bound listener
pub async fn serve(
    listener: TcpListener,
    state: ServerState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    axum::serve(listener, build_app(state))
        .with_graceful_shutdown(shutdown)
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    tracing::info!("Shutting down...");
}
