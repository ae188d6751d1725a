//! Standalone HTTP server hosting a collection dispatcher.
//!
//! # Responsibilities
//! - Create the axum Router with the REST middleware and a JSON fallback
//! - Wire up tower layers (tracing, timeouts)
//! - Bind to a listener and shut down gracefully on Ctrl-C

use axum::{
    Json, Router,
    http::{StatusCode, Uri},
    middleware,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::{future::Future, sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use restlayer_core::dispatcher::CollectionDispatcher;

use crate::middleware::{DEFAULT_BODY_LIMIT, RestState, rest_middleware};

/// Listener and limit settings for [`RestServer`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address to bind, e.g. `"127.0.0.1:8080"`.
    pub bind_address: String,
    /// Largest request body buffered by the middleware.
    pub body_limit_bytes: usize,
    /// Requests running longer than this are answered with `408`.
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".to_string(),
            body_limit_bytes: DEFAULT_BODY_LIMIT,
            request_timeout_secs: 30,
        }
    }
}

/// HTTP server exposing the dispatcher's collections.
pub struct RestServer {
    router: Router,
    config: ServerConfig,
}

impl RestServer {
    pub fn new(config: ServerConfig, dispatcher: Arc<CollectionDispatcher>) -> Self {
        let state = RestState::new(dispatcher).body_limit(config.body_limit_bytes);
        let router = Self::build_router(&config, state);

        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ServerConfig, state: RestState) -> Router {
        Router::new()
            .fallback(not_found)
            .layer(middleware::from_fn_with_state(state, rest_middleware))
            .layer(TimeoutLayer::new(Duration::from_secs(config.request_timeout_secs)))
            .layer(TraceLayer::new_for_http())
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Consumes the server, returning its router for embedding or testing.
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Binds the configured address and serves until Ctrl-C.
    pub async fn bind_and_run(self) -> Result<(), std::io::Error> {
        let listener = TcpListener::bind(&self.config.bind_address).await?;

        self.run(listener).await
    }

    /// Run the server, accepting connections on the given listener until Ctrl-C.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        self.run_until(listener, shutdown_signal()).await
    }

    /// Run the server until `shutdown` completes, then drain in-flight requests.
    pub async fn run_until(
        self,
        listener: TcpListener,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn not_found(uri: Uri) -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": format!("No route for {}", uri.path()) })),
    )
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }

    tracing::info!("Shutdown signal received");
}
