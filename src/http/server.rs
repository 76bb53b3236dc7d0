//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Wrap the inner application router with the security pipeline
//! - Wire up cross-cutting middleware (tracing, timeout, request ID)
//! - Bind the server to a listener and serve until shutdown
//!
//! # Design Decisions
//! - The inner application (the "renderer") is supplied by the caller; the
//!   gateway owns only the header/nonce/rewrite layers around it
//! - Layer order is load-bearing: the nonce must be issued before the header
//!   and rewrite layers run on the request path

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{middleware, Router};
use axum_server::tls_rustls::RustlsConfig;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::schema::GatewayConfig;
use crate::http::request::request_id_middleware;
use crate::security::headers::{security_headers_middleware, HeaderComposeError, HeaderPlan};
use crate::security::nonce::nonce_middleware;
use crate::security::rewrite::rewrite_middleware;

/// Application state injected into the security middleware.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GatewayConfig>,
    pub plan: Arc<HeaderPlan>,
}

/// HTTP server for the security-header gateway.
pub struct HttpServer {
    router: Router,
    config: Arc<GatewayConfig>,
}

impl HttpServer {
    /// Wrap `app` with the security pipeline described by `config`.
    ///
    /// The config must already have passed validation; header precomputation
    /// is the only remaining failure point.
    pub fn new(config: GatewayConfig, app: Router) -> Result<Self, HeaderComposeError> {
        let plan = HeaderPlan::new(&config)?;
        let config = Arc::new(config);
        let state = AppState {
            config: config.clone(),
            plan: Arc::new(plan),
        };

        let router = Self::build_router(app, state, &config);
        Ok(Self { router, config })
    }

    /// Build the router with all middleware layers.
    fn build_router(app: Router, state: AppState, config: &GatewayConfig) -> Router {
        // Layers run top-down on the request path in reverse registration
        // order: trace → timeout → request ID → nonce → headers → rewrite.
        app.layer(middleware::from_fn_with_state(
            state.clone(),
            rewrite_middleware,
        ))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            security_headers_middleware,
        ))
        .layer(middleware::from_fn(nonce_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.listener.request_timeout_secs,
        )))
        .layer(TraceLayer::new_for_http())
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(async move {
                tokio::select! {
                    _ = shutdown.recv() => {}
                    _ = tokio::signal::ctrl_c() => {}
                }
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Run the server over TLS.
    pub async fn run_tls(
        self,
        addr: SocketAddr,
        tls: RustlsConfig,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        tracing::info!(address = %addr, "HTTPS server starting");

        let handle = axum_server::Handle::new();
        let graceful = handle.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = shutdown.recv() => {}
                _ = tokio::signal::ctrl_c() => {}
            }
            tracing::info!("Shutdown signal received");
            graceful.graceful_shutdown(Some(Duration::from_secs(10)));
        });

        axum_server::bind_rustls(addr, tls)
            .handle(handle)
            .serve(self.router.into_make_service())
            .await?;

        tracing::info!("HTTPS server stopped");
        Ok(())
    }

    /// Consume the server, yielding the fully layered router.
    ///
    /// Useful for embedding the pipeline into a larger application or for
    /// driving it in tests without binding a socket.
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}
