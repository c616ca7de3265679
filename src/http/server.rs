//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router around the gateway entry point
//! - Wire up middleware (request ID, tracing)
//! - Classify each request as upgrade or ordinary request
//! - Bind to the listener and serve until shutdown

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderMap, HeaderName, Request},
    response::Response,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{MakeRequestUuid, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::GatewayConfig;
use crate::http::dispatch::dispatch;
use crate::http::request::{is_upgrade_request, request_id};
use crate::http::upgrade::{classify_upgrade, UpgradeSlot};
use crate::routing::{PluginChain, RouteTable};
use crate::security::auth::SharedSecret;

/// Application state injected into the entry point.
#[derive(Clone)]
pub struct AppState {
    pub routes: Arc<RouteTable>,
    pub plugins: Arc<PluginChain>,
    pub secret: Arc<SharedSecret>,
    pub user_id_header: HeaderName,
    pub base_headers: Arc<HeaderMap>,
    pub upgrade: Arc<UpgradeSlot>,
}

/// The gateway's single HTTP listener.
pub struct GatewayServer {
    router: Router,
    config: GatewayConfig,
    state: AppState,
}

impl GatewayServer {
    /// Create a server. The route table and plugin chain are frozen here.
    pub fn new(
        config: GatewayConfig,
        routes: RouteTable,
        plugins: PluginChain,
        upgrade: UpgradeSlot,
    ) -> Self {
        let state = AppState {
            routes: Arc::new(routes),
            plugins: Arc::new(plugins),
            secret: Arc::new(SharedSecret::new(config.server.password.clone())),
            user_id_header: config.server.user_id_header_name(),
            base_headers: Arc::new(config.server.base_headers()),
            upgrade: Arc::new(upgrade),
        };

        if !state.secret.is_enabled() {
            tracing::warn!("No password configured; every client is authorized");
        }

        let router = Self::build_router(state.clone());
        Self {
            router,
            config,
            state,
        }
    }

    fn build_router(state: AppState) -> Router {
        Router::new()
            .fallback(gateway_entry)
            .with_state(state)
            .layer(TraceLayer::new_for_http().make_span_with(request_span))
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// Run the server, accepting connections until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            routes = self.state.routes.len(),
            plugins = self.state.plugins.len(),
            "Gateway is ready to accept connections"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("Gateway stopped");
        Ok(())
    }

    /// The router, for driving the gateway without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}

/// Single entry point: upgrades and ordinary requests part ways here.
async fn gateway_entry(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    request: Request<Body>,
) -> Response {
    if is_upgrade_request(request.headers()) {
        classify_upgrade(&state, request, peer).await
    } else {
        dispatch(&state, request, peer).await
    }
}

fn request_span(request: &Request<Body>) -> tracing::Span {
    tracing::info_span!(
        "request",
        method = %request.method(),
        uri = %request.uri(),
        request_id = %request_id(request),
    )
}
