//! Protocol-upgrade classification.
//!
//! # Responsibilities
//! - Authenticate upgrade requests (secret + user id)
//! - Refuse with a bare 401 and close the connection on failure
//! - Load the control-channel handler on first use and hand it the request
//!
//! # Data Flow
//! ```text
//! Upgrade request
//!     → authorize_upgrade (security::auth)
//!     → 401 + Connection: close            (refused)
//!     → UpgradeSlot::get → handle_upgrade  (accepted)
//! ```
//!
//! # Design Decisions
//! - The handler owns the connection after `handle_upgrade`; the request it
//!   receives carries hyper's pending upgrade, which holds the socket and
//!   any bytes the client sent past the head
//! - The handler is loaded at most once; concurrent first uses wait on the
//!   same initialization without blocking the runtime

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, HeaderValue, Request, StatusCode},
    response::Response,
};
use futures_util::future::{BoxFuture, FutureExt};
use tokio::sync::OnceCell;

use crate::error::{GatewayError, Result};
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::security::auth::authorize_upgrade;

/// Takes over an authenticated upgrade request.
///
/// Returns the handshake response (normally `101 Switching Protocols`).
/// The validated [`UserId`](crate::security::auth::UserId) is available in
/// the request extensions.
pub trait UpgradeHandler: Send + Sync {
    fn handle_upgrade(&self, request: Request<Body>, peer: SocketAddr) -> Response;
}

type LoadFn = dyn Fn() -> BoxFuture<'static, Result<Arc<dyn UpgradeHandler>>> + Send + Sync;

/// Lazily loaded, cached control-channel handler.
pub struct UpgradeSlot {
    loader: Box<LoadFn>,
    handler: OnceCell<Arc<dyn UpgradeHandler>>,
}

impl UpgradeSlot {
    /// Defer loading until the first authenticated upgrade.
    pub fn lazy<F, Fut>(loader: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Arc<dyn UpgradeHandler>>> + Send + 'static,
    {
        Self {
            loader: Box::new(move || loader().boxed()),
            handler: OnceCell::new(),
        }
    }

    /// A slot whose handler is already available.
    pub fn ready(handler: Arc<dyn UpgradeHandler>) -> Self {
        Self {
            loader: Box::new(|| {
                async { Err(GatewayError::UpgradeHandlerLoad("preloaded slot has no loader".into())) }.boxed()
            }),
            handler: OnceCell::new_with(Some(handler)),
        }
    }

    /// Get the handler, loading it if this is the first use.
    ///
    /// A failed load leaves the slot empty so the next upgrade retries.
    pub async fn get(&self) -> Result<&Arc<dyn UpgradeHandler>> {
        self.handler
            .get_or_try_init(|| async {
                tracing::info!("Loading control-channel handler");
                (self.loader)().await
            })
            .await
    }

    pub fn is_loaded(&self) -> bool {
        self.handler.initialized()
    }
}

impl std::fmt::Debug for UpgradeSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpgradeSlot")
            .field("loaded", &self.is_loaded())
            .finish_non_exhaustive()
    }
}

/// Entry point for requests classified as upgrades.
pub async fn classify_upgrade(state: &AppState, mut request: Request<Body>, peer: SocketAddr) -> Response {
    tracing::info!(peer = %peer, "Incoming connection from /{}:{}", peer.ip(), peer.port());

    let user_id = match authorize_upgrade(&state.secret, state.user_id_header.as_str(), request.headers()) {
        Ok(user_id) => user_id,
        Err(reason) => {
            tracing::warn!(peer = %peer, reason = %reason, "Upgrade refused");
            metrics::record_upgrade("unauthorized");
            return unauthorized_upgrade();
        }
    };

    let handler = match state.upgrade.get().await {
        Ok(handler) => Arc::clone(handler),
        Err(e) => {
            tracing::error!(peer = %peer, error = %e, "Control-channel handler unavailable");
            metrics::record_upgrade("error");
            let mut response = Response::new(Body::empty());
            *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            response
                .headers_mut()
                .insert(header::CONNECTION, HeaderValue::from_static("close"));
            return response;
        }
    };

    tracing::debug!(peer = %peer, user_id = %user_id, "Upgrade accepted");
    metrics::record_upgrade("accepted");
    request.extensions_mut().insert(user_id);
    handler.handle_upgrade(request, peer)
}

/// Status line only; the connection is closed once it is written.
fn unauthorized_upgrade() -> Response {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = StatusCode::UNAUTHORIZED;
    response
        .headers_mut()
        .insert(header::CONNECTION, HeaderValue::from_static("close"));
    response
}
