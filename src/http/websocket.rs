//! WebSocket control-channel handler.
//!
//! # Responsibilities
//! - Complete the WebSocket handshake for accepted upgrades
//! - Wrap the upgraded connection in a WebSocket stream
//! - Hand each session to the playback engine over a channel
//!
//! # Data Flow
//! ```text
//! classify_upgrade → WebSocketControl::handle_upgrade
//!     → 101 Switching Protocols (returned to hyper)
//!     → [spawned] await upgrade → WebSocketStream → ControlSession → mpsc
//! ```
//!
//! # Design Decisions
//! - The gateway never reads frames; whoever owns the receiver speaks the
//!   control protocol
//! - A session nobody receives is dropped, which closes the socket

use std::net::SocketAddr;

use axum::{
    body::Body,
    http::{header, HeaderValue, Request, StatusCode},
    response::{IntoResponse, Response},
};
use futures_util::StreamExt;
use hyper::upgrade::Upgraded;
use hyper_util::rt::TokioIo;
use tokio::sync::mpsc;
use tokio_tungstenite::{
    tungstenite::{handshake::derive_accept_key, protocol::Role, Message},
    WebSocketStream,
};
use uuid::Uuid;

use crate::http::upgrade::UpgradeHandler;
use crate::security::auth::UserId;

/// The upgraded socket type handed to session consumers.
pub type ControlSocket = WebSocketStream<TokioIo<Upgraded>>;

/// An established control channel.
pub struct ControlSession {
    pub session_id: Uuid,
    pub user_id: UserId,
    pub peer: SocketAddr,
    pub socket: ControlSocket,
}

impl ControlSession {
    /// Read frames until the client closes. Used when no playback engine
    /// is attached to the node.
    pub async fn run_until_closed(mut self) {
        tracing::info!(session_id = %self.session_id, user_id = %self.user_id, peer = %self.peer, "Control session opened");
        while let Some(frame) = self.socket.next().await {
            match frame {
                Ok(Message::Close(_)) => break,
                Ok(Message::Text(text)) => {
                    tracing::debug!(session_id = %self.session_id, len = text.len(), "Text frame ignored");
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::debug!(session_id = %self.session_id, error = %e, "Control session error");
                    break;
                }
            }
        }
        tracing::info!(session_id = %self.session_id, "Control session closed");
    }
}

/// Upgrade handler producing [`ControlSession`]s.
pub struct WebSocketControl {
    sessions: mpsc::UnboundedSender<ControlSession>,
}

impl WebSocketControl {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ControlSession>) {
        let (sessions, rx) = mpsc::unbounded_channel();
        (Self { sessions }, rx)
    }
}

impl UpgradeHandler for WebSocketControl {
    fn handle_upgrade(&self, mut request: Request<Body>, peer: SocketAddr) -> Response {
        let is_websocket = request
            .headers()
            .get(header::UPGRADE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.eq_ignore_ascii_case("websocket"))
            .unwrap_or(false);

        let key = request
            .headers()
            .get(header::SEC_WEBSOCKET_KEY)
            .filter(|k| !k.is_empty())
            .map(|k| derive_accept_key(k.as_bytes()));

        let (Some(accept), true) = (key, is_websocket) else {
            return (StatusCode::BAD_REQUEST, "Expected a WebSocket upgrade").into_response();
        };
        let Ok(accept) = HeaderValue::from_str(&accept) else {
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        };
        let Some(user_id) = request.extensions_mut().remove::<UserId>() else {
            return StatusCode::UNAUTHORIZED.into_response();
        };

        let on_upgrade = hyper::upgrade::on(&mut request);
        let sessions = self.sessions.clone();
        let session_id = Uuid::new_v4();

        tokio::spawn(async move {
            let upgraded = match on_upgrade.await {
                Ok(upgraded) => upgraded,
                Err(e) => {
                    tracing::warn!(peer = %peer, error = %e, "Upgrade did not complete");
                    return;
                }
            };

            let socket = WebSocketStream::from_raw_socket(TokioIo::new(upgraded), Role::Server, None).await;
            let session = ControlSession {
                session_id,
                user_id,
                peer,
                socket,
            };
            if sessions.send(session).is_err() {
                tracing::warn!(peer = %peer, "No consumer for control sessions, closing");
            }
        });

        let mut response = Response::new(Body::empty());
        *response.status_mut() = StatusCode::SWITCHING_PROTOCOLS;
        let headers = response.headers_mut();
        headers.insert(header::CONNECTION, HeaderValue::from_static("upgrade"));
        headers.insert(header::UPGRADE, HeaderValue::from_static("websocket"));
        headers.insert(header::SEC_WEBSOCKET_ACCEPT, accept);
        response
    }
}
