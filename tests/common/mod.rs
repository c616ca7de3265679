//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    body::Body,
    extract::connect_info::MockConnectInfo,
    http::{HeaderMap, Request, StatusCode},
    Router,
};
use futures_util::future::BoxFuture;
use tokio::net::TcpListener;
use tower::ServiceExt;
use url::Url;

use control_gateway::config::GatewayConfig;
use control_gateway::error::GatewayError;
use control_gateway::http::{GatewayServer, Reply, UpgradeHandler, UpgradeSlot};
use control_gateway::lifecycle::Shutdown;
use control_gateway::routing::{HandlerResult, Plugin, PluginChain, PluginRouteHandler, RouteHandler, RouteTable};

pub type CallLog = Arc<Mutex<Vec<String>>>;

pub fn call_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn calls(log: &CallLog) -> Vec<String> {
    log.lock().unwrap().clone()
}

pub fn config_with_password(password: &str) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.server.password = Some(password.to_string());
    config
}

/// Records every URL it is invoked with and answers 200 with `body`.
pub struct Recording {
    pub log: CallLog,
    pub body: &'static str,
}

impl RouteHandler for Recording {
    fn handle<'a>(
        &'a self,
        _request: &'a mut Request<Body>,
        reply: &'a mut Reply,
        url: &'a Url,
    ) -> BoxFuture<'a, HandlerResult> {
        Box::pin(async move {
            self.log.lock().unwrap().push(url.to_string());
            reply.respond(StatusCode::OK, &HeaderMap::new(), self.body)?;
            Ok(())
        })
    }
}

/// Fails before writing anything.
pub struct Failing;

impl RouteHandler for Failing {
    fn handle<'a>(
        &'a self,
        _request: &'a mut Request<Body>,
        _reply: &'a mut Reply,
        _url: &'a Url,
    ) -> BoxFuture<'a, HandlerResult> {
        Box::pin(async { Err("database offline".into()) })
    }
}

/// Writes a head and part of a body, then fails.
pub struct FailsMidResponse;

impl RouteHandler for FailsMidResponse {
    fn handle<'a>(
        &'a self,
        _request: &'a mut Request<Body>,
        reply: &'a mut Reply,
        _url: &'a Url,
    ) -> BoxFuture<'a, HandlerResult> {
        Box::pin(async move {
            reply.write_head(StatusCode::OK, &HeaderMap::new())?;
            reply.write("partial|")?;
            Err("stream interrupted".into())
        })
    }
}

fn explode() -> HandlerResult {
    panic!("handler exploded")
}

/// Panics inside the handler future.
pub struct Panicking;

impl RouteHandler for Panicking {
    fn handle<'a>(
        &'a self,
        _request: &'a mut Request<Body>,
        _reply: &'a mut Reply,
        _url: &'a Url,
    ) -> BoxFuture<'a, HandlerResult> {
        Box::pin(async { explode() })
    }
}

/// Route-capable plugin that logs its name and answers if nobody has yet.
pub struct OrderedPlugin {
    pub name: &'static str,
    pub log: CallLog,
    pub respond: bool,
}

impl Plugin for OrderedPlugin {
    fn name(&self) -> &str {
        self.name
    }

    fn route_handler(&self) -> Option<&dyn PluginRouteHandler> {
        Some(self)
    }
}

impl PluginRouteHandler for OrderedPlugin {
    fn route<'a>(
        &'a self,
        url: &'a Url,
        _request: &'a mut Request<Body>,
        reply: &'a mut Reply,
    ) -> BoxFuture<'a, HandlerResult> {
        Box::pin(async move {
            self.log.lock().unwrap().push(format!("{}:{}", self.name, url.path()));
            if self.respond && !reply.headers_sent() {
                reply.respond(StatusCode::OK, &HeaderMap::new(), self.name)?;
            }
            Ok(())
        })
    }
}

/// Plugin without the routing capability.
pub struct SilentPlugin;

impl Plugin for SilentPlugin {
    fn name(&self) -> &str {
        "silent"
    }
}

/// Answers 101 without touching the connection.
pub struct AcceptAll;

impl UpgradeHandler for AcceptAll {
    fn handle_upgrade(&self, _request: Request<Body>, _peer: SocketAddr) -> axum::response::Response {
        let mut response = axum::response::Response::new(Body::empty());
        *response.status_mut() = StatusCode::SWITCHING_PROTOCOLS;
        response
    }
}

/// Upgrade slot counting how often its loader runs.
pub fn counting_slot() -> (UpgradeSlot, Arc<AtomicUsize>) {
    let loads = Arc::new(AtomicUsize::new(0));
    let counter = loads.clone();
    let slot = UpgradeSlot::lazy(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        async { Ok::<_, GatewayError>(Arc::new(AcceptAll) as Arc<dyn UpgradeHandler>) }
    });
    (slot, loads)
}

/// Router with a fake peer address, for driving requests without a socket.
pub fn test_router(server: &GatewayServer) -> Router {
    let peer: SocketAddr = "203.0.113.7:40000".parse().unwrap();
    server.router().layer(MockConnectInfo(peer))
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

pub async fn send(router: &Router, request: Request<Body>) -> TestResponse {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    TestResponse {
        status,
        headers,
        body: String::from_utf8_lossy(&bytes).into_owned(),
    }
}

/// Bind a real listener on an ephemeral port and serve in the background.
pub async fn spawn_server(
    config: GatewayConfig,
    routes: RouteTable,
    plugins: PluginChain,
    upgrade: UpgradeSlot,
) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server = GatewayServer::new(config, routes, plugins, upgrade);
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    (addr, shutdown)
}
