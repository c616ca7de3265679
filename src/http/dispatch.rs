//! Request routing for ordinary (non-upgrade) traffic.
//!
//! # Responsibilities
//! - Authenticate the request (root path exempt)
//! - Route to a registered handler, or offer the request to every plugin
//! - Answer 404 when nothing responded
//! - Contain handler errors and panics in a 500 response
//!
//! # Design Decisions
//! - The whole sequence runs inside one error boundary; nothing escapes it
//! - `Range` and `Expect` are refused on registered paths (416 / 417)
//! - Plugins run in registration order, every one of them, even after an
//!   earlier plugin has answered

use std::any::Any;
use std::net::SocketAddr;
use std::panic::AssertUnwindSafe;
use std::time::Instant;

use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, StatusCode},
    response::Response,
};
use futures_util::FutureExt;

use crate::http::request::{request_id, request_url};
use crate::http::response::{plain_text_headers, Reply, NOT_FOUND_BODY, UNAUTHORIZED_BODY};
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::routing::HandlerResult;
use crate::security::auth::authorize_request;

/// Route one request and produce its response. Never fails.
pub async fn dispatch(state: &AppState, mut request: Request<Body>, peer: SocketAddr) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let request_id = request_id(&request).to_string();
    let mut reply = Reply::new();

    let outcome = AssertUnwindSafe(route_request(state, &mut request, &mut reply, peer))
        .catch_unwind()
        .await;

    let failure = match outcome {
        Ok(Ok(())) => None,
        Ok(Err(error)) => Some(format!("{error:#?}")),
        Err(panic) => Some(panic_message(panic.as_ref())),
    };

    if let Some(diagnostic) = failure {
        tracing::error!(
            request_id = %request_id,
            peer = %peer,
            method = %method,
            path = %request.uri().path(),
            error = %diagnostic,
            "Request handling failed"
        );
        contain_failure(&mut reply, &state.base_headers, &diagnostic);
    }

    metrics::record_request(method.as_str(), reply.status().as_u16(), start);
    reply.into_response()
}

async fn route_request(
    state: &AppState,
    request: &mut Request<Body>,
    reply: &mut Reply,
    peer: SocketAddr,
) -> HandlerResult {
    let url = request_url(request)?;

    if let Err(reason) = authorize_request(&state.secret, url.path(), request.headers()) {
        tracing::warn!(
            peer = %peer,
            method = %request.method(),
            path = %url.path(),
            reason = %reason,
            "Authorization missing"
        );
        reply.respond(
            StatusCode::UNAUTHORIZED,
            &plain_text_headers(&state.base_headers),
            UNAUTHORIZED_BODY,
        )?;
        return Ok(());
    }

    match state.routes.get(url.path()) {
        Some(route) => {
            let method = normalized_method(request.method());
            if !route.allows(&method) {
                reply.respond(StatusCode::METHOD_NOT_ALLOWED, &HeaderMap::new(), "")?;
            } else if request.headers().contains_key(header::RANGE) {
                reply.respond(StatusCode::RANGE_NOT_SATISFIABLE, &HeaderMap::new(), "")?;
            } else if request.headers().contains_key(header::EXPECT) {
                reply.respond(StatusCode::EXPECTATION_FAILED, &HeaderMap::new(), "")?;
            } else {
                route.handler().handle(request, reply, &url).await?;
            }
        }
        None => {
            for (name, plugin) in state.plugins.route_handlers() {
                tracing::trace!(plugin = name, path = %url.path(), "Offering request to plugin");
                plugin.route(&url, request, reply).await?;
            }
        }
    }

    if !reply.headers_sent() && reply.is_writable() {
        reply.respond(
            StatusCode::NOT_FOUND,
            &plain_text_headers(&state.base_headers),
            NOT_FOUND_BODY,
        )?;
    }
    Ok(())
}

// Extension methods arrive verbatim; route tables list them upper case.
fn normalized_method(method: &Method) -> Method {
    let upper = method.as_str().to_ascii_uppercase();
    if upper == method.as_str() {
        return method.clone();
    }
    Method::from_bytes(upper.as_bytes()).unwrap_or_else(|_| method.clone())
}

/// Turn a failure into whatever part of a 500 can still be written.
fn contain_failure(reply: &mut Reply, base_headers: &HeaderMap, diagnostic: &str) {
    if !reply.headers_sent() {
        let _ = reply.write_head(StatusCode::INTERNAL_SERVER_ERROR, &plain_text_headers(base_headers));
    }
    if reply.is_writable() {
        let _ = reply.end(diagnostic);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("panicked: {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("panicked: {message}")
    } else {
        "panicked with a non-string payload".to_string()
    }
}
