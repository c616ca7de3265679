//! Exact-match route table.
//!
//! # Responsibilities
//! - Store one handler descriptor per registered path
//! - Look up the descriptor for a request path
//!
//! # Design Decisions
//! - Built once at startup, then frozen behind `Arc` (no locks on lookup)
//! - Exact, case-sensitive keys; no prefixes or wildcards
//! - Duplicate registrations are rejected instead of silently replaced

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request},
    BoxError,
};
use futures_util::future::BoxFuture;
use url::Url;

use crate::error::{GatewayError, Result};
use crate::http::response::Reply;

/// Outcome of a handler or plugin. Any error is caught by the dispatch
/// error boundary and rendered as a 500.
pub type HandlerResult = std::result::Result<(), BoxError>;

/// Logic behind a registered path.
///
/// The request is passed mutably so the handler can take the body with
/// `std::mem::take(request.body_mut())`.
pub trait RouteHandler: Send + Sync {
    fn handle<'a>(
        &'a self,
        request: &'a mut Request<Body>,
        reply: &'a mut Reply,
        url: &'a Url,
    ) -> BoxFuture<'a, HandlerResult>;
}

/// A registered path: the methods it accepts and the handler behind it.
#[derive(Clone)]
pub struct Route {
    methods: HashSet<Method>,
    handler: Arc<dyn RouteHandler>,
}

impl Route {
    pub fn allows(&self, method: &Method) -> bool {
        self.methods.contains(method)
    }

    pub fn methods(&self) -> &HashSet<Method> {
        &self.methods
    }

    pub fn handler(&self) -> &dyn RouteHandler {
        self.handler.as_ref()
    }
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route").field("methods", &self.methods).finish_non_exhaustive()
    }
}

/// Mapping from request path to [`Route`].
#[derive(Debug, Default, Clone)]
pub struct RouteTable {
    routes: HashMap<String, Route>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `path`, accepting `methods`.
    pub fn register<H>(
        &mut self,
        path: impl Into<String>,
        methods: impl IntoIterator<Item = Method>,
        handler: H,
    ) -> Result<&mut Self>
    where
        H: RouteHandler + 'static,
    {
        let path = path.into();
        if !path.starts_with('/') {
            return Err(GatewayError::InvalidRoutePath(path));
        }
        if self.routes.contains_key(&path) {
            return Err(GatewayError::DuplicateRoute(path));
        }

        let methods: HashSet<Method> = methods.into_iter().collect();
        if methods.is_empty() {
            return Err(GatewayError::NoMethods(path));
        }

        tracing::debug!(path = %path, methods = ?methods, "Route registered");
        self.routes.insert(
            path,
            Route {
                methods,
                handler: Arc::new(handler),
            },
        );
        Ok(self)
    }

    pub fn get(&self, path: &str) -> Option<&Route> {
        self.routes.get(path)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Registered paths, sorted.
    pub fn paths(&self) -> Vec<&str> {
        let mut paths: Vec<&str> = self.routes.keys().map(String::as_str).collect();
        paths.sort_unstable();
        paths
    }
}
