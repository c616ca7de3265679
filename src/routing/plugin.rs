//! Plugin chain consulted for paths the route table does not know.

use std::sync::Arc;

use axum::{body::Body, http::Request};
use futures_util::future::BoxFuture;
use url::Url;

use crate::http::response::Reply;
use crate::routing::table::HandlerResult;

/// Optional routing capability of a plugin.
pub trait PluginRouteHandler: Send + Sync {
    fn route<'a>(
        &'a self,
        url: &'a Url,
        request: &'a mut Request<Body>,
        reply: &'a mut Reply,
    ) -> BoxFuture<'a, HandlerResult>;
}

/// A loaded extension.
pub trait Plugin: Send + Sync {
    fn name(&self) -> &str;

    /// Plugins that serve HTTP routes return `Some(self)`.
    fn route_handler(&self) -> Option<&dyn PluginRouteHandler> {
        None
    }
}

/// Plugins in registration order. Earlier plugins run first.
#[derive(Clone, Default)]
pub struct PluginChain {
    plugins: Vec<Arc<dyn Plugin>>,
}

impl PluginChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push<P: Plugin + 'static>(&mut self, plugin: P) -> &mut Self {
        tracing::debug!(plugin = plugin.name(), routes = plugin.route_handler().is_some(), "Plugin registered");
        self.plugins.push(Arc::new(plugin));
        self
    }

    /// Route-capable plugins, in order.
    pub fn route_handlers(&self) -> impl Iterator<Item = (&str, &dyn PluginRouteHandler)> + '_ {
        self.plugins
            .iter()
            .filter_map(|p| p.route_handler().map(|h| (p.name(), h)))
    }

    pub fn names(&self) -> Vec<&str> {
        self.plugins.iter().map(|p| p.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

impl std::fmt::Debug for PluginChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
