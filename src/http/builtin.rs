//! Routes the node serves itself.

use axum::{
    body::Body,
    http::{header, HeaderMap, HeaderValue, Method, Request, StatusCode},
};
use futures_util::future::BoxFuture;
use serde::Serialize;
use url::Url;

use crate::error::Result;
use crate::http::response::{plain_text_headers, Reply};
use crate::routing::{HandlerResult, PluginChain, RouteHandler, RouteTable};

pub const VERSION_PATH: &str = "/version";
pub const INFO_PATH: &str = "/info";

/// `GET /version`: the crate version as plain text.
pub struct VersionHandler;

impl RouteHandler for VersionHandler {
    fn handle<'a>(
        &'a self,
        _request: &'a mut Request<Body>,
        reply: &'a mut Reply,
        _url: &'a Url,
    ) -> BoxFuture<'a, HandlerResult> {
        Box::pin(async move {
            reply.respond(StatusCode::OK, &plain_text_headers(&HeaderMap::new()), env!("CARGO_PKG_VERSION"))?;
            Ok(())
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NodeInfo {
    pub version: &'static str,
    pub routes: Vec<String>,
    pub plugins: Vec<String>,
}

/// `GET /info`: version, built-in routes and plugin names as JSON.
pub struct InfoHandler {
    info: NodeInfo,
}

impl RouteHandler for InfoHandler {
    fn handle<'a>(
        &'a self,
        _request: &'a mut Request<Body>,
        reply: &'a mut Reply,
        _url: &'a Url,
    ) -> BoxFuture<'a, HandlerResult> {
        Box::pin(async move {
            let body = serde_json::to_vec(&self.info)?;
            let mut headers = HeaderMap::new();
            headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
            reply.respond(StatusCode::OK, &headers, body)?;
            Ok(())
        })
    }
}

/// Register the built-in routes.
pub fn register(table: &mut RouteTable, plugins: &PluginChain) -> Result<()> {
    let info = NodeInfo {
        version: env!("CARGO_PKG_VERSION"),
        routes: vec![INFO_PATH.to_string(), VERSION_PATH.to_string()],
        plugins: plugins.names().into_iter().map(String::from).collect(),
    };

    table.register(VERSION_PATH, [Method::GET], VersionHandler)?;
    table.register(INFO_PATH, [Method::GET], InfoHandler { info })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn version_is_plain_text() {
        let mut request = Request::new(Body::empty());
        let mut reply = Reply::new();
        let url = Url::parse("http://localhost/version").unwrap();

        VersionHandler.handle(&mut request, &mut reply, &url).await.unwrap();

        assert_eq!(reply.status(), StatusCode::OK);
        assert_eq!(reply.body(), env!("CARGO_PKG_VERSION").as_bytes());
    }

    #[tokio::test]
    async fn info_lists_routes() {
        let mut table = RouteTable::new();
        register(&mut table, &PluginChain::new()).unwrap();
        assert_eq!(table.paths(), vec![INFO_PATH, VERSION_PATH]);

        let mut request = Request::new(Body::empty());
        let mut reply = Reply::new();
        let url = Url::parse("http://localhost/info").unwrap();
        table
            .get(INFO_PATH)
            .unwrap()
            .handler()
            .handle(&mut request, &mut reply, &url)
            .await
            .unwrap();

        let info: serde_json::Value = serde_json::from_slice(reply.body()).unwrap();
        assert_eq!(info["version"], env!("CARGO_PKG_VERSION"));
        assert_eq!(info["routes"][0], INFO_PATH);
    }
}
