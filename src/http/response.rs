//! Per-request response writer.
//!
//! # Responsibilities
//! - Give handlers and plugins a shared, incrementally written response
//! - Track whether the head was sent and whether the body is finished
//! - Build the gateway's standard error responses
//!
//! # Design Decisions
//! - Head and body are buffered; the wire response is built once the whole
//!   dispatch sequence (including the error boundary) has run
//! - Writing the head twice or writing after `end` is an error, so a late
//!   plugin cannot silently clobber an earlier one's response

use axum::{
    body::Body,
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::Response,
};
use thiserror::Error;

pub const TEXT_PLAIN: &str = "text/plain";
pub const UNAUTHORIZED_BODY: &str = "Unauthorized";
pub const NOT_FOUND_BODY: &str = "Not Found";

/// Misuse of a [`Reply`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReplyError {
    #[error("Cannot write headers after they are sent to the client")]
    HeadersSent,

    #[error("Write after end")]
    Finished,
}

/// Response under construction for a single request.
#[derive(Debug)]
pub struct Reply {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
    headers_sent: bool,
    finished: bool,
}

impl Default for Reply {
    fn default() -> Self {
        Self::new()
    }
}

impl Reply {
    pub fn new() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: Vec::new(),
            headers_sent: false,
            finished: false,
        }
    }

    /// Set a header ahead of `write_head`.
    pub fn set_header(&mut self, name: HeaderName, value: HeaderValue) -> Result<&mut Self, ReplyError> {
        if self.headers_sent {
            return Err(ReplyError::HeadersSent);
        }
        self.headers.insert(name, value);
        Ok(self)
    }

    /// Send the status line and headers. Headers given here override any
    /// set earlier with [`Reply::set_header`].
    pub fn write_head(&mut self, status: StatusCode, headers: &HeaderMap) -> Result<&mut Self, ReplyError> {
        if self.headers_sent {
            return Err(ReplyError::HeadersSent);
        }
        self.status = status;
        for (name, value) in headers {
            self.headers.insert(name.clone(), value.clone());
        }
        self.headers_sent = true;
        Ok(self)
    }

    /// Append body bytes, implicitly sending a 200 head if none was sent.
    pub fn write(&mut self, chunk: impl AsRef<[u8]>) -> Result<&mut Self, ReplyError> {
        if self.finished {
            return Err(ReplyError::Finished);
        }
        self.headers_sent = true;
        self.body.extend_from_slice(chunk.as_ref());
        Ok(self)
    }

    /// Append a final chunk and finish the response.
    pub fn end(&mut self, chunk: impl AsRef<[u8]>) -> Result<(), ReplyError> {
        self.write(chunk)?;
        self.finished = true;
        Ok(())
    }

    /// Send `status` with `headers` and an optional body in one go.
    pub fn respond(
        &mut self,
        status: StatusCode,
        headers: &HeaderMap,
        body: impl AsRef<[u8]>,
    ) -> Result<(), ReplyError> {
        self.write_head(status, headers)?;
        self.end(body)
    }

    pub fn headers_sent(&self) -> bool {
        self.headers_sent
    }

    pub fn is_writable(&self) -> bool {
        !self.finished
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Convert into the response sent on the wire.
    pub fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

/// `base` plus `Content-Type: text/plain`.
pub fn plain_text_headers(base: &HeaderMap) -> HeaderMap {
    let mut headers = base.clone();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(TEXT_PLAIN));
    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_head_only_once() {
        let mut reply = Reply::new();
        reply.write_head(StatusCode::CREATED, &HeaderMap::new()).unwrap();
        assert!(reply.headers_sent());
        assert_eq!(
            reply.write_head(StatusCode::OK, &HeaderMap::new()).unwrap_err(),
            ReplyError::HeadersSent
        );
        assert_eq!(reply.status(), StatusCode::CREATED);
    }

    #[test]
    fn write_implies_head_and_end_closes() {
        let mut reply = Reply::new();
        reply.write("hello ").unwrap();
        assert!(reply.headers_sent());
        reply.end("world").unwrap();
        assert!(!reply.is_writable());
        assert_eq!(reply.write("!").unwrap_err(), ReplyError::Finished);
        assert_eq!(reply.body(), b"hello world");
    }

    #[test]
    fn into_response_keeps_head_and_body() {
        let mut base = HeaderMap::new();
        base.insert("x-base", HeaderValue::from_static("1"));

        let mut reply = Reply::new();
        reply
            .respond(StatusCode::NOT_FOUND, &plain_text_headers(&base), NOT_FOUND_BODY)
            .unwrap();

        let response = reply.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers()["x-base"], "1");
        assert_eq!(response.headers()[header::CONTENT_TYPE], TEXT_PLAIN);
    }
}
