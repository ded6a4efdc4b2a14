// File: request.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use std::fmt;
use std::io;

use bytes::Bytes;
use futures::stream::{BoxStream, StreamExt};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;

use crate::context::RequestContext;
use crate::errors::{ProxyError, ProxyResult};

/// Request body. An inbound body usually arrives as a stream and can be read
/// once; after [`ProxyRequest::read_body`] it is buffered and every read
/// replays the same bytes.
pub enum Payload {
    Buffered(Bytes),
    Stream(BoxStream<'static, io::Result<Vec<u8>>>),
}

impl Payload {
    pub fn empty() -> Self {
        Payload::Buffered(Bytes::new())
    }

    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Payload::Buffered(Bytes::from(bytes.into()))
    }

    pub fn from_stream(stream: BoxStream<'static, io::Result<Vec<u8>>>) -> Self {
        Payload::Stream(stream)
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Payload::Buffered(bytes) => Some(bytes.as_ref()),
            Payload::Stream(_) => None,
        }
    }

    pub fn is_buffered(&self) -> bool {
        matches!(self, Payload::Buffered(_))
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payload::Buffered(bytes) => write!(f, "Buffered({} bytes)", bytes.len()),
            Payload::Stream(_) => write!(f, "Stream"),
        }
    }
}

impl Default for Payload {
    fn default() -> Self {
        Payload::empty()
    }
}

#[derive(Debug)]
pub struct ProxyRequest {
    method: Method,
    path: String,
    query: Option<String>,
    headers: HeaderMap,
    body: Payload,
    context: RequestContext,
}

impl ProxyRequest {
    /// Builds a request from a method and an origin-form target such as
    /// `/items?page=2`.
    pub fn new(method: Method, target: &str) -> Self {
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path, Some(query.to_string())),
            None => (target, None),
        };
        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{}", path)
        };
        ProxyRequest {
            method,
            path,
            query,
            headers: HeaderMap::new(),
            body: Payload::empty(),
            context: RequestContext::background(),
        }
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_body(mut self, body: Payload) -> Self {
        self.body = body;
        self
    }

    pub fn with_context(mut self, context: RequestContext) -> Self {
        self.context = context;
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn path_and_query(&self) -> String {
        match &self.query {
            Some(query) => format!("{}?{}", self.path, query),
            None => self.path.clone(),
        }
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    pub fn body(&self) -> &Payload {
        &self.body
    }

    pub fn context(&self) -> &RequestContext {
        &self.context
    }

    pub fn info(&self) -> RequestInfo {
        RequestInfo {
            method: self.method.clone(),
            path: self.path.clone(),
            query: self.query.clone(),
        }
    }

    /// Reads the body to the end, buffering it in place.
    ///
    /// A streaming body is drained exactly once; afterwards the request holds
    /// the buffered bytes and further calls return them without reading.
    pub async fn read_body(&mut self) -> ProxyResult<Bytes> {
        match &mut self.body {
            Payload::Buffered(bytes) => Ok(bytes.clone()),
            Payload::Stream(stream) => {
                let mut buf = Vec::new();
                while let Some(chunk) = stream.next().await {
                    buf.extend_from_slice(&chunk?);
                }
                let bytes = Bytes::from(buf);
                self.body = Payload::Buffered(bytes.clone());
                Ok(bytes)
            }
        }
    }

    /// Clones a buffered request onto a different context. The body bytes are
    /// shared, not copied.
    pub fn clone_with_context(&self, context: RequestContext) -> ProxyResult<ProxyRequest> {
        let bytes = match &self.body {
            Payload::Buffered(bytes) => bytes.clone(),
            Payload::Stream(_) => return Err(ProxyError::BodyNotBuffered),
        };
        Ok(ProxyRequest {
            method: self.method.clone(),
            path: self.path.clone(),
            query: self.query.clone(),
            headers: self.headers.clone(),
            body: Payload::Buffered(bytes),
            context,
        })
    }
}

/// What the reporter learns about a request once the handlers are done with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestInfo {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
}

impl fmt::Display for RequestInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}

#[cfg(test)]
#[path = "request_tests.rs"]
mod tests;
