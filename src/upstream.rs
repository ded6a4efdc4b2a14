// File: upstream.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::header::{HeaderMap, HOST};
use reqwest::{StatusCode, Url};

use crate::errors::{ProxyError, ProxyResult};
use crate::handler::Handler;
use crate::recorder::ResponseSink;
use crate::request::ProxyRequest;

/// Headers that describe a single connection and are never forwarded.
const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-connection",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Reverse proxy to a single backend.
///
/// The request path is appended to the base URL's path and the queries of
/// both are combined. Transport failures and cancellation of the request
/// context turn into `502 Bad Gateway`.
#[derive(Debug, Clone)]
pub struct UpstreamHandler {
    base: Url,
    client: reqwest::Client,
}

impl UpstreamHandler {
    pub fn new(base: Url) -> Self {
        Self::with_client(base, reqwest::Client::new())
    }

    pub fn with_client(base: Url, client: reqwest::Client) -> Self {
        UpstreamHandler { base, client }
    }

    pub fn parse(base: &str) -> ProxyResult<Self> {
        let url = Url::parse(base)
            .map_err(|e| ProxyError::InvalidUrl(format!("{}: {}", base, e)))?;
        Ok(Self::new(url))
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    pub fn target_url(&self, path: &str, query: Option<&str>) -> Url {
        let mut url = self.base.clone();
        url.set_path(&join_paths(self.base.path(), path));
        let query = match (self.base.query(), query) {
            (Some(base), Some(query)) if !base.is_empty() => Some(format!("{}&{}", base, query)),
            (Some(base), None) => Some(base.to_string()),
            (_, query) => query.map(str::to_string),
        };
        url.set_query(query.as_deref());
        url
    }
}

#[async_trait]
impl Handler for UpstreamHandler {
    async fn serve(&self, mut req: ProxyRequest, sink: &mut dyn ResponseSink) {
        let url = self.target_url(req.path(), req.query());
        let payload = match req.read_body().await {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Could not read request body for {}: {}", url, e);
                sink.write_head(StatusCode::BAD_GATEWAY);
                return;
            }
        };

        let request = self
            .client
            .request(req.method().clone(), url.clone())
            .headers(strip_hop_by_hop(req.headers(), true))
            .body(payload);
        let exchange = async {
            let response = request.send().await?;
            let status = response.status();
            let headers = response.headers().clone();
            let body = response.bytes().await?;
            Ok::<_, reqwest::Error>((status, headers, body))
        };

        let context = req.context();
        let outcome = tokio::select! {
            _ = context.cancelled() => {
                warn!("Request to {} cancelled before the backend answered", url);
                sink.write_head(StatusCode::BAD_GATEWAY);
                return;
            }
            outcome = exchange => outcome,
        };

        match outcome {
            Ok((status, headers, body)) => {
                debug!("{} {} -> {}", req.method(), url, status);
                let out = sink.headers_mut();
                for (name, value) in strip_hop_by_hop(&headers, false).iter() {
                    out.append(name.clone(), value.clone());
                }
                sink.write_head(status);
                sink.write(&body);
            }
            Err(e) => {
                warn!("Request to {} failed: {}", url, e);
                sink.write_head(StatusCode::BAD_GATEWAY);
            }
        }
    }
}

fn strip_hop_by_hop(headers: &HeaderMap, drop_host: bool) -> HeaderMap {
    let mut forwarded = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers.iter() {
        if HOP_BY_HOP.contains(&name.as_str()) || (drop_host && *name == HOST) {
            continue;
        }
        forwarded.append(name.clone(), value.clone());
    }
    forwarded
}

fn join_paths(base: &str, path: &str) -> String {
    match (base.ends_with('/'), path.starts_with('/')) {
        (true, true) => format!("{}{}", base, &path[1..]),
        (false, false) => format!("{}/{}", base, path),
        _ => format!("{}{}", base, path),
    }
}

#[cfg(test)]
#[path = "upstream_tests.rs"]
mod tests;
