// File: common/mod.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2025
// - Volker Schwaberow <volker@schwaberow.de>

#![allow(dead_code)]

use async_trait::async_trait;
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use reqwest::StatusCode;
use serde_json::Value;
use shadowprobe::{Handler, ProxyRequest, ResponseSink, ShadowConfig};
use shadowprobe::reporter::MemoryReporter;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;
use wiremock::{MockServer, ResponseTemplate};

pub async fn setup_mock_server() -> MockServer {
    MockServer::start().await
}

pub fn create_json_response(status: u16, data: Value) -> ResponseTemplate {
    ResponseTemplate::new(status)
        .set_body_string(data.to_string())
        .append_header("content-type", "application/json")
}

/// Config wired to an in-memory reporter the test can inspect.
pub fn memory_config() -> (ShadowConfig, Arc<MemoryReporter>) {
    let reporter = Arc::new(MemoryReporter::new());
    let mut config = ShadowConfig::new();
    config.set_reporter(reporter.clone());
    (config, reporter)
}

/// Answers with a fixed status and JSON body, counting invocations and
/// remembering every body it was sent.
pub struct JsonHandler {
    status: StatusCode,
    body: Value,
    delay: Option<Duration>,
    calls: AtomicUsize,
    seen_bodies: Mutex<Vec<Vec<u8>>>,
}

impl JsonHandler {
    pub fn new(status: u16, body: Value) -> Arc<Self> {
        Arc::new(Self::build(status, body, None))
    }

    pub fn slow(status: u16, body: Value, delay: Duration) -> Arc<Self> {
        Arc::new(Self::build(status, body, Some(delay)))
    }

    fn build(status: u16, body: Value, delay: Option<Duration>) -> Self {
        JsonHandler {
            status: StatusCode::from_u16(status).unwrap(),
            body,
            delay,
            calls: AtomicUsize::new(0),
            seen_bodies: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seen_bodies(&self) -> Vec<Vec<u8>> {
        self.seen_bodies.lock().unwrap().clone()
    }
}

#[async_trait]
impl Handler for JsonHandler {
    async fn serve(&self, mut req: ProxyRequest, sink: &mut dyn ResponseSink) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let body = req.read_body().await.unwrap();
        self.seen_bodies.lock().unwrap().push(body.to_vec());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        sink.headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        sink.write_head(self.status);
        sink.write(self.body.to_string().as_bytes());
    }
}

/// Writes a raw, possibly non-JSON body.
pub struct RawHandler(pub &'static str);

#[async_trait]
impl Handler for RawHandler {
    async fn serve(&self, _req: ProxyRequest, sink: &mut dyn ResponseSink) {
        sink.write_head(StatusCode::OK);
        sink.write(self.0.as_bytes());
    }
}

pub struct PanickingHandler;

#[async_trait]
impl Handler for PanickingHandler {
    async fn serve(&self, _req: ProxyRequest, _sink: &mut dyn ResponseSink) {
        panic!("alternative backend blew up");
    }
}

/// Blocks until its request context is cancelled, then answers 504 and
/// signals `finished`.
#[derive(Default)]
pub struct WaitForCancel {
    pub started: Notify,
    pub finished: Notify,
    pub cancelled: AtomicUsize,
}

#[async_trait]
impl Handler for WaitForCancel {
    async fn serve(&self, req: ProxyRequest, sink: &mut dyn ResponseSink) {
        self.started.notify_one();
        req.context().cancelled().await;
        self.cancelled.fetch_add(1, Ordering::SeqCst);
        sink.write_head(StatusCode::GATEWAY_TIMEOUT);
        self.finished.notify_one();
    }
}

/// Sleeps for an hour without ever looking at its request context.
pub struct IgnoresContext;

#[async_trait]
impl Handler for IgnoresContext {
    async fn serve(&self, _req: ProxyRequest, sink: &mut dyn ResponseSink) {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        sink.write_head(StatusCode::OK);
    }
}
