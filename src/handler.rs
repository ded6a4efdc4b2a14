// File: handler.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use std::sync::Arc;

use async_trait::async_trait;
use log::debug;
use reqwest::Url;

use crate::config::ShadowConfig;
use crate::mode::{ModeController, ProxyMode};
use crate::orchestrator::DiffingOrchestrator;
use crate::recorder::ResponseSink;
use crate::request::ProxyRequest;
use crate::upstream::UpstreamHandler;

/// Something that answers a request by writing into a sink.
///
/// Failures are expressed as response statuses, never as returned errors.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn serve(&self, req: ProxyRequest, sink: &mut dyn ResponseSink);
}

#[async_trait]
impl<H> Handler for Arc<H>
where
    H: Handler + ?Sized,
{
    async fn serve(&self, req: ProxyRequest, sink: &mut dyn ResponseSink) {
        (**self).serve(req, sink).await
    }
}

/// Front handler that routes each request to the default backend, the
/// alternative backend, or both with a comparison.
pub struct StranglerHandler {
    controller: Arc<dyn ModeController>,
    default: Arc<dyn Handler>,
    alternative: Arc<dyn Handler>,
    diff: DiffingOrchestrator,
}

impl StranglerHandler {
    pub fn new(
        controller: Arc<dyn ModeController>,
        default: Arc<dyn Handler>,
        alternative: Arc<dyn Handler>,
        config: ShadowConfig,
    ) -> Self {
        let diff = DiffingOrchestrator::new(Arc::clone(&default), Arc::clone(&alternative), config);
        StranglerHandler {
            controller,
            default,
            alternative,
            diff,
        }
    }

    /// Proxies both backends with [`UpstreamHandler`]s.
    pub fn from_urls(
        controller: Arc<dyn ModeController>,
        default_url: Url,
        alternative_url: Url,
        config: ShadowConfig,
    ) -> Self {
        let client = reqwest::Client::new();
        Self::new(
            controller,
            Arc::new(UpstreamHandler::with_client(default_url, client.clone())),
            Arc::new(UpstreamHandler::with_client(alternative_url, client)),
            config,
        )
    }

    pub fn orchestrator(&self) -> &DiffingOrchestrator {
        &self.diff
    }

    /// Waits for every comparison still running in the background.
    pub async fn drain(&self) {
        self.diff.drain().await;
    }
}

#[async_trait]
impl Handler for StranglerHandler {
    async fn serve(&self, req: ProxyRequest, sink: &mut dyn ResponseSink) {
        let mode = self.controller.mode(&req);
        debug!("{} {} -> {}", req.method(), req.path(), mode);
        match mode {
            ProxyMode::UseDefault => self.default.serve(req, sink).await,
            ProxyMode::UseAlternative => self.alternative.serve(req, sink).await,
            ProxyMode::UseDefaultAndDiff => self.diff.serve(req, sink).await,
        }
    }
}

#[cfg(test)]
#[path = "handler_tests.rs"]
mod tests;
