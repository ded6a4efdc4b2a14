// File: duplicator.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use log::debug;

use crate::config::ShadowConfig;
use crate::context::CancelGuard;
use crate::errors::ProxyResult;
use crate::request::{ProxyRequest, RequestInfo};

/// The two copies of one inbound request.
#[derive(Debug)]
pub struct ForkedRequest {
    /// Carries the caller's context unchanged.
    pub primary: ProxyRequest,
    /// Carries a context derived through the configured policy and bounded by
    /// the alternative timeout.
    pub secondary: ProxyRequest,
    /// Cancels the secondary context when dropped.
    pub secondary_guard: CancelGuard,
    pub info: RequestInfo,
}

/// Buffers the body of `req` once and splits it into two replayable copies
/// sharing that buffer.
pub async fn fork(mut req: ProxyRequest, config: &ShadowConfig) -> ProxyResult<ForkedRequest> {
    let payload = req.read_body().await?;
    debug!(
        "Forking {} {} ({} byte payload)",
        req.method(),
        req.path(),
        payload.len()
    );

    let derived = config.alternative_context().apply(req.context());
    let (secondary_context, secondary_guard) =
        derived.with_timeout(config.alternative_timeout());
    let secondary = req.clone_with_context(secondary_context)?;
    let info = req.info();

    Ok(ForkedRequest {
        primary: req,
        secondary,
        secondary_guard,
        info,
    })
}

#[cfg(test)]
#[path = "duplicator_tests.rs"]
mod tests;
