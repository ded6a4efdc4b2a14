// File: orchestrator.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

//! Shadow dispatch: one request in, two backends called in parallel, the
//! default backend's answer out, and a detached comparison afterwards.
//!
//! Per shadowed request three tasks run: the default branch, the alternative
//! branch and the diff task. The caller waits for the default branch only.
//! The diff task joins both branches before reading either snapshot, so the
//! snapshots need no locking.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::FutureExt;
use log::{debug, warn};
use reqwest::StatusCode;
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio_util::task::TaskTracker;

use crate::config::ShadowConfig;
use crate::differ::Side;
use crate::duplicator::{self, ForkedRequest};
use crate::engine::DiffEngine;
use crate::errors::{ProxyError, ProxyResult};
use crate::handler::Handler;
use crate::recorder::{ResponseRecorder, ResponseSink, ResponseSnapshot};
use crate::request::ProxyRequest;

type BranchResult = ProxyResult<Arc<ResponseSnapshot>>;

/// How long a handler may keep running after its context ends before the
/// branch is abandoned. Handlers that watch their context use it to write
/// their own response.
const ABANDON_GRACE: Duration = Duration::from_millis(100);

pub struct DiffingOrchestrator {
    default: Arc<dyn Handler>,
    alternative: Arc<dyn Handler>,
    config: ShadowConfig,
    engine: DiffEngine,
    tracker: TaskTracker,
    drain_lock: Mutex<()>,
}

impl DiffingOrchestrator {
    pub fn new(default: Arc<dyn Handler>, alternative: Arc<dyn Handler>, config: ShadowConfig) -> Self {
        let engine = DiffEngine::from_config(&config);
        DiffingOrchestrator {
            default,
            alternative,
            config,
            engine,
            tracker: TaskTracker::new(),
            drain_lock: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &ShadowConfig {
        &self.config
    }

    /// Number of comparisons that have not reported yet.
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Waits until every comparison scheduled so far has reported.
    ///
    /// Concurrent callers take turns, so one caller reopening the tracker
    /// cannot leave another waiting on an open one.
    pub async fn drain(&self) {
        let _turn = self.drain_lock.lock().await;
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }
}

#[async_trait]
impl Handler for DiffingOrchestrator {
    async fn serve(&self, req: ProxyRequest, sink: &mut dyn ResponseSink) {
        let ForkedRequest {
            primary,
            secondary,
            secondary_guard,
            info,
        } = match duplicator::fork(req, &self.config).await {
            Ok(forked) => forked,
            Err(e) => {
                warn!("Rejecting request before dispatch: {}", e);
                write_error(sink, StatusCode::INTERNAL_SERVER_ERROR, "failed to read payload");
                return;
            }
        };

        let alternative = Arc::clone(&self.alternative);
        let alternative_branch: JoinHandle<BranchResult> = tokio::spawn(async move {
            let result = run_bounded_branch(alternative, secondary, Side::Alternative).await;
            drop(secondary_guard);
            result.map(Arc::new)
        });

        let (client_tx, client_rx) = oneshot::channel();
        let default = Arc::clone(&self.default);
        let default_branch: JoinHandle<BranchResult> = tokio::spawn(async move {
            let result = run_branch(default, primary, Side::Default).await.map(Arc::new);
            let _ = client_tx.send(result.as_ref().ok().cloned());
            result
        });

        let engine = self.engine.clone();
        self.tracker.spawn(async move {
            let (default_joined, alternative_joined) = tokio::join!(default_branch, alternative_branch);
            let default_result = joined(default_joined, Side::Default);
            let alternative_result = joined(alternative_joined, Side::Alternative);
            engine.conclude(&info, default_result, alternative_result);
        });

        match client_rx.await {
            Ok(Some(snapshot)) => snapshot.replay_onto(sink),
            _ => write_error(sink, StatusCode::BAD_GATEWAY, "default backend failed"),
        }
    }
}

/// Runs one handler against its own recorder. A panic inside the handler is
/// contained here and becomes an error for that side.
async fn run_branch(
    handler: Arc<dyn Handler>,
    req: ProxyRequest,
    side: Side,
) -> ProxyResult<ResponseSnapshot> {
    let mut recorder = ResponseRecorder::new();
    let served = AssertUnwindSafe(handler.serve(req, &mut recorder))
        .catch_unwind()
        .await;
    match served {
        Ok(()) => {
            debug!("{} branch answered {}", side, recorder.status());
            Ok(recorder.finish())
        }
        Err(panic) => {
            let cause = panic_message(panic.as_ref());
            warn!("{} handler panicked: {}", side, cause);
            Err(ProxyError::BranchFailed { side, cause })
        }
    }
}

/// Like [`run_branch`], but gives up once the request context ends, even when
/// the handler itself never looks at the context.
async fn run_bounded_branch(
    handler: Arc<dyn Handler>,
    req: ProxyRequest,
    side: Side,
) -> ProxyResult<ResponseSnapshot> {
    let context = req.context().clone();
    let expired = async {
        context.cancelled().await;
        tokio::time::sleep(ABANDON_GRACE).await;
    };
    tokio::select! {
        biased;
        result = run_branch(handler, req, side) => result,
        _ = expired => {
            let cause = if context.deadline().is_some_and(|d| tokio::time::Instant::now() >= d) {
                "deadline exceeded"
            } else {
                "cancelled"
            };
            warn!("Abandoning {} branch: {}", side, cause);
            Err(ProxyError::BranchFailed {
                side,
                cause: cause.to_string(),
            })
        }
    }
}

fn joined(result: Result<BranchResult, tokio::task::JoinError>, side: Side) -> BranchResult {
    match result {
        Ok(branch) => branch,
        Err(e) => {
            warn!("{} branch task did not finish: {}", side, e);
            Err(ProxyError::BranchAbandoned(side))
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "handler panicked".to_string()
    }
}

fn write_error(sink: &mut dyn ResponseSink, status: StatusCode, message: &str) {
    sink.headers_mut().insert(
        reqwest::header::CONTENT_TYPE,
        reqwest::header::HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    sink.write_head(status);
    sink.write(message.as_bytes());
    sink.write(b"\n");
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
