// File: context.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

//! Cancellation contexts carried by every proxied request.
//!
//! A [`RequestContext`] pairs a [`CancellationToken`] with an optional
//! deadline. The deadline is part of the context itself, so a context built
//! with [`RequestContext::with_timeout`] reports itself cancelled once the
//! deadline passes even if nobody ever calls [`RequestContext::cancel`].

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone)]
pub struct RequestContext {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl RequestContext {
    /// A fresh context, linked to nothing and without a deadline.
    pub fn background() -> Self {
        RequestContext {
            token: CancellationToken::new(),
            deadline: None,
        }
    }

    /// A context that is cancelled whenever `self` is, sharing its deadline.
    pub fn child(&self) -> Self {
        RequestContext {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    /// Derives a context that expires after `timeout`.
    ///
    /// The resulting deadline never extends past the deadline of `self`.
    /// Dropping the returned guard cancels the derived context.
    pub fn with_timeout(&self, timeout: Duration) -> (Self, CancelGuard) {
        let requested = Instant::now() + timeout;
        let deadline = match self.deadline {
            Some(parent) if parent < requested => parent,
            _ => requested,
        };
        let token = self.token.child_token();
        let guard = CancelGuard {
            token: token.clone(),
        };
        (
            RequestContext {
                token,
                deadline: Some(deadline),
            },
            guard,
        )
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled() || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Resolves once the context is cancelled or its deadline has passed.
    pub async fn cancelled(&self) {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    _ = self.token.cancelled() => {}
                    _ = tokio::time::sleep_until(deadline) => {}
                }
            }
            None => self.token.cancelled().await,
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::background()
    }
}

/// Cancels the context it was issued for when dropped.
#[derive(Debug)]
pub struct CancelGuard {
    token: CancellationToken,
}

impl CancelGuard {
    pub fn cancel(self) {
        drop(self);
    }
}

impl Drop for CancelGuard {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

type ContextFn = dyn Fn(&RequestContext) -> RequestContext + Send + Sync;

/// How the alternative branch derives its context from the caller's.
#[derive(Clone, Default)]
pub enum ContextPolicy {
    /// Start from [`RequestContext::background`]; a client disconnect never
    /// reaches the shadow request.
    #[default]
    Detach,
    /// Derive a child of the caller's context, so caller cancellation
    /// propagates to the shadow request.
    Inherit,
    Custom(Arc<ContextFn>),
}

impl ContextPolicy {
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&RequestContext) -> RequestContext + Send + Sync + 'static,
    {
        ContextPolicy::Custom(Arc::new(f))
    }

    pub fn apply(&self, caller: &RequestContext) -> RequestContext {
        match self {
            ContextPolicy::Detach => RequestContext::background(),
            ContextPolicy::Inherit => caller.child(),
            ContextPolicy::Custom(f) => f(caller),
        }
    }
}

impl fmt::Debug for ContextPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextPolicy::Detach => write!(f, "Detach"),
            ContextPolicy::Inherit => write!(f, "Inherit"),
            ContextPolicy::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
