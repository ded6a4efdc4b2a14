// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023
// - Volker Schwaberow <volker@schwaberow.de>

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::context::ContextPolicy;
use crate::differ::{Differ, StructuralDiffer};
use crate::reporter::{DiffReporter, LogReporter};

pub const DEFAULT_ALTERNATIVE_TIMEOUT: Duration = Duration::from_secs(5);

/// Construction-time options of the diffing orchestrator.
///
/// | option                | default                   |
/// |-----------------------|---------------------------|
/// | `alternative_timeout` | 5 seconds                 |
/// | `alternative_context` | [`ContextPolicy::Detach`] |
/// | `differ`              | [`StructuralDiffer`]      |
/// | `reporter`            | [`LogReporter`]           |
#[derive(Clone)]
pub struct ShadowConfig {
    alternative_timeout: Duration,
    alternative_context: ContextPolicy,
    differ: Arc<dyn Differ>,
    reporter: Arc<dyn DiffReporter>,
}

impl ShadowConfig {
    pub fn new() -> Self {
        Self {
            alternative_timeout: DEFAULT_ALTERNATIVE_TIMEOUT,
            alternative_context: ContextPolicy::Detach,
            differ: Arc::new(StructuralDiffer::new()),
            reporter: Arc::new(LogReporter),
        }
    }

    pub fn set_alternative_timeout(&mut self, timeout: Duration) {
        self.alternative_timeout = timeout;
    }

    pub fn alternative_timeout(&self) -> Duration {
        self.alternative_timeout
    }

    pub fn set_alternative_context(&mut self, policy: ContextPolicy) {
        self.alternative_context = policy;
    }

    pub fn alternative_context(&self) -> &ContextPolicy {
        &self.alternative_context
    }

    pub fn set_differ(&mut self, differ: Arc<dyn Differ>) {
        self.differ = differ;
    }

    pub fn differ(&self) -> &Arc<dyn Differ> {
        &self.differ
    }

    pub fn set_reporter(&mut self, reporter: Arc<dyn DiffReporter>) {
        self.reporter = reporter;
    }

    pub fn reporter(&self) -> &Arc<dyn DiffReporter> {
        &self.reporter
    }
}

impl Default for ShadowConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ShadowConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShadowConfig")
            .field("alternative_timeout", &self.alternative_timeout)
            .field("alternative_context", &self.alternative_context)
            .finish_non_exhaustive()
    }
}
