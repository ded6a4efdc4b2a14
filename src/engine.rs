// File: engine.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use std::sync::Arc;

use log::debug;

use crate::config::ShadowConfig;
use crate::differ::{DecodedResponse, Differ, Side};
use crate::errors::{ProxyError, ProxyResult};
use crate::recorder::ResponseSnapshot;
use crate::reporter::{DiffOutcome, DiffReporter};
use crate::request::RequestInfo;

/// Decodes two snapshots, compares them and reports the outcome.
#[derive(Clone)]
pub struct DiffEngine {
    differ: Arc<dyn Differ>,
    reporter: Arc<dyn DiffReporter>,
}

impl DiffEngine {
    pub fn new(differ: Arc<dyn Differ>, reporter: Arc<dyn DiffReporter>) -> Self {
        DiffEngine { differ, reporter }
    }

    pub fn from_config(config: &ShadowConfig) -> Self {
        Self::new(Arc::clone(config.differ()), Arc::clone(config.reporter()))
    }

    /// Reports a decode error for each side whose body is not JSON, then
    /// exactly one match or diff verdict, which is also returned.
    pub fn compare(
        &self,
        req: &RequestInfo,
        default: &ResponseSnapshot,
        alternative: &ResponseSnapshot,
    ) -> DiffOutcome {
        let default = self.decode(req, Side::Default, default);
        let alternative = self.decode(req, Side::Alternative, alternative);

        let diff = self.differ.diff(&default, &alternative);
        if diff.is_empty() {
            self.reporter.report_match(req);
            DiffOutcome::Match
        } else {
            self.reporter.report_diff(req, &diff);
            DiffOutcome::Diff(diff)
        }
    }

    /// Settles a shadowed request once both branches are done. A branch that
    /// produced no snapshot is reported as an error and suppresses the verdict.
    pub fn conclude(
        &self,
        req: &RequestInfo,
        default: ProxyResult<Arc<ResponseSnapshot>>,
        alternative: ProxyResult<Arc<ResponseSnapshot>>,
    ) -> Option<DiffOutcome> {
        match (default, alternative) {
            (Ok(default), Ok(alternative)) => Some(self.compare(req, &default, &alternative)),
            (default, alternative) => {
                for err in [default.err(), alternative.err()].into_iter().flatten() {
                    self.reporter.report_error(req, &err);
                }
                debug!("Skipping comparison for {}", req);
                None
            }
        }
    }

    fn decode(&self, req: &RequestInfo, side: Side, snapshot: &ResponseSnapshot) -> DecodedResponse {
        let (decoded, error) = DecodedResponse::decode(side, snapshot);
        if let Some(error) = error {
            self.reporter.report_error(req, &ProxyError::Decode(error));
        }
        decoded
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
