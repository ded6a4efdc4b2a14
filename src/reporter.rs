// File: reporter.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use std::sync::{Arc, Mutex};

use colored::*;
use log::{error, info, warn};

use crate::differ::Side;
use crate::errors::ProxyError;
use crate::request::RequestInfo;
use crate::stats::ShadowStats;

/// Sink for comparison outcomes.
///
/// For every shadowed request the reporter sees at most one error per side,
/// then exactly one of `report_match`/`report_diff` unless a branch failed
/// before producing a response.
pub trait DiffReporter: Send + Sync {
    fn report_match(&self, req: &RequestInfo);
    fn report_diff(&self, req: &RequestInfo, diff: &str);
    fn report_error(&self, req: &RequestInfo, err: &ProxyError);
}

/// Emits outcomes through the `log` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

impl DiffReporter for LogReporter {
    fn report_match(&self, req: &RequestInfo) {
        info!("DIFFER MATCH: {} {}", req.method, req.path);
    }

    fn report_diff(&self, req: &RequestInfo, diff: &str) {
        warn!("DIFFER DIFF: {} {}: {}", req.method, req.path, diff);
    }

    fn report_error(&self, req: &RequestInfo, err: &ProxyError) {
        error!("DIFFER ERROR: {} {}: {}", req.method, req.path, err);
    }
}

/// Colored terminal output for interactive replays.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleReporter {
    quiet_matches: bool,
}

impl ConsoleReporter {
    pub fn new(quiet_matches: bool) -> Self {
        ConsoleReporter { quiet_matches }
    }
}

impl DiffReporter for ConsoleReporter {
    fn report_match(&self, req: &RequestInfo) {
        if !self.quiet_matches {
            println!("{} {} {}", "✓".green().bold(), "MATCH".green(), req);
        }
    }

    fn report_diff(&self, req: &RequestInfo, diff: &str) {
        println!("{} {} {}", "≠".yellow().bold(), "DIFF".yellow(), req);
        for line in diff.lines() {
            println!("    {}", line.bright_black());
        }
    }

    fn report_error(&self, req: &RequestInfo, err: &ProxyError) {
        eprintln!("{} {} {}: {}", "✗".red().bold(), "ERROR".red(), req, err);
    }
}

/// Counts outcomes into [`ShadowStats`] and forwards them to an inner reporter.
pub struct TallyReporter {
    inner: Arc<dyn DiffReporter>,
    stats: Arc<ShadowStats>,
}

impl TallyReporter {
    pub fn new(inner: Arc<dyn DiffReporter>, stats: Arc<ShadowStats>) -> Self {
        TallyReporter { inner, stats }
    }

    pub fn stats(&self) -> &Arc<ShadowStats> {
        &self.stats
    }
}

impl DiffReporter for TallyReporter {
    fn report_match(&self, req: &RequestInfo) {
        self.stats.add_match();
        self.inner.report_match(req);
    }

    fn report_diff(&self, req: &RequestInfo, diff: &str) {
        self.stats.add_diff();
        self.inner.report_diff(req, diff);
    }

    fn report_error(&self, req: &RequestInfo, err: &ProxyError) {
        self.stats.add_error();
        self.inner.report_error(req, err);
    }
}

/// A single reported outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffOutcome {
    Match,
    Diff(String),
    Error { side: Option<Side>, cause: String },
}

/// Keeps every outcome in memory, in report order.
#[derive(Debug, Default)]
pub struct MemoryReporter {
    outcomes: Mutex<Vec<(RequestInfo, DiffOutcome)>>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        MemoryReporter::default()
    }

    pub fn outcomes(&self) -> Vec<(RequestInfo, DiffOutcome)> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn push(&self, req: &RequestInfo, outcome: DiffOutcome) {
        self.lock().push((req.clone(), outcome));
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(RequestInfo, DiffOutcome)>> {
        // A panicking reader cannot leave the vector half-written.
        self.outcomes.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl DiffReporter for MemoryReporter {
    fn report_match(&self, req: &RequestInfo) {
        self.push(req, DiffOutcome::Match);
    }

    fn report_diff(&self, req: &RequestInfo, diff: &str) {
        self.push(req, DiffOutcome::Diff(diff.to_string()));
    }

    fn report_error(&self, req: &RequestInfo, err: &ProxyError) {
        self.push(
            req,
            DiffOutcome::Error {
                side: err.side(),
                cause: err.to_string(),
            },
        );
    }
}

#[cfg(test)]
#[path = "reporter_tests.rs"]
mod tests;
