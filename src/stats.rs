// File: stats.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use serde::Serialize;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Running totals of comparison outcomes, safe to update from detached diff
/// tasks.
#[derive(Debug, Default)]
pub struct ShadowStats {
    total_requests: AtomicU64,
    matches: AtomicUsize,
    diffs: AtomicUsize,
    errors: AtomicUsize,
}

impl ShadowStats {
    pub fn new() -> ShadowStats {
        ShadowStats::default()
    }

    pub fn add_request(&self) {
        self.total_requests.fetch_add(1, Ordering::SeqCst);
    }

    pub fn add_match(&self) {
        self.matches.fetch_add(1, Ordering::SeqCst);
    }

    pub fn add_diff(&self) {
        self.diffs.fetch_add(1, Ordering::SeqCst);
    }

    pub fn add_error(&self) {
        self.errors.fetch_add(1, Ordering::SeqCst);
    }

    pub fn total_requests(&self) -> u64 {
        self.total_requests.load(Ordering::SeqCst)
    }

    pub fn matches(&self) -> usize {
        self.matches.load(Ordering::SeqCst)
    }

    pub fn diffs(&self) -> usize {
        self.diffs.load(Ordering::SeqCst)
    }

    pub fn errors(&self) -> usize {
        self.errors.load(Ordering::SeqCst)
    }

    pub fn summary(&self) -> StatsSummary {
        StatsSummary {
            total_requests: self.total_requests(),
            matches: self.matches(),
            diffs: self.diffs(),
            errors: self.errors(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatsSummary {
    pub total_requests: u64,
    pub matches: usize,
    pub diffs: usize,
    pub errors: usize,
}
