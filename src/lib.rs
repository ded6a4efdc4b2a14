// File: lib.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

#![allow(clippy::uninlined_format_args)]
#![allow(clippy::module_inception)]
#![allow(clippy::bool_assert_comparison)]
#![allow(clippy::new_without_default)]

pub mod cli;
pub mod config;
pub mod context;
pub mod differ;
pub mod duplicator;
pub mod engine;
pub mod errors;
pub mod handler;
pub mod mode;
pub mod orchestrator;
pub mod recorder;
pub mod replay;
pub mod reporter;
pub mod request;
pub mod stats;
pub mod upstream;

pub use config::ShadowConfig;
pub use context::{ContextPolicy, RequestContext};
pub use differ::{DecodedResponse, Differ, Side, StructuralDiffer};
pub use errors::{ProxyError, ProxyResult};
pub use handler::{Handler, StranglerHandler};
pub use mode::{FixedMode, HeaderModeController, ModeController, ProxyMode};
pub use orchestrator::DiffingOrchestrator;
pub use recorder::{ResponseRecorder, ResponseSink, ResponseSnapshot};
pub use reporter::{DiffOutcome, DiffReporter, LogReporter};
pub use request::{Payload, ProxyRequest, RequestInfo};
pub use upstream::UpstreamHandler;
