// File: replay.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

//! Replays a list of requests through a [`StranglerHandler`] pointed at two
//! live backends.
//!
//! Input is one request per line, either `METHOD /path?query` (a bare path
//! means `GET`) or a JSON object:
//!
//! ```text
//! {"method": "POST", "path": "/orders", "headers": {"x-tenant": "a"}, "body": {"qty": 1}}
//! ```
//!
//! Blank lines and lines starting with `#` are skipped.

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::sync::Arc;

use anyhow::{Context, Result};
use colored::*;
use futures::stream::{FuturesUnordered, StreamExt};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use log::{debug, warn};
use reqwest::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::Method;
use serde::Deserialize;
use tokio::sync::Semaphore;

use crate::cli::Cli;
use crate::context::RequestContext;
use crate::errors::{ProxyError, ProxyResult};
use crate::handler::{Handler, StranglerHandler};
use crate::mode::FixedMode;
use crate::recorder::ResponseRecorder;
use crate::reporter::{ConsoleReporter, TallyReporter};
use crate::request::{Payload, ProxyRequest};
use crate::stats::{ShadowStats, StatsSummary};

#[derive(Debug, Deserialize)]
struct ReplayLine {
    #[serde(default = "default_method")]
    method: String,
    path: String,
    #[serde(default)]
    headers: HashMap<String, String>,
    #[serde(default)]
    body: Option<serde_json::Value>,
}

fn default_method() -> String {
    "GET".to_string()
}

/// Parses one input line. `Ok(None)` means the line carries no request.
pub fn parse_line(line: &str) -> ProxyResult<Option<ProxyRequest>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    if line.starts_with('{') {
        let parsed: ReplayLine = serde_json::from_str(line)
            .map_err(|e| ProxyError::Configuration(format!("invalid request line: {}", e)))?;
        return from_json_line(parsed).map(Some);
    }

    let mut parts = line.split_whitespace();
    let (method, target) = match (parts.next(), parts.next()) {
        (Some(target), None) => ("GET", target),
        (Some(method), Some(target)) => (method, target),
        _ => return Ok(None),
    };
    Ok(Some(ProxyRequest::new(parse_method(method)?, target)))
}

fn from_json_line(line: ReplayLine) -> ProxyResult<ProxyRequest> {
    let mut req = ProxyRequest::new(parse_method(&line.method)?, &line.path);
    for (name, value) in &line.headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| ProxyError::Configuration(format!("header '{}': {}", name, e)))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| ProxyError::Configuration(format!("header value '{}': {}", value, e)))?;
        req.headers_mut().append(name, value);
    }

    let body = match line.body {
        None => Payload::empty(),
        Some(serde_json::Value::String(raw)) => Payload::from_bytes(raw),
        Some(value) => {
            if !req.headers().contains_key(CONTENT_TYPE) {
                req.headers_mut()
                    .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            }
            Payload::from_bytes(value.to_string())
        }
    };
    Ok(req.with_body(body))
}

fn parse_method(raw: &str) -> ProxyResult<Method> {
    Method::from_bytes(raw.to_uppercase().as_bytes())
        .map_err(|e| ProxyError::Configuration(format!("method '{}': {}", raw, e)))
}

/// Reads every request from `reader`, skipping malformed lines with a warning.
pub fn read_requests<R: BufRead>(reader: R) -> Result<Vec<ProxyRequest>> {
    let mut requests = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("failed to read line {}", index + 1))?;
        match parse_line(&line) {
            Ok(Some(req)) => requests.push(req),
            Ok(None) => {}
            Err(e) => warn!("Skipping line {}: {}", index + 1, e),
        }
    }
    Ok(requests)
}

pub fn load_requests(cli: &Cli) -> Result<Vec<ProxyRequest>> {
    match &cli.input_file {
        Some(path) => {
            let file = File::open(path).with_context(|| format!("cannot open {}", path))?;
            read_requests(BufReader::new(file))
        }
        None => read_requests(io::stdin().lock()),
    }
}

/// Sends every request through the handler and waits for all comparisons.
pub async fn run(cli: &Cli, requests: Vec<ProxyRequest>) -> Result<StatsSummary> {
    let stats = Arc::new(ShadowStats::new());
    let reporter = Arc::new(TallyReporter::new(
        Arc::new(ConsoleReporter::new(cli.quiet)),
        Arc::clone(&stats),
    ));

    let mut config = cli.shadow_config()?;
    config.set_reporter(reporter);
    let handler = Arc::new(StranglerHandler::from_urls(
        Arc::new(FixedMode(cli.proxy_mode()?)),
        cli.default_url()?,
        cli.alternative_url()?,
        config,
    ));

    let pb = ProgressBar::new(requests.len() as u64);
    if cli.json {
        pb.set_draw_target(ProgressDrawTarget::hidden());
    }
    pb.set_style(
        ProgressStyle::with_template("[{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len}")?
            .progress_chars("█▉▊▋▌▍▎▏  "),
    );

    let semaphore = Arc::new(Semaphore::new(cli.concurrency.max(1)));
    let timeout = cli.request_timeout();
    let mut futures = FuturesUnordered::new();

    for req in requests {
        stats.add_request();
        let handler = Arc::clone(&handler);
        let semaphore = Arc::clone(&semaphore);
        let pb = pb.clone();
        futures.push(tokio::spawn(async move {
            let _permit = semaphore.acquire_owned().await?;
            let (context, _guard) = RequestContext::background().with_timeout(timeout);
            let req = req.with_context(context);
            let info = req.info();

            let mut client = ResponseRecorder::new();
            handler.serve(req, &mut client).await;
            pb.inc(1);
            Ok::<_, anyhow::Error>((info, client.status()))
        }));
    }

    while let Some(task) = futures.next().await {
        match task {
            Ok(Ok((info, status))) => debug!("{} answered {}", info, status),
            Ok(Err(e)) => warn!("Request failed: {}", e),
            Err(e) => warn!("Task failed: {}", e),
        }
    }
    pb.finish_and_clear();

    handler.drain().await;
    Ok(stats.summary())
}

pub fn print_summary(summary: &StatsSummary, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(summary)?);
        return Ok(());
    }
    println!();
    println!(
        "{} requests. {} {}, {} {}, {} {}.",
        summary.total_requests,
        summary.matches.to_string().green().bold(),
        "matched".green(),
        summary.diffs.to_string().yellow().bold(),
        "differed".yellow(),
        summary.errors.to_string().red().bold(),
        "errors".red()
    );
    Ok(())
}

#[cfg(test)]
#[path = "replay_tests.rs"]
mod tests;
