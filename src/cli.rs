// File: cli.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use std::time::Duration;

use clap::Parser;
use log::LevelFilter;
use reqwest::header::HeaderName;
use reqwest::Url;

use crate::config::ShadowConfig;
use crate::context::ContextPolicy;
use crate::differ::StructuralDiffer;
use crate::errors::{ProxyError, ProxyResult};
use crate::mode::ProxyMode;

#[derive(Parser, Debug)]
#[command(
    name = env!("CARGO_PKG_NAME"),
    version = env!("CARGO_PKG_VERSION"),
    about = env!("CARGO_PKG_DESCRIPTION"),
)]
pub struct Cli {
    #[arg(short = 'd', long = "default", help = "Base URL of the current backend")]
    pub default_url: String,

    #[arg(
        short = 'a',
        long = "alternative",
        help = "Base URL of the replacement backend"
    )]
    pub alternative_url: String,

    #[arg(
        short = 'm',
        long = "mode",
        default_value = "diff",
        help = "default, alternative or diff"
    )]
    pub mode: String,

    #[arg(
        long = "alternative-timeout",
        default_value_t = 5,
        help = "Hard ceiling for shadow requests in seconds"
    )]
    pub alternative_timeout: u64,

    #[arg(
        short = 't',
        long = "timeout",
        default_value_t = 10,
        help = "Client-side request timeout in seconds"
    )]
    pub timeout: u64,

    #[arg(
        long = "inherit-cancel",
        help = "Cancel shadow requests together with the client request"
    )]
    pub inherit_cancel: bool,

    #[arg(
        long = "ignore-header",
        help = "Response header to leave out of the comparison (repeatable)"
    )]
    pub ignore_headers: Vec<String>,

    #[arg(short = 'c', long = "concurrency", default_value_t = 8)]
    pub concurrency: usize,

    #[arg(short = 'i', long = "input-file")]
    pub input_file: Option<String>,

    #[arg(long = "log-level", default_value = "warn")]
    pub log_level: String,

    #[arg(long = "no-color", help = "Disable colored output")]
    pub no_color: bool,

    #[arg(short = 'q', long = "quiet", help = "Only print differences and errors")]
    pub quiet: bool,

    #[arg(long = "json", help = "Print the summary as JSON")]
    pub json: bool,
}

impl Cli {
    pub fn log_level(&self) -> LevelFilter {
        self.log_level.parse().unwrap_or(LevelFilter::Warn)
    }

    pub fn proxy_mode(&self) -> ProxyResult<ProxyMode> {
        self.mode.parse()
    }

    pub fn default_url(&self) -> ProxyResult<Url> {
        parse_url(&self.default_url)
    }

    pub fn alternative_url(&self) -> ProxyResult<Url> {
        parse_url(&self.alternative_url)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    /// Builds the orchestrator options; the reporter is left at its default
    /// for the caller to replace.
    pub fn shadow_config(&self) -> ProxyResult<ShadowConfig> {
        let mut differ = StructuralDiffer::new();
        for name in &self.ignore_headers {
            let header = HeaderName::from_bytes(name.trim().to_lowercase().as_bytes())
                .map_err(|e| ProxyError::Configuration(format!("header '{}': {}", name, e)))?;
            differ = differ.ignore_header(header);
        }

        let mut config = ShadowConfig::new();
        config.set_alternative_timeout(Duration::from_secs(self.alternative_timeout));
        config.set_differ(std::sync::Arc::new(differ));
        if self.inherit_cancel {
            config.set_alternative_context(ContextPolicy::Inherit);
        }
        Ok(config)
    }
}

fn parse_url(raw: &str) -> ProxyResult<Url> {
    Url::parse(raw).map_err(|e| ProxyError::InvalidUrl(format!("{}: {}", raw, e)))
}
