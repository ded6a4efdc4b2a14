// File: mode.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use std::fmt;
use std::str::FromStr;

use reqwest::header::HeaderName;

use crate::errors::ProxyError;
use crate::request::ProxyRequest;

pub const DEFAULT_MODE_HEADER: &str = "x-shadow-mode";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ProxyMode {
    #[default]
    UseDefault,
    UseAlternative,
    UseDefaultAndDiff,
}

impl fmt::Display for ProxyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProxyMode::UseDefault => write!(f, "default"),
            ProxyMode::UseAlternative => write!(f, "alternative"),
            ProxyMode::UseDefaultAndDiff => write!(f, "diff"),
        }
    }
}

impl FromStr for ProxyMode {
    type Err = ProxyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "default" => Ok(ProxyMode::UseDefault),
            "alternative" => Ok(ProxyMode::UseAlternative),
            "diff" | "shadow" => Ok(ProxyMode::UseDefaultAndDiff),
            other => Err(ProxyError::Configuration(format!(
                "unknown proxy mode '{}', expected default, alternative or diff",
                other
            ))),
        }
    }
}

/// Decides per request which backend(s) serve it.
pub trait ModeController: Send + Sync {
    fn mode(&self, req: &ProxyRequest) -> ProxyMode;
}

impl<F> ModeController for F
where
    F: Fn(&ProxyRequest) -> ProxyMode + Send + Sync,
{
    fn mode(&self, req: &ProxyRequest) -> ProxyMode {
        self(req)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FixedMode(pub ProxyMode);

impl ModeController for FixedMode {
    fn mode(&self, _req: &ProxyRequest) -> ProxyMode {
        self.0
    }
}

/// Lets the caller pick the mode with a request header, falling back to a
/// fixed mode when the header is missing or unreadable.
#[derive(Debug, Clone)]
pub struct HeaderModeController {
    header: HeaderName,
    fallback: ProxyMode,
}

impl HeaderModeController {
    pub fn new(fallback: ProxyMode) -> Self {
        HeaderModeController {
            header: HeaderName::from_static(DEFAULT_MODE_HEADER),
            fallback,
        }
    }

    pub fn with_header(mut self, header: HeaderName) -> Self {
        self.header = header;
        self
    }

    pub fn header(&self) -> &HeaderName {
        &self.header
    }
}

impl ModeController for HeaderModeController {
    fn mode(&self, req: &ProxyRequest) -> ProxyMode {
        req.headers()
            .get(&self.header)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse().ok())
            .unwrap_or(self.fallback)
    }
}

#[cfg(test)]
#[path = "mode_tests.rs"]
mod tests;
