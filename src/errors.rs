// File: errors.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use std::fmt;

use crate::differ::Side;

#[derive(Debug)]
pub enum ProxyError {
    BodyRead(std::io::Error),
    BodyNotBuffered,
    BranchFailed { side: Side, cause: String },
    BranchAbandoned(Side),
    Decode(DecodeError),
    InvalidUrl(String),
    Configuration(String),
}

impl fmt::Display for ProxyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BodyRead(e) => write!(f, "failed to read payload: {}", e),
            Self::BodyNotBuffered => write!(f, "request body has not been buffered"),
            Self::BranchFailed { side, cause } => {
                write!(f, "{} handler failed: {}", side, cause)
            }
            Self::BranchAbandoned(side) => {
                write!(f, "{} branch finished without a response", side)
            }
            Self::Decode(e) => write!(f, "{}", e),
            Self::InvalidUrl(msg) => write!(f, "Invalid URL: {}", msg),
            Self::Configuration(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl ProxyError {
    /// The branch an error belongs to, if it belongs to one.
    pub fn side(&self) -> Option<Side> {
        match self {
            Self::BranchFailed { side, .. } => Some(*side),
            Self::BranchAbandoned(side) => Some(*side),
            Self::Decode(e) => Some(e.side),
            _ => None,
        }
    }
}

impl std::error::Error for ProxyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::BodyRead(e) => Some(e),
            Self::Decode(e) => Some(e),
            Self::BodyNotBuffered => None,
            Self::BranchFailed { .. } => None,
            Self::BranchAbandoned(_) => None,
            Self::InvalidUrl(_) => None,
            Self::Configuration(_) => None,
        }
    }
}

impl From<std::io::Error> for ProxyError {
    fn from(error: std::io::Error) -> Self {
        Self::BodyRead(error)
    }
}

impl From<DecodeError> for ProxyError {
    fn from(error: DecodeError) -> Self {
        Self::Decode(error)
    }
}

/// A response body on one side of the comparison could not be parsed.
#[derive(Debug)]
pub struct DecodeError {
    pub side: Side,
    pub cause: serde_json::Error,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to unmarshal {} json: {}", self.side, self.cause)
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.cause)
    }
}

pub type ProxyResult<T> = Result<T, ProxyError>;
