// File: differ.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use std::collections::{BTreeSet, HashSet};
use std::fmt;

use reqwest::header::{HeaderMap, HeaderName};
use reqwest::StatusCode;
use serde_json::Value;

use crate::errors::DecodeError;
use crate::recorder::ResponseSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Default,
    Alternative,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Default => write!(f, "default"),
            Side::Alternative => write!(f, "alternative"),
        }
    }
}

/// Structural view of a response, used only for comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// `None` when the body could not be parsed as JSON.
    pub body: Option<Value>,
}

impl DecodedResponse {
    /// Best-effort decode of a snapshot. A body that fails to parse leaves
    /// `body` empty and hands the parse error back to the caller.
    pub fn decode(side: Side, snapshot: &ResponseSnapshot) -> (Self, Option<DecodeError>) {
        let (body, error) = match serde_json::from_slice::<Value>(snapshot.body()) {
            Ok(value) => (Some(value), None),
            Err(cause) => (None, Some(DecodeError { side, cause })),
        };
        (
            DecodedResponse {
                status: snapshot.status(),
                headers: snapshot.headers().clone(),
                body,
            },
            error,
        )
    }
}

pub trait Differ: Send + Sync {
    /// Describes how `alternative` differs from `default`. An empty string
    /// means the two are equivalent.
    fn diff(&self, default: &DecodedResponse, alternative: &DecodedResponse) -> String;
}

/// Deep comparison of status, headers and decoded body.
///
/// Every difference becomes one line prefixed with its path, e.g.
/// `status: 200 != 500`, `headers["etag"]: ["a"] != ["b"]` or
/// `body.items[1].id: 7 != 8`.
#[derive(Debug, Clone, Default)]
pub struct StructuralDiffer {
    ignored_headers: HashSet<HeaderName>,
}

impl StructuralDiffer {
    pub fn new() -> Self {
        StructuralDiffer::default()
    }

    /// Leaves `name` out of the header comparison, for headers such as `date`
    /// that differ between any two backends.
    pub fn ignore_header(mut self, name: HeaderName) -> Self {
        self.ignored_headers.insert(name);
        self
    }

    pub fn ignored_headers(&self) -> impl Iterator<Item = &HeaderName> {
        self.ignored_headers.iter()
    }

    fn diff_headers(&self, default: &HeaderMap, alternative: &HeaderMap, out: &mut Vec<String>) {
        let names: BTreeSet<&str> = default
            .keys()
            .chain(alternative.keys())
            .filter(|name| !self.ignored_headers.contains(*name))
            .map(|name| name.as_str())
            .collect();

        for name in names {
            let left = header_values(default, name);
            let right = header_values(alternative, name);
            if left != right {
                out.push(format!(
                    "headers[{:?}]: {} != {}",
                    name,
                    render_header_values(&left),
                    render_header_values(&right)
                ));
            }
        }
    }
}

impl Differ for StructuralDiffer {
    fn diff(&self, default: &DecodedResponse, alternative: &DecodedResponse) -> String {
        let mut out = Vec::new();

        if default.status != alternative.status {
            out.push(format!(
                "status: {} != {}",
                default.status.as_u16(),
                alternative.status.as_u16()
            ));
        }

        self.diff_headers(&default.headers, &alternative.headers, &mut out);

        match (&default.body, &alternative.body) {
            (Some(left), Some(right)) => diff_values("body", left, right, &mut out),
            (Some(left), None) => out.push(format!("body: {} != {}", left, ABSENT)),
            (None, Some(right)) => out.push(format!("body: {} != {}", ABSENT, right)),
            (None, None) => {}
        }

        out.join("\n")
    }
}

const ABSENT: &str = "<absent>";

fn header_values<'a>(headers: &'a HeaderMap, name: &str) -> Vec<&'a [u8]> {
    headers.get_all(name).iter().map(|v| v.as_bytes()).collect()
}

fn render_header_values(values: &[&[u8]]) -> String {
    if values.is_empty() {
        return ABSENT.to_string();
    }
    let rendered: Vec<String> = values
        .iter()
        .map(|v| format!("{:?}", String::from_utf8_lossy(v)))
        .collect();
    format!("[{}]", rendered.join(", "))
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn diff_values(path: &str, left: &Value, right: &Value, out: &mut Vec<String>) {
    match (left, right) {
        (Value::Object(l), Value::Object(r)) => {
            let keys: BTreeSet<&String> = l.keys().chain(r.keys()).collect();
            for key in keys {
                let child = format!("{}.{}", path, key);
                match (l.get(key), r.get(key)) {
                    (Some(lv), Some(rv)) => diff_values(&child, lv, rv, out),
                    (Some(lv), None) => out.push(format!("{}: {} != {}", child, lv, ABSENT)),
                    (None, Some(rv)) => out.push(format!("{}: {} != {}", child, ABSENT, rv)),
                    (None, None) => {}
                }
            }
        }
        (Value::Array(l), Value::Array(r)) => {
            for index in 0..l.len().max(r.len()) {
                let child = format!("{}[{}]", path, index);
                match (l.get(index), r.get(index)) {
                    (Some(lv), Some(rv)) => diff_values(&child, lv, rv, out),
                    (Some(lv), None) => out.push(format!("{}: {} != {}", child, lv, ABSENT)),
                    (None, Some(rv)) => out.push(format!("{}: {} != {}", child, ABSENT, rv)),
                    (None, None) => {}
                }
            }
        }
        // 1 and 1.0 are the same JSON number. Two integers compare exactly,
        // since past 2^53 distinct integers share one f64.
        (Value::Number(l), Value::Number(r)) => {
            let floating = l.is_f64() || r.is_f64();
            if l != r && (!floating || l.as_f64() != r.as_f64()) {
                out.push(format!("{}: {} != {}", path, l, r));
            }
        }
        _ if left == right => {}
        _ if kind(left) != kind(right) => out.push(format!(
            "{}: type mismatch: {} ({}) != {} ({})",
            path,
            kind(left),
            left,
            kind(right),
            right
        )),
        _ => out.push(format!("{}: {} != {}", path, left, right)),
    }
}

#[cfg(test)]
#[path = "differ_tests.rs"]
mod tests;
