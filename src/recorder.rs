// File: recorder.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use std::borrow::Cow;

use reqwest::header::HeaderMap;
use reqwest::StatusCode;

/// Destination a handler writes its response into.
///
/// The first call to [`ResponseSink::write_head`] fixes the status; writing a
/// body before that implies `200 OK`.
pub trait ResponseSink: Send {
    fn headers_mut(&mut self) -> &mut HeaderMap;
    fn write_head(&mut self, status: StatusCode);
    fn write(&mut self, chunk: &[u8]);
}

/// In-memory sink that keeps a branch away from the real client connection.
#[derive(Debug, Default)]
pub struct ResponseRecorder {
    status: Option<StatusCode>,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl ResponseRecorder {
    pub fn new() -> Self {
        ResponseRecorder::default()
    }

    pub fn status(&self) -> StatusCode {
        self.status.unwrap_or(StatusCode::OK)
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn finish(self) -> ResponseSnapshot {
        ResponseSnapshot {
            status: self.status.unwrap_or(StatusCode::OK),
            headers: self.headers,
            body: self.body,
        }
    }
}

impl ResponseSink for ResponseRecorder {
    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    fn write_head(&mut self, status: StatusCode) {
        if self.status.is_none() {
            self.status = Some(status);
        }
    }

    fn write(&mut self, chunk: &[u8]) {
        if self.status.is_none() {
            self.status = Some(StatusCode::OK);
        }
        self.body.extend_from_slice(chunk);
    }
}

/// Immutable result of one branch.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseSnapshot {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl ResponseSnapshot {
    pub fn new(status: StatusCode, headers: HeaderMap, body: Vec<u8>) -> Self {
        ResponseSnapshot {
            status,
            headers,
            body,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn body_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// Writes headers, status and body verbatim onto `sink`.
    pub fn replay_onto(&self, sink: &mut dyn ResponseSink) {
        let headers = sink.headers_mut();
        for (name, value) in self.headers.iter() {
            headers.append(name.clone(), value.clone());
        }
        sink.write_head(self.status);
        sink.write(&self.body);
    }
}

#[cfg(test)]
#[path = "recorder_tests.rs"]
mod tests;
