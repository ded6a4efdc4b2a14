// File: upstream_integration_tests.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2025
// - Volker Schwaberow <volker@schwaberow.de>

mod common;

use common::*;
use pretty_assertions::assert_eq;
use reqwest::header::{HeaderValue, HOST};
use reqwest::{Method, StatusCode, Url};
use serde_json::json;
use serial_test::serial;
use shadowprobe::{
    DiffOutcome, FixedMode, Handler, Payload, ProxyMode, ProxyRequest, RequestContext,
    ResponseRecorder, StranglerHandler, StructuralDiffer, UpstreamHandler,
};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_string, header, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
#[serial]
async fn test_upstream_forwards_request() {
    let server = setup_mock_server().await;
    Mock::given(method("POST"))
        .and(path("/api/orders"))
        .and(query_param("dry", "1"))
        .and(header("x-tenant", "acme"))
        .and(body_string(r#"{"qty":2}"#))
        .respond_with(create_json_response(201, json!({"id": 9})).append_header("x-trace", "abc"))
        .expect(1)
        .mount(&server)
        .await;

    let handler = UpstreamHandler::parse(&format!("{}/api", server.uri())).unwrap();
    let req = ProxyRequest::new(Method::POST, "/orders?dry=1")
        .with_header("x-tenant".parse().unwrap(), HeaderValue::from_static("acme"))
        .with_header(HOST, HeaderValue::from_static("client.example"))
        .with_body(Payload::from_bytes(r#"{"qty":2}"#));

    let mut client = ResponseRecorder::new();
    handler.serve(req, &mut client).await;

    let snapshot = client.finish();
    assert_eq!(snapshot.status(), StatusCode::CREATED);
    assert_eq!(snapshot.body_text(), r#"{"id":9}"#);
    assert_eq!(snapshot.headers()["x-trace"], "abc");
}

#[tokio::test]
#[serial]
async fn test_upstream_unreachable_is_bad_gateway() {
    let handler = UpstreamHandler::new(Url::parse("http://127.0.0.1:9").unwrap());
    let mut client = ResponseRecorder::new();
    handler
        .serve(ProxyRequest::new(Method::GET, "/"), &mut client)
        .await;
    assert_eq!(client.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
#[serial]
async fn test_upstream_honours_context_deadline() {
    let server = setup_mock_server().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let handler = UpstreamHandler::parse(&server.uri()).unwrap();
    let (context, _guard) = RequestContext::background().with_timeout(Duration::from_millis(100));
    let mut client = ResponseRecorder::new();

    let started = std::time::Instant::now();
    handler
        .serve(ProxyRequest::new(Method::GET, "/slow").with_context(context), &mut client)
        .await;

    assert_eq!(client.status(), StatusCode::BAD_GATEWAY);
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
#[serial]
async fn test_shadowing_two_live_backends() {
    let old = setup_mock_server().await;
    let new = setup_mock_server().await;
    Mock::given(method("GET"))
        .and(path("/items"))
        .respond_with(create_json_response(200, json!({"a": 1, "b": [1, 2]})))
        .expect(1)
        .mount(&old)
        .await;
    Mock::given(method("GET"))
        .and(path("/items"))
        .respond_with(create_json_response(200, json!({"a": 2, "b": [1, 2]})))
        .expect(1)
        .mount(&new)
        .await;

    let (mut config, reporter) = memory_config();
    config.set_differ(Arc::new(
        StructuralDiffer::new().ignore_header("date".parse().unwrap()),
    ));
    let handler = StranglerHandler::from_urls(
        Arc::new(FixedMode(ProxyMode::UseDefaultAndDiff)),
        Url::parse(&old.uri()).unwrap(),
        Url::parse(&new.uri()).unwrap(),
        config,
    );

    let mut client = ResponseRecorder::new();
    handler
        .serve(ProxyRequest::new(Method::GET, "/items"), &mut client)
        .await;
    handler.drain().await;

    assert_eq!(client.status(), StatusCode::OK);
    assert_eq!(client.body(), br#"{"a":1,"b":[1,2]}"#);
    let outcomes = reporter.outcomes();
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].1, DiffOutcome::Diff("body.a: 1 != 2".to_string()));
}

#[tokio::test]
#[serial]
async fn test_alternative_only_mode_skips_default_backend() {
    let old = setup_mock_server().await;
    let new = setup_mock_server().await;
    Mock::given(method("GET"))
        .respond_with(create_json_response(200, json!({"from": "old"})))
        .expect(0)
        .mount(&old)
        .await;
    Mock::given(method("GET"))
        .respond_with(create_json_response(200, json!({"from": "new"})))
        .expect(1)
        .mount(&new)
        .await;

    let (config, reporter) = memory_config();
    let handler = StranglerHandler::from_urls(
        Arc::new(FixedMode(ProxyMode::UseAlternative)),
        Url::parse(&old.uri()).unwrap(),
        Url::parse(&new.uri()).unwrap(),
        config,
    );

    let mut client = ResponseRecorder::new();
    handler
        .serve(ProxyRequest::new(Method::GET, "/anything"), &mut client)
        .await;
    handler.drain().await;

    assert_eq!(client.body(), br#"{"from":"new"}"#);
    assert!(reporter.is_empty());
}
