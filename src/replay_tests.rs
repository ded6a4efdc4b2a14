// File: replay_tests.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

#[cfg(test)]
mod tests {
    use crate::cli::Cli;
    use crate::replay::{load_requests, parse_line, read_requests, run};
    use clap::Parser;
    use pretty_assertions::assert_eq;
    use reqwest::header::CONTENT_TYPE;
    use reqwest::Method;
    use std::io::{Cursor, Write};
    use tempfile::NamedTempFile;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_parse_plain_lines() {
        let req = parse_line("POST /orders?dry=1").unwrap().unwrap();
        assert_eq!(req.method(), &Method::POST);
        assert_eq!(req.path(), "/orders");
        assert_eq!(req.query(), Some("dry=1"));

        let req = parse_line("  /items  ").unwrap().unwrap();
        assert_eq!(req.method(), &Method::GET);
        assert_eq!(req.path(), "/items");
    }

    #[test]
    fn test_parse_skips_comments_and_blanks() {
        assert!(parse_line("").unwrap().is_none());
        assert!(parse_line("   ").unwrap().is_none());
        assert!(parse_line("# GET /ignored").unwrap().is_none());
    }

    #[test]
    fn test_parse_json_line() {
        let req = parse_line(
            r#"{"method": "put", "path": "/orders/7", "headers": {"x-tenant": "a"}, "body": {"qty": 2}}"#,
        )
        .unwrap()
        .unwrap();
        assert_eq!(req.method(), &Method::PUT);
        assert_eq!(req.path(), "/orders/7");
        assert_eq!(req.headers()["x-tenant"], "a");
        assert_eq!(req.headers()[CONTENT_TYPE], "application/json");
        assert_eq!(req.body().as_bytes().unwrap(), br#"{"qty":2}"#);
    }

    #[test]
    fn test_parse_json_string_body_is_sent_raw() {
        let req = parse_line(r#"{"path": "/echo", "body": "plain text"}"#)
            .unwrap()
            .unwrap();
        assert_eq!(req.method(), &Method::GET);
        assert_eq!(req.body().as_bytes().unwrap(), b"plain text");
        assert!(!req.headers().contains_key(CONTENT_TYPE));
    }

    #[test]
    fn test_parse_rejects_bad_json() {
        assert!(parse_line("{\"method\": \"GET\"}").is_err());
        assert!(parse_line("{not json").is_err());
    }

    #[test]
    fn test_read_requests_skips_malformed() {
        let input = "GET /a\n# comment\n{broken\n\nDELETE /b\n";
        let requests = read_requests(Cursor::new(input)).unwrap();
        let targets: Vec<String> = requests.iter().map(|r| r.info().to_string()).collect();
        assert_eq!(targets, vec!["GET /a", "DELETE /b"]);
    }

    #[test]
    fn test_load_requests_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "GET /items").unwrap();
        writeln!(file, r#"{{"method": "POST", "path": "/items", "body": {{"a": 1}}}}"#).unwrap();
        let path = file.path().to_string_lossy().to_string();

        let cli = Cli::try_parse_from([
            "shadowprobe",
            "-d",
            "http://old",
            "-a",
            "http://new",
            "-i",
            path.as_str(),
        ])
        .unwrap();
        let requests = load_requests(&cli).unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].method(), &Method::POST);
    }

    #[tokio::test]
    async fn test_run_counts_outcomes() {
        let old = MockServer::start().await;
        let new = MockServer::start().await;
        for server in [&old, &new] {
            Mock::given(method("GET"))
                .and(path("/same"))
                .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"a": 1})))
                .mount(server)
                .await;
        }
        Mock::given(method("GET"))
            .and(path("/changed"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"a": 1})))
            .mount(&old)
            .await;
        Mock::given(method("GET"))
            .and(path("/changed"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"a": 2})))
            .mount(&new)
            .await;

        let (old_uri, new_uri) = (old.uri(), new.uri());
        let cli = Cli::try_parse_from([
            "shadowprobe",
            "-d",
            old_uri.as_str(),
            "-a",
            new_uri.as_str(),
            "--ignore-header",
            "date",
            "--quiet",
            "--json",
        ])
        .unwrap();
        let requests = read_requests(Cursor::new("GET /same\nGET /changed\n")).unwrap();

        let summary = run(&cli, requests).await.unwrap();
        assert_eq!(summary.total_requests, 2);
        assert_eq!(summary.matches, 1);
        assert_eq!(summary.diffs, 1);
        assert_eq!(summary.errors, 0);
    }
}
