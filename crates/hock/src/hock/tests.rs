//! Tests for the Hock registrar.
//!
//! Requests are routed straight through `respond` into a `BufferedSink`; the
//! HTTP listener is exercised by the integration tests under `tests/`.

use super::*;
use crate::config::HockConfig;
use crate::expectation::{ExpectationOptions, IncomingRequest, Reply, ReplyBody};
use crate::response::BufferedSink;
use regex::Regex;
use serde_json::json;
use std::collections::HashMap;
use std::io::Cursor;

async fn send(hock: &Hock, request: IncomingRequest) -> (bool, BufferedSink) {
    let mut sink = BufferedSink::new();
    let matched = hock.respond(request, &mut sink).await.unwrap();
    (matched, sink)
}

// ============================================================================
// Routing
// ============================================================================

#[tokio::test]
async fn test_get_then_retired() {
    let hock = Hock::new();
    hock.get("/widgets").reply(200, json!({ "ok": true }));

    let (matched, sink) = send(&hock, IncomingRequest::new("GET", "/widgets")).await;
    assert!(matched);
    assert_eq!(sink.status(), Some(200));
    assert_eq!(sink.body_text(), r#"{"ok":true}"#);
    hock.done().await.unwrap();

    let (matched, sink) = send(&hock, IncomingRequest::new("GET", "/widgets")).await;
    assert!(!matched);
    assert_eq!(sink.status(), Some(500));
    assert_eq!(sink.body_text(), NO_MATCH_BODY);
    assert_eq!(sink.headers().get("content-type").unwrap(), "text/plain");
}

#[tokio::test]
async fn test_no_expectations_is_500() {
    let hock = Hock::new();
    let (matched, sink) = send(&hock, IncomingRequest::new("GET", "/")).await;
    assert!(!matched);
    assert_eq!(sink.status(), Some(500));
    assert!(sink.is_ended());
    hock.done().await.unwrap();
}

#[tokio::test]
async fn test_first_declared_wins() {
    let hock = Hock::new();
    hock.get("/dup")
        .reply(200, "first")
        .get("/dup")
        .reply(201, "second");

    let (_, sink) = send(&hock, IncomingRequest::new("GET", "/dup")).await;
    assert_eq!(sink.body_text(), "first");
    let (_, sink) = send(&hock, IncomingRequest::new("GET", "/dup")).await;
    assert_eq!(sink.status(), Some(201));
    assert_eq!(sink.body_text(), "second");
    hock.done().await.unwrap();
}

#[tokio::test]
async fn test_unbounded_stays_pending() {
    let hock = Hock::new();
    hock.get("/poll").any().reply(204, "");

    for _ in 0..5 {
        let (matched, sink) = send(&hock, IncomingRequest::new("GET", "/poll")).await;
        assert!(matched);
        assert_eq!(sink.status(), Some(204));
    }
    assert_eq!(hock.pending().await.len(), 1);
    assert_eq!(hock.pending().await[0].stats.count, 5);
    hock.done().await.unwrap();
}

#[tokio::test]
async fn test_post_body_matching() {
    let hock = Hock::new();
    hock.post("/messaging", json!({ "a": 1, "b": [1, 2] }))
        .reply(201, json!({ "created": true }));

    let (matched, _) = send(
        &hock,
        IncomingRequest::new("POST", "/messaging").with_body(r#"{"a": 2, "b": [1, 2]}"#),
    )
    .await;
    assert!(!matched);

    let (matched, sink) = send(
        &hock,
        IncomingRequest::new("POST", "/messaging").with_body(r#"{"b": [1, 2], "a": 1}"#),
    )
    .await;
    assert!(matched);
    assert_eq!(sink.status(), Some(201));
    hock.done().await.unwrap();
}

#[tokio::test]
async fn test_match_fault_writes_500() {
    let hock = Hock::new();
    hock.post("/messaging", json!({ "a": 1 })).reply(200, "");

    let mut sink = BufferedSink::new();
    let err = hock
        .respond(
            IncomingRequest::new("POST", "/messaging").with_body("not json"),
            &mut sink,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, HockError::Match(_)));
    assert_eq!(sink.status(), Some(500));
    assert!(sink.body_text().contains("incoming body is not valid JSON"));
    assert!(hock.done().await.is_err());
}

#[tokio::test]
async fn test_delivery_error_still_counts() {
    let hock = Hock::new();
    hock.get("/missing-file")
        .reply_with_file(200, "/definitely/not/here.bin");

    let mut sink = BufferedSink::new();
    let err = hock
        .respond(IncomingRequest::new("GET", "/missing-file"), &mut sink)
        .await
        .unwrap_err();
    assert!(matches!(err, HockError::Delivery(_)));
    assert_eq!(sink.status(), Some(200));
    // Count reached max, so the expectation was retired and is satisfied
    assert!(hock.pending().await.is_empty());
    hock.done().await.unwrap();
}

#[tokio::test]
async fn test_stream_replay_across_requests() {
    let hock = Hock::new();
    let payload: Vec<u8> = (0..50_000u32).map(|i| (i % 251) as u8).collect();
    hock.get("/blob")
        .twice()
        .reply(200, ReplyBody::stream(Cursor::new(payload.clone())));

    let (_, first) = send(&hock, IncomingRequest::new("GET", "/blob")).await;
    let (_, second) = send(&hock, IncomingRequest::new("GET", "/blob")).await;
    assert_eq!(first.body(), payload.as_slice());
    assert_eq!(second.body(), payload.as_slice());
    hock.done().await.unwrap();
}

// ============================================================================
// Filters & defaults
// ============================================================================

#[tokio::test]
async fn test_filtering_path_regex() {
    let hock = Hock::new();
    hock.filtering_path_regex(Regex::new(r"password=[^&]*").unwrap(), "password=XXX")
        .get("/login?user=bob&password=XXX")
        .reply(200, "welcome");

    let (matched, sink) = send(
        &hock,
        IncomingRequest::new("GET", "/login?user=bob&password=hunter2"),
    )
    .await;
    assert!(matched);
    assert_eq!(sink.body_text(), "welcome");
}

#[tokio::test]
async fn test_filter_installed_after_declaration_applies() {
    let hock = Hock::new();
    hock.get("/users/ID").reply(200, "user");
    hock.filtering_path(|url| {
        Regex::new(r"/users/\d+")
            .map(|re| re.replace(url, "/users/ID").into_owned())
            .unwrap_or_else(|_| url.to_string())
    });

    let (matched, _) = send(&hock, IncomingRequest::new("GET", "/users/42")).await;
    assert!(matched);
}

#[tokio::test]
async fn test_filtering_request_body() {
    let hock = Hock::new();
    hock.filtering_request_body(|body| body.replace("\"token\":\"abc\"", "\"token\":\"*\""))
        .post("/auth", json!({ "token": "*" }))
        .reply(200, "ok");

    let (matched, _) = send(
        &hock,
        IncomingRequest::new("POST", "/auth").with_body(r#"{"token":"abc"}"#),
    )
    .await;
    assert!(matched);
}

#[tokio::test]
async fn test_default_reply_headers() {
    let hock = Hock::new();
    hock.set_default_reply_headers([("x-powered-by", "hock")])
        .get("/defaulted")
        .reply(200, "")
        .get("/explicit")
        .respond_with(Reply::new(200, "").with_header("x-custom", "1"));

    let (_, sink) = send(&hock, IncomingRequest::new("GET", "/defaulted")).await;
    assert_eq!(sink.headers().get("x-powered-by").unwrap(), "hock");

    let (_, sink) = send(&hock, IncomingRequest::new("GET", "/explicit")).await;
    assert_eq!(sink.headers().get("x-custom").unwrap(), "1");
    assert!(sink.headers().get("x-powered-by").is_none());
}

// ============================================================================
// Verification
// ============================================================================

#[tokio::test]
async fn test_done_reports_unmet() {
    let hock = Hock::new();
    hock.get("/never").reply(200, "").get("/once").reply(200, "");
    send(&hock, IncomingRequest::new("GET", "/once")).await;

    let err = hock.done().await.unwrap_err();
    let HockError::Unsatisfied(unmet) = &err else {
        panic!("expected Unsatisfied, got {err:?}");
    };
    assert_eq!(unmet.len(), 1);
    assert_eq!(unmet[0].url, "/never");
    let message = err.to_string();
    assert!(message.starts_with("Unprocessed requests in assertions queue:"));
    assert!(message.contains("/never"));
}

#[tokio::test]
async fn test_done_checks_retired_below_minimum() {
    let hock = Hock::new();
    hock.get("/skewed").min(3).max(1).reply(200, "");
    send(&hock, IncomingRequest::new("GET", "/skewed")).await;

    assert!(hock.pending().await.is_empty());
    assert!(matches!(
        hock.done().await,
        Err(HockError::Unsatisfied(ref unmet)) if unmet.len() == 1
    ));
}

#[tokio::test]
async fn test_min_requests_gate_done() {
    let hock = Hock::new();
    hock.get("/retry").min(2).reply(200, "");

    send(&hock, IncomingRequest::new("GET", "/retry")).await;
    assert!(hock.done().await.is_err());
    send(&hock, IncomingRequest::new("GET", "/retry")).await;
    hock.done().await.unwrap();
}

#[tokio::test]
async fn test_has_route() {
    let hock = Hock::new();
    let headers: HashMap<String, String> =
        [("Authorization".to_string(), "Bearer t".to_string())].into();
    hock.post("/x", "enteente")
        .reply(200, "")
        .request(ExpectationOptions {
            method: Some("GET".to_string()),
            url: "/auth".to_string(),
            headers: headers.clone(),
            body: None,
        })
        .reply(200, "");

    assert!(hock.has_route("POST", "/x", Some("enteente"), None).await);
    assert!(!hock.has_route("POST", "/x", Some("other"), None).await);
    assert!(!hock.has_route("GET", "/x", None, None).await);
    assert!(hock.has_route("GET", "/auth", None, Some(&headers)).await);
    assert!(!hock.has_route("GET", "/auth", None, None).await);
}

#[tokio::test]
async fn test_clear() {
    let hock = Hock::new();
    hock.get("/a").reply(200, "");
    hock.clear();
    assert!(hock.pending().await.is_empty());
    hock.done().await.unwrap();
}

#[tokio::test]
async fn test_clones_share_pool() {
    let hock = Hock::new();
    let other = hock.clone();
    other.get("/shared").reply(200, "");

    let (matched, _) = send(&hock, IncomingRequest::new("GET", "/shared")).await;
    assert!(matched);
    other.done().await.unwrap();
}

// ============================================================================
// Fixtures
// ============================================================================

#[tokio::test]
async fn test_with_config() {
    let yaml = r#"
defaultReplyHeaders:
  content-type: application/json
stubs:
  - url: /relationships
    max: unbounded
    reply:
      body: { hello: hello }
  - method: POST
    url: /messaging
    body: "*"
    reply:
      status: 201
      headers:
        x-created: "yes"
      body: created
"#;
    let config = HockConfig::from_yaml_str(yaml).unwrap();
    let hock = Hock::with_config(&config).unwrap();

    for _ in 0..3 {
        let (matched, sink) = send(&hock, IncomingRequest::new("GET", "/relationships")).await;
        assert!(matched);
        assert_eq!(sink.body_text(), r#"{"hello":"hello"}"#);
        assert_eq!(
            sink.headers().get("content-type").unwrap(),
            "application/json"
        );
    }

    let (matched, sink) = send(
        &hock,
        IncomingRequest::new("POST", "/messaging").with_body("anything at all"),
    )
    .await;
    assert!(matched);
    assert_eq!(sink.status(), Some(201));
    assert_eq!(sink.body_text(), "created");
    assert_eq!(sink.headers().get("x-created").unwrap(), "yes");
    assert!(sink.headers().get("content-type").is_none());
    hock.done().await.unwrap();
}

#[tokio::test]
async fn test_with_config_file_reply() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("payload.txt"), "from disk").unwrap();
    std::fs::write(
        dir.path().join("fixture.yaml"),
        "stubs:\n  - url: /file\n    reply:\n      file: payload.txt\n",
    )
    .unwrap();

    let config = HockConfig::from_file(dir.path().join("fixture.yaml")).unwrap();
    let hock = Hock::with_config(&config).unwrap();
    let (_, sink) = send(&hock, IncomingRequest::new("GET", "/file")).await;
    assert_eq!(sink.body_text(), "from disk");
}

#[test]
fn test_with_config_rejects_bad_max() {
    let config = HockConfig::from_yaml_str("stubs:\n  - url: /a\n    max: lots\n").unwrap();
    assert!(matches!(
        Hock::with_config(&config),
        Err(HockError::Config(_))
    ));
}
