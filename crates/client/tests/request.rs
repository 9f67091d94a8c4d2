use std::time::{Duration, Instant};

use gleaner_client::{Params, RequestClient, RequestOptions};
use gleaner_core::Error;
use serde::Deserialize;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Debug, Deserialize, PartialEq)]
struct Payload {
    ok: bool,
}

#[tokio::test]
async fn decodes_json_payloads() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .mount(&server)
        .await;

    let client = RequestClient::new();
    let payload: Payload = client
        .request_json(&format!("{}/data", server.uri()), RequestOptions::get())
        .await
        .unwrap();

    assert_eq!(payload, Payload { ok: true });
}

#[tokio::test]
async fn repeats_keys_for_array_params_and_forwards_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/search"))
        .and(query_param("limit", "500"))
        .and(query_param("tags", "alpha"))
        .and(body_json(json!({"criteria": {"q": "x"}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .mount(&server)
        .await;

    let client = RequestClient::new();
    let options = RequestOptions::post(json!({"criteria": {"q": "x"}})).with_params(
        Params::new()
            .set("limit", 500)
            .set_all("tags", ["alpha", "beta"]),
    );
    let payload: Payload = client
        .request_json(&format!("{}/search", server.uri()), options)
        .await
        .unwrap();

    assert!(payload.ok);
}

#[tokio::test]
async fn forwards_headers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/private"))
        .and(header("authorization", "Bearer token-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .mount(&server)
        .await;

    let mut headers = reqwest::header::HeaderMap::new();
    headers.insert(
        reqwest::header::AUTHORIZATION,
        "Bearer token-123".parse().unwrap(),
    );

    let client = RequestClient::new();
    let payload: Payload = client
        .request_json(
            &format!("{}/private", server.uri()),
            RequestOptions::get().with_headers(headers),
        )
        .await
        .unwrap();
    assert!(payload.ok);
}

#[tokio::test]
async fn waits_out_retry_after_then_succeeds() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/throttled"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "1"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/throttled"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .mount(&server)
        .await;

    let client = RequestClient::new().with_retry_margin(Duration::from_millis(50));
    let started = Instant::now();
    let payload: Payload = client
        .request_json(&format!("{}/throttled", server.uri()), RequestOptions::get())
        .await
        .unwrap();

    assert!(payload.ok);
    // at least the server-requested delay elapsed before the resubmission
    assert!(started.elapsed() >= Duration::from_secs(1));
}

#[tokio::test]
async fn persistent_throttling_exhausts_the_budget() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/throttled"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "0"))
        .mount(&server)
        .await;

    let client = RequestClient::new()
        .with_retries(2)
        .with_retry_margin(Duration::from_millis(10));
    let err = client
        .request_json::<Payload>(&format!("{}/throttled", server.uri()), RequestOptions::get())
        .await
        .unwrap_err();

    match err {
        Error::ThrottledRetryExceeded { attempts, .. } => assert_eq!(attempts, 2),
        other => panic!("expected ThrottledRetryExceeded, got {other}"),
    }
    // initial request plus two retries
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn non_success_status_fails_without_retry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = RequestClient::new();
    let err = client
        .request_json::<Payload>(&format!("{}/missing", server.uri()), RequestOptions::get())
        .await
        .unwrap_err();

    match err {
        Error::RequestFailed { status, .. } => assert_eq!(status, 404),
        other => panic!("expected RequestFailed, got {other}"),
    }
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn undecodable_body_is_a_parse_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/text"))
        .respond_with(ResponseTemplate::new(200).set_body_string("plain text"))
        .mount(&server)
        .await;

    let client = RequestClient::new();
    let url = format!("{}/text", server.uri());

    let err = client
        .request_json::<Payload>(&url, RequestOptions::get())
        .await
        .unwrap_err();
    match err {
        Error::ParseFailed { mode, .. } => assert_eq!(mode, "json"),
        other => panic!("expected ParseFailed, got {other}"),
    }

    // the same body decodes fine in text mode
    let text = client
        .request_text(&url, RequestOptions::get())
        .await
        .unwrap();
    assert_eq!(text, "plain text");
}
