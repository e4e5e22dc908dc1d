//! Forwarding engine tests against live mock destinations.

use axum::body::Bytes;
use axum::http::{header, HeaderMap, HeaderValue};
use std::time::{Duration, Instant};
use webhook_relay::config::ForwardingConfig;
use webhook_relay::forwarding::{project_headers, EVENT_ID_HEADER};
use webhook_relay::{ForwardError, ForwardRequest, Forwarder};

mod common;

fn forwarder(timeout_ms: u64) -> Forwarder {
    Forwarder::new(&ForwardingConfig {
        connect_timeout_ms: timeout_ms,
        read_timeout_ms: timeout_ms,
        use_system_proxy: false,
    })
    .unwrap()
}

#[tokio::test]
async fn test_success_returns_body_verbatim() {
    let destination = common::start_destination(201, "ok").await;

    let result = forwarder(1_000)
        .forward(ForwardRequest::new(destination.url("/hook"), "{\"a\":1}", HeaderMap::new()))
        .await;

    assert_eq!(result, Ok(Bytes::from_static(b"ok")));

    let request = destination.next_request().await;
    assert_eq!(request.method, "POST");
    assert_eq!(request.path, "/hook");
    assert_eq!(request.body, "{\"a\":1}");
    assert_eq!(request.headers.get("content-type").unwrap(), "application/json");
}

#[tokio::test]
async fn test_error_status_is_upstream_error() {
    let destination = common::start_destination(404, "not found").await;

    let result = forwarder(1_000)
        .forward(ForwardRequest::new(destination.url("/hook"), "{}", HeaderMap::new()))
        .await;

    assert_eq!(
        result,
        Err(ForwardError::Upstream {
            status: 404,
            body: "not found".to_string(),
        })
    );
}

#[tokio::test]
async fn test_redirect_is_not_followed() {
    let destination = common::start_destination(302, "moved").await;

    let result = forwarder(1_000)
        .forward(ForwardRequest::new(destination.url("/hook"), "{}", HeaderMap::new()))
        .await;

    assert_eq!(result, Ok(Bytes::from_static(b"moved")));
}

#[tokio::test]
async fn test_non_utf8_body_returned_byte_for_byte() {
    let raw: &'static [u8] = b"{\"name\":\"caf\xe9\"}";
    let destination = common::start_bytes_destination(200, raw).await;

    let result = forwarder(1_000)
        .forward(ForwardRequest::new(destination.url("/hook"), "{}", HeaderMap::new()))
        .await;

    assert_eq!(result, Ok(Bytes::from_static(raw)));
}

#[tokio::test]
async fn test_unreachable_destination_is_transport_error() {
    let addr = common::unused_addr().await;

    let result = forwarder(1_000)
        .forward(ForwardRequest::new(format!("http://{}/hook", addr), "{}", HeaderMap::new()))
        .await;

    assert!(matches!(result, Err(ForwardError::Transport(_))), "got {:?}", result);
}

#[tokio::test]
async fn test_silent_destination_times_out_within_bound() {
    let addr = common::start_silent_destination().await;
    let start = Instant::now();

    let result = forwarder(200)
        .forward(ForwardRequest::new(format!("http://{}/hook", addr), "{}", HeaderMap::new()))
        .await;

    assert!(matches!(result, Err(ForwardError::Transport(_))), "got {:?}", result);
    assert!(start.elapsed() < Duration::from_secs(3), "took {:?}", start.elapsed());
}

#[tokio::test]
async fn test_projected_headers_reach_destination() {
    let destination = common::start_destination(200, "{}").await;

    let mut inbound = HeaderMap::new();
    inbound.insert(header::HOST, HeaderValue::from_static("relay.example"));
    inbound.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
    inbound.insert(header::CONTENT_LENGTH, HeaderValue::from_static("12345"));
    inbound.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/vnd.custom+json"));
    let projected = project_headers(&inbound);
    let event_id = projected.get(EVENT_ID_HEADER).unwrap().to_str().unwrap().to_string();

    forwarder(1_000)
        .forward(ForwardRequest::new(destination.url("/hook"), "{\"x\":true}", projected))
        .await
        .unwrap();

    let request = destination.next_request().await;
    assert_eq!(request.headers.get("authorization").unwrap(), "Bearer abc");
    assert_eq!(request.headers.get(EVENT_ID_HEADER).unwrap(), &event_id);
    assert_eq!(
        request.headers.get("content-type").unwrap(),
        "application/vnd.custom+json"
    );
    assert_ne!(request.headers.get("host").unwrap(), "relay.example");
    assert_eq!(request.headers.get("content-length").unwrap(), "10");
    assert_eq!(request.body, "{\"x\":true}");
}
