//! Outbound forwarding engine.
//!
//! # Responsibilities
//! - POST a body and projected headers to a destination URL
//! - Enforce connect and read timeouts
//! - Classify the outcome: success, upstream error, transport error
//!
//! # Design Decisions
//! - `Content-Type: application/json` is set first; forwarded headers are
//!   applied afterwards and win on conflict
//! - Framing headers are recomputed by the client, never copied
//! - Redirects are not followed; anything below 400 is a success
//! - One attempt per call; retry policy belongs to the caller
//! - The response is owned by the call, so its connection is released on
//!   every return path

use axum::body::Bytes;
use axum::http::{header, HeaderMap, HeaderName, HeaderValue};
use std::time::{Duration, Instant};
use url::Url;

use crate::config::ForwardingConfig;
use crate::forwarding::error::{ForwardError, ForwardResult};

/// Headers that describe the inbound connection or message framing.
const FRAMING_HEADERS: &[&str] = &[
    "connection",
    "content-length",
    "keep-alive",
    "proxy-connection",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// A single call to forward.
#[derive(Debug, Clone)]
pub struct ForwardRequest {
    /// Destination URL as registered or supplied; validated here, not earlier.
    pub destination: String,
    /// Opaque payload, sent verbatim.
    pub body: Bytes,
    /// Single-valued headers to apply on top of the defaults.
    pub headers: HeaderMap,
}

impl ForwardRequest {
    pub fn new(destination: impl Into<String>, body: impl Into<Bytes>, headers: HeaderMap) -> Self {
        Self {
            destination: destination.into(),
            body: body.into(),
            headers,
        }
    }
}

/// HTTP client wrapper that executes forwarded calls.
#[derive(Clone, Debug)]
pub struct Forwarder {
    client: reqwest::Client,
    connect_timeout: Duration,
    read_timeout: Duration,
}

impl Forwarder {
    /// Build a forwarder from configuration.
    pub fn new(config: &ForwardingConfig) -> reqwest::Result<Self> {
        let mut builder = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout())
            .read_timeout(config.read_timeout())
            .redirect(reqwest::redirect::Policy::none())
            .user_agent(concat!("webhook-relay/", env!("CARGO_PKG_VERSION")));

        if !config.use_system_proxy {
            builder = builder.no_proxy();
        }

        Ok(Self {
            client: builder.build()?,
            connect_timeout: config.connect_timeout(),
            read_timeout: config.read_timeout(),
        })
    }

    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    /// Forward one request and classify the outcome.
    pub async fn forward(&self, request: ForwardRequest) -> ForwardResult {
        let ForwardRequest {
            destination,
            body,
            headers,
        } = request;

        let url = parse_destination(&destination)?;
        let start = Instant::now();

        tracing::info!(destination = %url, bytes = body.len(), "Forwarding request to webhook");

        let response = self
            .client
            .post(url)
            .headers(outbound_headers(&headers))
            .body(body)
            // Backstop so a slow trickle of bytes cannot outlive connect + read.
            .timeout(self.connect_timeout + self.read_timeout)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(transport_error)?;

        tracing::info!(
            status = status.as_u16(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Webhook response received"
        );

        if status.as_u16() >= 400 {
            return Err(ForwardError::Upstream {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        Ok(body)
    }
}

fn parse_destination(destination: &str) -> Result<Url, ForwardError> {
    let url = Url::parse(destination).map_err(|e| {
        ForwardError::Transport(format!("Invalid webhook URL '{}': {}", destination, e))
    })?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ForwardError::Transport(format!(
            "Unsupported webhook URL scheme '{}' in '{}'",
            other, destination
        ))),
    }
}

fn outbound_headers(forwarded: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(forwarded.keys_len() + 1);
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));

    for name in forwarded.keys() {
        if is_framing_header(name) {
            continue;
        }
        if let Some(value) = forwarded.get(name) {
            headers.insert(name.clone(), value.clone());
        }
    }
    headers
}

fn is_framing_header(name: &HeaderName) -> bool {
    FRAMING_HEADERS.contains(&name.as_str())
}

fn transport_error(e: reqwest::Error) -> ForwardError {
    let kind = if e.is_timeout() {
        "timed out"
    } else if e.is_connect() {
        "connection failed"
    } else if e.is_body() || e.is_decode() {
        "response could not be read"
    } else {
        "request failed"
    };
    ForwardError::Transport(format!("Webhook {}: {}", kind, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_destination_is_transport_error() {
        for destination in ["", "not a url", "ftp://example.com/hook"] {
            let err = parse_destination(destination).unwrap_err();
            assert!(err.is_transport(), "{:?} should be a transport error", destination);
        }
        assert!(parse_destination("https://example.com/hook").is_ok());
    }

    #[test]
    fn test_forwarded_content_type_overrides_default() {
        let mut forwarded = HeaderMap::new();
        forwarded.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));

        let headers = outbound_headers(&forwarded);
        assert_eq!(headers.get(header::CONTENT_TYPE).unwrap(), "text/plain");

        let headers = outbound_headers(&HeaderMap::new());
        assert_eq!(headers.get(header::CONTENT_TYPE).unwrap(), "application/json");
    }

    #[test]
    fn test_framing_headers_not_copied() {
        let mut forwarded = HeaderMap::new();
        forwarded.insert(header::CONTENT_LENGTH, HeaderValue::from_static("999"));
        forwarded.insert(header::TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
        forwarded.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
        forwarded.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer t"));

        let headers = outbound_headers(&forwarded);
        assert!(headers.get(header::CONTENT_LENGTH).is_none());
        assert!(headers.get(header::TRANSFER_ENCODING).is_none());
        assert!(headers.get(header::CONNECTION).is_none());
        assert_eq!(headers.get(header::AUTHORIZATION).unwrap(), "Bearer t");
    }

    #[tokio::test]
    async fn test_invalid_url_fails_before_io() {
        let forwarder = Forwarder::new(&ForwardingConfig::default()).unwrap();
        let result = forwarder
            .forward(ForwardRequest::new("", "{}", HeaderMap::new()))
            .await;
        assert!(matches!(result, Err(ForwardError::Transport(msg)) if msg.contains("Invalid webhook URL")));
    }
}
