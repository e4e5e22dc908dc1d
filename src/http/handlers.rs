//! HTTP handlers: health, subscription management, proxying and delivery.

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri},
    response::Response,
    Json,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Instant;

use crate::forwarding::{project_headers, ForwardRequest, ForwardResult};
use crate::http::request::request_id;
use crate::http::response::{raw_json, ApiError, DeliveryError};
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::routing::connection_id_from_uri;

const WEBHOOK_URL_PARAM: &str = "webhook_url";

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub service: String,
}

/// Body of `POST /webhook/subscribe`.
#[derive(Debug, Deserialize)]
pub struct SubscribeRequest {
    pub workato_webhook_url: Option<String>,
    pub connection_id: Option<String>,
    /// Sent by the connector for bookkeeping; logged only.
    #[serde(default)]
    pub recipe_id: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct SubscribeResponse {
    pub success: bool,
    pub message: &'static str,
    pub connection_id: String,
    pub webhook_url: String,
}

/// Body of `POST /webhook/unsubscribe`.
#[derive(Debug, Deserialize)]
pub struct UnsubscribeRequest {
    pub connection_id: Option<String>,
    #[serde(default)]
    pub recipe_id: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct UnsubscribeResponse {
    pub success: bool,
    pub message: &'static str,
    pub connection_id: String,
}

/// Successful `/proxy` result wrapping the destination's raw body.
#[derive(Debug, Serialize)]
pub struct ProxyResponse {
    pub success: bool,
    pub response: String,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "healthy",
        service: state.service_name.to_string(),
    })
}

pub async fn subscribe(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<SubscribeResponse>, ApiError> {
    tracing::info!("Webhook subscribe request received");

    let request: SubscribeRequest = parse_json(&body)?;
    let connection_id = required_connection_id(request.connection_id)?;
    let webhook_url = request
        .workato_webhook_url
        .ok_or_else(|| ApiError::bad_request("workato_webhook_url is required"))?;

    tracing::info!(
        connection_id = %connection_id,
        webhook_url = %webhook_url,
        recipe_id = ?request.recipe_id,
        "Subscribing webhook"
    );

    if let Some(previous) = state.registry.subscribe(connection_id.clone(), webhook_url.clone()) {
        tracing::info!(
            connection_id = %connection_id,
            previous = %previous,
            "Replaced existing subscription"
        );
    }

    Ok(Json(SubscribeResponse {
        success: true,
        message: "Webhook subscribed successfully",
        connection_id,
        webhook_url,
    }))
}

pub async fn unsubscribe(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<UnsubscribeResponse>, ApiError> {
    tracing::info!("Webhook unsubscribe request received");

    let request: UnsubscribeRequest = parse_json(&body)?;
    let connection_id = required_connection_id(request.connection_id)?;

    let removed = state.registry.unsubscribe(&connection_id);
    tracing::info!(
        connection_id = %connection_id,
        recipe_id = ?request.recipe_id,
        was_subscribed = removed.is_some(),
        "Unsubscribed webhook"
    );

    Ok(Json(UnsubscribeResponse {
        success: true,
        message: "Webhook unsubscribed successfully",
        connection_id,
    }))
}

/// `POST /proxy`: forward a JSON object to `?webhook_url=` or its own `webhook_url` field.
pub async fn proxy_post(
    State(state): State<AppState>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ProxyResponse>, ApiError> {
    tracing::info!(request_id = %request_id(&headers), "Received POST request to proxy");

    let payload: Map<String, Value> = parse_json(&body)?;
    let params = query_params(&uri);

    let target = first_param(&params, WEBHOOK_URL_PARAM)
        .map(str::to_string)
        .or_else(|| {
            payload
                .get(WEBHOOK_URL_PARAM)
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .filter(|url| !url.is_empty())
        .ok_or_else(missing_webhook_url)?;

    let request = ForwardRequest::new(target, Value::Object(payload).to_string(), project_headers(&headers));
    let response = forward(&state, "proxy", request).await?;

    Ok(Json(ProxyResponse {
        success: true,
        response: String::from_utf8_lossy(&response).into_owned(),
    }))
}

/// `GET /proxy`: forward every query parameter except `webhook_url` as a flat JSON object.
pub async fn proxy_get(
    State(state): State<AppState>,
    uri: Uri,
    headers: HeaderMap,
) -> Result<Json<ProxyResponse>, ApiError> {
    tracing::info!(request_id = %request_id(&headers), "Received GET request to proxy");

    let params = query_params(&uri);
    let target = first_param(&params, WEBHOOK_URL_PARAM)
        .filter(|url| !url.is_empty())
        .ok_or_else(missing_webhook_url)?
        .to_string();

    let mut payload = Map::new();
    for (name, value) in &params {
        if name != WEBHOOK_URL_PARAM {
            payload
                .entry(name.clone())
                .or_insert_with(|| Value::String(value.clone()));
        }
    }

    let request = ForwardRequest::new(target, Value::Object(payload).to_string(), project_headers(&headers));
    let response = forward(&state, "proxy", request).await?;

    Ok(Json(ProxyResponse {
        success: true,
        response: String::from_utf8_lossy(&response).into_owned(),
    }))
}

/// Catch-all delivery: correlate, resolve, forward, relay the raw body.
pub async fn deliver(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, DeliveryError> {
    tracing::info!(method = %method, uri = %uri, "Received webhook delivery");

    let connection_id = connection_id_from_uri(&uri).ok_or_else(|| {
        tracing::warn!(uri = %uri, "No connection id in delivery");
        ApiError::bad_request("connection_id is required in path or query")
    })?;

    let destination = state
        .registry
        .resolve(connection_id)
        .filter(|url| !url.is_empty())
        .ok_or_else(|| {
            tracing::warn!(connection_id = %connection_id, "No webhook registered");
            ApiError::NotRegistered(connection_id.to_string())
        })?;

    let request = ForwardRequest::new(destination, body, project_headers(&headers));
    let response = forward(&state, "delivery", request).await?;

    Ok(raw_json(StatusCode::OK, response))
}

async fn forward(state: &AppState, path: &'static str, request: ForwardRequest) -> ForwardResult {
    let start = Instant::now();
    let destination = request.destination.clone();

    let result = state.forwarder().forward(request).await;
    match &result {
        Ok(_) => metrics::record_forward(path, "success", start),
        Err(e) => {
            tracing::warn!(destination = %destination, error = %e, "Forwarding failed");
            metrics::record_forward(path, e.outcome(), start);
        }
    }
    result
}

fn parse_json<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|e| ApiError::bad_request(format!("Invalid JSON body: {}", e)))
}

fn required_connection_id(connection_id: Option<String>) -> Result<String, ApiError> {
    connection_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::bad_request("connection_id is required"))
}

fn missing_webhook_url() -> ApiError {
    tracing::warn!("Missing webhook_url parameter");
    ApiError::bad_request("webhook_url is required")
}

/// Form-decoded query parameters in order of appearance.
fn query_params(uri: &Uri) -> Vec<(String, String)> {
    uri.query()
        .map(|query| {
            url::form_urlencoded::parse(query.as_bytes())
                .into_owned()
                .collect()
        })
        .unwrap_or_default()
}

fn first_param<'a>(params: &'a [(String, String)], name: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.as_str())
}
