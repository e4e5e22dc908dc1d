//! Header projection for forwarded calls.
//!
//! Inbound headers are republished to the destination minus `Host`, one value
//! per name, plus a fresh `X-Workato-Event-Id` the receiver deduplicates on.

use axum::http::{header, HeaderMap, HeaderName, HeaderValue};
use uuid::Uuid;

/// Deduplication header attached to every forwarded call.
pub const EVENT_ID_HEADER: &str = "x-workato-event-id";

/// Project inbound headers onto a forwarded call.
///
/// A new event id is generated on every call, so two projections of the same
/// inbound headers never share one.
pub fn project_headers(inbound: &HeaderMap) -> HeaderMap {
    let mut outbound = HeaderMap::with_capacity(inbound.keys_len() + 1);

    for name in inbound.keys() {
        if *name == header::HOST {
            continue;
        }
        // `get` yields the first value when a name repeats.
        if let Some(value) = inbound.get(name) {
            outbound.insert(name.clone(), value.clone());
        }
    }

    let event_id = Uuid::new_v4().to_string();
    match HeaderValue::try_from(event_id.as_str()) {
        Ok(value) => {
            tracing::debug!(event_id = %event_id, "Assigned event id");
            outbound.insert(HeaderName::from_static(EVENT_ID_HEADER), value);
        }
        Err(e) => tracing::warn!(event_id = %event_id, error = %e, "Could not encode event id header"),
    }

    outbound
}
