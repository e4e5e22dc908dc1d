//! Connection id extraction for inbound webhook deliveries.
//!
//! # Precedence
//! 1. Last non-empty segment of the path, unless the path is `/`
//! 2. First `connection_id=` pair of the raw query string
//! 3. Nothing
//!
//! Values are returned exactly as they appear in the URI: no percent
//! decoding, no trimming. An empty value counts as absent.

use axum::http::Uri;

const QUERY_KEY: &str = "connection_id=";

/// Extract a connection id from a request path and optional raw query.
pub fn extract_connection_id<'a>(path: &'a str, query: Option<&'a str>) -> Option<&'a str> {
    from_path(path)
        .or_else(|| query.and_then(from_query))
        .filter(|id| !id.is_empty())
}

/// Extract a connection id from a request URI.
pub fn connection_id_from_uri(uri: &Uri) -> Option<&str> {
    extract_connection_id(uri.path(), uri.query())
}

fn from_path(path: &str) -> Option<&str> {
    if path.is_empty() || path == "/" {
        return None;
    }
    path.rsplit('/').find(|segment| !segment.is_empty())
}

fn from_query(query: &str) -> Option<&str> {
    query
        .split('&')
        .find_map(|pair| pair.strip_prefix(QUERY_KEY))
}
