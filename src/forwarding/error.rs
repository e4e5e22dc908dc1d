//! Forwarding outcome types.

use axum::body::Bytes;
use thiserror::Error;

/// Why a forwarded call did not succeed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ForwardError {
    /// The destination answered with status >= 400.
    #[error("Webhook returned error: {status} - {body}")]
    Upstream { status: u16, body: String },

    /// The call could not be completed: bad URL, connect failure, timeout, I/O.
    #[error("{0}")]
    Transport(String),
}

impl ForwardError {
    /// Label used for metrics and logs.
    pub fn outcome(&self) -> &'static str {
        match self {
            ForwardError::Upstream { .. } => "upstream_error",
            ForwardError::Transport(_) => "transport_error",
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, ForwardError::Transport(_))
    }
}

/// Successful response body as received, or a classified failure.
pub type ForwardResult = Result<Bytes, ForwardError>;
