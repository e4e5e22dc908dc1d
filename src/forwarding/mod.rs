//! Forwarding subsystem.
//!
//! # Data Flow
//! ```text
//! inbound headers ──→ headers.rs (drop Host, first value, + X-Workato-Event-Id)
//!                          │
//! destination + body ──────┴─→ engine.rs (POST, timeouts, classify)
//!                                  │
//!                                  ├─ Ok(body)                    status < 400
//!                                  ├─ Err(Upstream{status, body}) status >= 400
//!                                  └─ Err(Transport(msg))         no usable response
//! ```

pub mod engine;
pub mod error;
pub mod headers;

pub use engine::{ForwardRequest, Forwarder};
pub use error::{ForwardError, ForwardResult};
pub use headers::{project_headers, EVENT_ID_HEADER};
