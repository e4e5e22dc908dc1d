//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, listeners)
//!     → request.rs (request ID, tracing span)
//!     → handlers.rs
//!         /health, /webhook/subscribe, /webhook/unsubscribe → registry
//!         /proxy                                           → forwarding
//!         anything else                                    → routing → registry → forwarding
//!     → response.rs (JSON bodies, error → status mapping)
//! ```

pub mod handlers;
pub mod request;
pub mod response;
pub mod server;

pub use request::X_REQUEST_ID;
pub use response::{ApiError, DeliveryError};
pub use server::{AppState, RelayServer, ServerError};
