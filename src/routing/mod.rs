//! Routing subsystem: correlating inbound deliveries with subscriptions.
//!
//! # Data Flow
//! ```text
//! Inbound request URI
//!     → correlator.rs (path segment, then ?connection_id=)
//!     → connection id
//!     → registry resolves destination URL
//! ```

pub mod correlator;

pub use correlator::{connection_id_from_uri, extract_connection_id};
