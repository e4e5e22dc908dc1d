//! Webhook relay library.
//!
//! Binds opaque connection ids to registered webhook URLs and forwards
//! inbound deliveries (or direct proxy calls) to them, stamping every
//! forwarded call with a fresh `X-Workato-Event-Id`.

pub mod config;
pub mod forwarding;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod registry;
pub mod routing;

pub use config::RelayConfig;
pub use forwarding::{ForwardError, ForwardRequest, Forwarder};
pub use http::RelayServer;
pub use lifecycle::Shutdown;
pub use registry::SubscriptionRegistry;
