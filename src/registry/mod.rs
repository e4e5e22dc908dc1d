//! Subscription registry subsystem.
//!
//! # Data Flow
//! ```text
//! POST /webhook/subscribe   → subscribe(id, url)   (upsert, last write wins)
//! POST /webhook/unsubscribe → unsubscribe(id)      (no-op when unknown)
//! inbound delivery          → resolve(id)          (Option<url>)
//! ```
//!
//! # Design Decisions
//! - Owned by the server state and injected into handlers; no global map
//! - Process-lifetime only: no persistence, no expiry
//! - Sharded concurrent map so unrelated ids never contend

pub mod subscriptions;

pub use subscriptions::SubscriptionRegistry;
