//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum routers (full API and ingress-only)
//! - Wire up middleware (request ID, tracing, timeout, body limit)
//! - Own the subscription registry and the swappable forwarder
//! - Apply forwarding config reloads while serving
//! - Serve until the shutdown signal fires

use arc_swap::ArcSwap;
use axum::{
    extract::DefaultBodyLimit,
    middleware::map_response,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::{limit::RequestBodyLimitLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::RelayConfig;
use crate::forwarding::Forwarder;
use crate::http::handlers;
use crate::http::request::{make_request_span, propagate_request_id_layer, set_request_id_layer};
use crate::http::response::{api_framework_errors, delivery_framework_errors};
use crate::registry::SubscriptionRegistry;

/// Errors that stop the server from starting or serving.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub registry: SubscriptionRegistry,
    pub forwarder: Arc<ArcSwap<Forwarder>>,
    pub service_name: Arc<str>,
}

impl AppState {
    /// The forwarder currently in effect.
    pub fn forwarder(&self) -> Arc<Forwarder> {
        self.forwarder.load_full()
    }
}

/// HTTP server for the webhook relay.
pub struct RelayServer {
    router: Router,
    ingress_router: Router,
    config: RelayConfig,
    state: AppState,
}

impl RelayServer {
    /// Create a new server with an empty registry.
    pub fn new(config: RelayConfig) -> Result<Self, ServerError> {
        Self::with_registry(config, SubscriptionRegistry::new())
    }

    /// Create a new server around an existing registry.
    pub fn with_registry(config: RelayConfig, registry: SubscriptionRegistry) -> Result<Self, ServerError> {
        let forwarder = Forwarder::new(&config.forwarding)?;

        let state = AppState {
            registry,
            forwarder: Arc::new(ArcSwap::from_pointee(forwarder)),
            service_name: Arc::from(config.service.name.as_str()),
        };

        let router = Self::build_router(&config, state.clone());
        let ingress_router = Self::build_ingress_router(&config, state.clone());
        Ok(Self {
            router,
            ingress_router,
            config,
            state,
        })
    }

    /// Full API surface; unmatched paths fall through to delivery.
    fn build_router(config: &RelayConfig, state: AppState) -> Router {
        let router = Router::new()
            .route("/health", get(handlers::health))
            .route("/webhook/subscribe", post(handlers::subscribe))
            .route("/webhook/unsubscribe", post(handlers::unsubscribe))
            .route("/proxy", get(handlers::proxy_get).post(handlers::proxy_post))
            .fallback(handlers::deliver)
            .with_state(state);
        Self::with_middleware(router, config, false)
    }

    /// Delivery on every path.
    fn build_ingress_router(config: &RelayConfig, state: AppState) -> Router {
        let router = Router::new().fallback(handlers::deliver).with_state(state);
        Self::with_middleware(router, config, true)
    }

    /// Wrap a router with the middleware stack. Last layer added runs first.
    #[allow(deprecated)]
    fn with_middleware(router: Router, config: &RelayConfig, delivery_only: bool) -> Router {
        let router = router
            .layer(RequestBodyLimitLayer::new(config.limits.max_body_bytes))
            .layer(DefaultBodyLimit::disable())
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)));

        // 405, 408 and 413 come from the framework; give them the router's error shape.
        let router = if delivery_only {
            router.layer(map_response(delivery_framework_errors))
        } else {
            router.layer(map_response(api_framework_errors))
        };

        router
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
            .layer(set_request_id_layer())
    }

    /// Run the server until `shutdown` fires.
    ///
    /// Also binds the ingress listener when one is configured, and applies
    /// forwarding settings from `config_updates` while running.
    pub async fn run(
        self,
        listener: TcpListener,
        config_updates: mpsc::UnboundedReceiver<RelayConfig>,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            service = %self.state.service_name,
            "HTTP server starting"
        );

        let reload_task = tokio::spawn(apply_config_updates(
            self.state.clone(),
            self.config.clone(),
            config_updates,
        ));

        let ingress_task = match &self.config.listener.ingress_address {
            Some(address) => {
                let ingress_listener = TcpListener::bind(address).await.map_err(|source| ServerError::Bind {
                    address: address.clone(),
                    source,
                })?;
                tracing::info!(address = %ingress_listener.local_addr()?, "Ingress listener started");

                let app = self.ingress_router.clone();
                let mut ingress_shutdown = shutdown.resubscribe();
                Some(tokio::spawn(async move {
                    axum::serve(ingress_listener, app)
                        .with_graceful_shutdown(async move {
                            let _ = ingress_shutdown.recv().await;
                        })
                        .await
                }))
            }
            None => None,
        };

        let mut shutdown = shutdown;
        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        if let Some(task) = ingress_task {
            match task.await {
                Ok(result) => result?,
                Err(e) => tracing::error!(error = %e, "Ingress listener task failed"),
            }
        }
        reload_task.abort();

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// The registry shared with every handler.
    pub fn registry(&self) -> &SubscriptionRegistry {
        &self.state.registry
    }
}

/// Apply reloaded configurations until the sender goes away.
///
/// Only forwarding settings take effect live; other changes are reported.
/// The request timeout layer keeps its startup value, so a forwarding update
/// whose connect + read budget reaches it is rejected.
async fn apply_config_updates(
    state: AppState,
    mut current: RelayConfig,
    mut updates: mpsc::UnboundedReceiver<RelayConfig>,
) {
    let request_timeout = Duration::from_secs(current.timeouts.request_secs);

    while let Some(update) = updates.recv().await {
        if update.forwarding != current.forwarding {
            let forward_budget = update.forwarding.connect_timeout() + update.forwarding.read_timeout();
            if forward_budget >= request_timeout {
                tracing::error!(
                    connect_timeout_ms = update.forwarding.connect_timeout_ms,
                    read_timeout_ms = update.forwarding.read_timeout_ms,
                    request_timeout_secs = request_timeout.as_secs(),
                    "Reloaded forwarding timeouts exceed the running request timeout, keeping current settings"
                );
                continue;
            }

            match Forwarder::new(&update.forwarding) {
                Ok(forwarder) => {
                    state.forwarder.store(Arc::new(forwarder));
                    tracing::info!(
                        connect_timeout_ms = update.forwarding.connect_timeout_ms,
                        read_timeout_ms = update.forwarding.read_timeout_ms,
                        use_system_proxy = update.forwarding.use_system_proxy,
                        "Forwarding settings reloaded"
                    );
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to rebuild forwarder, keeping current settings");
                    continue;
                }
            }
        }

        if update.listener != current.listener
            || update.service != current.service
            || update.timeouts != current.timeouts
            || update.limits != current.limits
            || update.observability != current.observability
        {
            tracing::warn!("Only [forwarding] changes apply without a restart; other changes were ignored");
        }

        current = update;
    }
}
