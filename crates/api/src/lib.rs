//! HTTP API embedding the command pipeline.
//!
//! Serves a sample ledger domain over the [`commander::Commander`] backed by
//! the in-memory store, with structured logging (tracing) and Prometheus
//! metrics.

pub mod config;
pub mod error;
pub mod ledger;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use commander::{CommandRegistry, Commander, EventRegistry, RegistryError};
use metrics_exporter_prometheus::PrometheusHandle;
use store::{InMemoryStore, StoreConfig};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use ledger::Account;

/// The commander used by the API: ledger registries over one in-memory store.
pub type LedgerCommander = Commander<
    EventRegistry<Account>,
    CommandRegistry<Account>,
    InMemoryStore,
    InMemoryStore,
    InMemoryStore,
>;

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub commander: LedgerCommander,
    pub store: InMemoryStore,
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/accounts/{id}", get(routes::accounts::get))
        .route("/accounts/{id}/events", get(routes::accounts::events))
        .route(
            "/accounts/{id}/commands/{name}",
            post(routes::accounts::execute),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the default application state: ledger registries and a fresh store.
pub fn create_default_state(store_config: StoreConfig) -> Result<Arc<AppState>, RegistryError> {
    let store = InMemoryStore::with_config(store_config);
    let commander = Commander::new(
        ledger::events()?,
        ledger::commands()?,
        store.clone(),
        store.clone(),
        store.clone(),
    );
    Ok(Arc::new(AppState { commander, store }))
}
