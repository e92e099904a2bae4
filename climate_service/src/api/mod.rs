//! HTTP layer powered by Axum.
//!
//! Read-only routes over the observation store. Static routes take
//! precedence over the `:start` date parameter.

pub mod error;
pub mod handlers;

use std::sync::Arc;

use axum::Router;
use axum::routing::get;

use crate::store::Connector;

/// Shared by every request; only the connector is shared, never a
/// connection.
#[derive(Clone)]
pub struct AppState {
    pub connector: Arc<dyn Connector>,
}

impl AppState {
    pub fn new(connector: impl Connector + 'static) -> Self {
        Self { connector: Arc::new(connector) }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/api/v1.0/precipitation", get(handlers::precipitation))
        .route("/api/v1.0/stations", get(handlers::stations))
        .route("/api/v1.0/tobs", get(handlers::tobs))
        .route("/api/v1.0/:start", get(handlers::temperature_stats_from))
        .route("/api/v1.0/:start/:end", get(handlers::temperature_stats_range))
        .with_state(state)
}
