//! Route handlers.
//!
//! Each data route opens one store connection on the blocking pool, runs a
//! single store operation, drops the connection and shapes the rows into
//! JSON.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::response::Html;

use crate::api::AppState;
use crate::api::error::ApiError;
use crate::logging::{self, Source};
use crate::model::{DailyTemperatureStats, StoreError};
use crate::store::ClimateStore;

pub const ROUTE_LISTING: &str = "Available Routes:<br/>\
    /api/v1.0/precipitation<br/>\
    /api/v1.0/stations<br/>\
    /api/v1.0/tobs<br/>\
    /api/v1.0/&lt;start&gt;<br/>\
    /api/v1.0/&lt;start&gt;/&lt;end&gt;";

/// `[{date: value}, ...]`, one single-key object per row, in row order.
pub type DateKeyed<T> = Vec<BTreeMap<String, T>>;

pub fn date_keyed<T>(rows: impl IntoIterator<Item = (String, T)>) -> DateKeyed<T> {
    rows.into_iter()
        .map(|(date, value)| BTreeMap::from([(date, value)]))
        .collect()
}

/// Runs `op` against a freshly opened store without blocking the executor.
/// The store, and with it the connection, is dropped before this returns.
async fn with_store<T, F>(state: &AppState, operation: &'static str, op: F) -> Result<T, ApiError>
where
    F: FnOnce(&mut dyn ClimateStore) -> Result<T, StoreError> + Send + 'static,
    T: Send + 'static,
{
    logging::debug(Source::Http, Some(operation), "handling request");

    let connector = Arc::clone(&state.connector);
    let result = tokio::task::spawn_blocking(move || {
        let mut store = connector.open()?;
        op(store.as_mut())
    })
    .await?;

    result.map_err(|err| {
        logging::log_store_failure(operation, &err);
        ApiError::from(err)
    })
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

pub async fn index() -> Html<&'static str> {
    Html(ROUTE_LISTING)
}

pub async fn precipitation(
    State(state): State<AppState>,
) -> Result<Json<DateKeyed<Option<f64>>>, ApiError> {
    let rows = with_store(&state, "precipitation", |store| store.list_precipitation()).await?;
    Ok(Json(date_keyed(rows.into_iter().map(|r| (r.date, r.prcp)))))
}

pub async fn stations(
    State(state): State<AppState>,
) -> Result<Json<BTreeMap<String, String>>, ApiError> {
    let stations = with_store(&state, "stations", |store| store.list_stations()).await?;
    Ok(Json(stations))
}

pub async fn tobs(State(state): State<AppState>) -> Result<Json<DateKeyed<i32>>, ApiError> {
    let rows = with_store(&state, "tobs", |store| store.last_year_temperatures()).await?;
    Ok(Json(date_keyed(rows.into_iter().map(|r| (r.date, r.tobs)))))
}

pub async fn temperature_stats_from(
    State(state): State<AppState>,
    Path(start): Path<String>,
) -> Result<Json<Vec<DailyTemperatureStats>>, ApiError> {
    let stats = with_store(&state, "temperature_stats_from", move |store| {
        store.temperature_stats_from(&start)
    })
    .await?;
    Ok(Json(stats))
}

pub async fn temperature_stats_range(
    State(state): State<AppState>,
    Path((start, end)): Path<(String, String)>,
) -> Result<Json<Vec<DailyTemperatureStats>>, ApiError> {
    let stats = with_store(&state, "temperature_stats_range", move |store| {
        store.temperature_stats_range(&start, &end)
    })
    .await?;
    Ok(Json(stats))
}
