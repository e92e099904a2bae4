//! Data access layer.
//!
//! A backend implements the row-fetching primitives of [`ClimateStore`];
//! station map-building, the one-year `/tobs` window and the
//! start / start-end statistics wrappers are provided methods, so every
//! backend answers the API operations identically.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};

use crate::model::{
    DATE_FORMAT, DailyTemperatureStats, DateRange, LAST_YEAR_DAYS, PrecipitationReading,
    StoreError, TemperatureReading,
};

// ---------------------------------------------------------------------------
// Store trait
// ---------------------------------------------------------------------------

pub trait ClimateStore {
    /// Every measurement's `(date, prcp)`, ordered by date ascending.
    fn precipitation_rows(&mut self) -> Result<Vec<PrecipitationReading>, StoreError>;

    /// Every station's `(station, name)` in table order.
    fn station_rows(&mut self) -> Result<Vec<(String, String)>, StoreError>;

    /// The greatest measurement date, or `None` for an empty table.
    fn latest_observation_date(&mut self) -> Result<Option<String>, StoreError>;

    /// `(date, tobs)` for every measurement with `date >= since`, ordered by
    /// date ascending.
    fn temperatures_since(&mut self, since: &str) -> Result<Vec<TemperatureReading>, StoreError>;

    /// Per-date MIN/AVG/MAX of `tobs` over the dates in `range`, ordered by
    /// date ascending.
    fn temperature_stats(
        &mut self,
        range: &DateRange,
    ) -> Result<Vec<DailyTemperatureStats>, StoreError>;

    fn list_precipitation(&mut self) -> Result<Vec<PrecipitationReading>, StoreError> {
        self.precipitation_rows()
    }

    /// Station id → name. A repeated id keeps the name of its last row.
    fn list_stations(&mut self) -> Result<BTreeMap<String, String>, StoreError> {
        Ok(self.station_rows()?.into_iter().collect())
    }

    /// Observations from the last 365 days of data, across all stations.
    fn last_year_temperatures(&mut self) -> Result<Vec<TemperatureReading>, StoreError> {
        match self.latest_observation_date()? {
            Some(latest) => {
                let since = one_year_before(&latest)?;
                self.temperatures_since(&since)
            }
            None => Ok(Vec::new()),
        }
    }

    fn temperature_stats_from(
        &mut self,
        start: &str,
    ) -> Result<Vec<DailyTemperatureStats>, StoreError> {
        self.temperature_stats(&DateRange::since(start))
    }

    fn temperature_stats_range(
        &mut self,
        start: &str,
        end: &str,
    ) -> Result<Vec<DailyTemperatureStats>, StoreError> {
        self.temperature_stats(&DateRange::between(start, end))
    }
}

/// Opens a store scoped to a single request.
///
/// Implementations are shared across request threads; the returned store is
/// not, and is dropped (closing any connection) once the request's query
/// has run.
pub trait Connector: Send + Sync {
    fn open(&self) -> Result<Box<dyn ClimateStore>, StoreError>;
}

// ---------------------------------------------------------------------------
// Date window
// ---------------------------------------------------------------------------

/// Returns the date [`LAST_YEAR_DAYS`] calendar days before `latest`.
///
/// Both sides are `YYYY-MM-DD` strings. A leap day inside the window shifts
/// the result one day later than the same month-day of the prior year.
pub fn one_year_before(latest: &str) -> Result<String, StoreError> {
    let date = NaiveDate::parse_from_str(latest, DATE_FORMAT)
        .map_err(|_| StoreError::MalformedDate(latest.to_string()))?;
    let start = date - Duration::days(LAST_YEAR_DAYS);
    Ok(start.format(DATE_FORMAT).to_string())
}
