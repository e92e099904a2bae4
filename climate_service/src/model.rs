/// Core data types for the climate observation API.
///
/// This module defines the shared domain model imported by all other modules:
/// the two stored relations, the row shapes returned by the data access
/// layer, and the store error type. It contains no I/O.

use serde::Serialize;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Date format
// ---------------------------------------------------------------------------

/// Format of every `date` value in the measurement table, e.g. "2017-08-23".
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Length of the `/tobs` window, in calendar days.
pub const LAST_YEAR_DAYS: i64 = 365;

// ---------------------------------------------------------------------------
// Stored relations
// ---------------------------------------------------------------------------

/// One daily observation at one station.
///
/// Mirrors a row of the `measurement` table. Dates stay string-typed, as in
/// the store, so range filters compare them lexicographically.
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    pub station: String,
    pub date: String,       // YYYY-MM-DD
    pub prcp: Option<f64>,  // precipitation, missing on some days
    pub tobs: i32,          // temperature observation
}

/// A weather observation station. Mirrors a row of the `station` table.
///
/// The table also carries geographic columns; the API never reads them.
#[derive(Debug, Clone, PartialEq)]
pub struct Station {
    pub station: String,
    pub name: String,
}

// ---------------------------------------------------------------------------
// Query results
// ---------------------------------------------------------------------------

/// `(date, prcp)` row of the precipitation listing.
#[derive(Debug, Clone, PartialEq)]
pub struct PrecipitationReading {
    pub date: String,
    pub prcp: Option<f64>,
}

/// `(date, tobs)` row of the temperature listing.
#[derive(Debug, Clone, PartialEq)]
pub struct TemperatureReading {
    pub date: String,
    pub tobs: i32,
}

/// Per-date temperature aggregate over every station reporting that day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyTemperatureStats {
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "TMIN")]
    pub tmin: i32,
    #[serde(rename = "TAVG")]
    pub tavg: f64,
    #[serde(rename = "TMAX")]
    pub tmax: i32,
}

/// Inclusive date bounds for the temperature statistics queries.
///
/// Bounds are passed through to the store unvalidated; an open `end`
/// means "every date from `start` on".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateRange {
    pub start: String,
    pub end: Option<String>,
}

impl DateRange {
    pub fn since(start: impl Into<String>) -> Self {
        Self { start: start.into(), end: None }
    }

    pub fn between(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self { start: start.into(), end: Some(end.into()) }
    }

    /// Same lexicographic comparison the SQL filters apply.
    pub fn contains(&self, date: &str) -> bool {
        date >= self.start.as_str()
            && self.end.as_deref().map_or(true, |end| date <= end)
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can arise when reading from the observation store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Connection or query failure reported by PostgreSQL.
    #[error("Database error: {0}")]
    Database(#[from] postgres::Error),
    /// A stored date did not match `YYYY-MM-DD`.
    #[error("Malformed date in store: {0}")]
    MalformedDate(String),
    /// Startup introspection found the tables missing or incomplete.
    #[error("Schema error: {0}")]
    Schema(String),
}
