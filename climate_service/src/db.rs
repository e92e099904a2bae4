/// PostgreSQL backend for the observation store.
///
/// Every query is a plain SQL string against the `measurement` and
/// `station` tables (see `sql/001_climate_schema.sql`). Aggregation and
/// ordering happen in the database; this module only maps rows.

use postgres::{Client, NoTls};

use crate::model::{
    DailyTemperatureStats, DateRange, PrecipitationReading, StoreError, TemperatureReading,
};
use crate::schema;
use crate::store::{ClimateStore, Connector};

// Dates are compared and sorted byte-wise (`COLLATE "C"`), whatever the
// database's default collation, so a malformed bound selects the same rows
// as a plain string comparison.

const PRECIPITATION_QUERY: &str = "
    SELECT date, prcp
    FROM measurement
    ORDER BY date COLLATE \"C\"
";

const STATIONS_QUERY: &str = "
    SELECT station, name
    FROM station
    ORDER BY id
";

const LATEST_DATE_QUERY: &str = "
    SELECT date
    FROM measurement
    ORDER BY date COLLATE \"C\" DESC
    LIMIT 1
";

const TEMPERATURES_SINCE_QUERY: &str = "
    SELECT date, tobs
    FROM measurement
    WHERE date COLLATE \"C\" >= $1
    ORDER BY date COLLATE \"C\"
";

const STATS_FROM_QUERY: &str = "
    SELECT date, MIN(tobs), AVG(tobs)::DOUBLE PRECISION, MAX(tobs)
    FROM measurement
    WHERE date COLLATE \"C\" >= $1
    GROUP BY date
    ORDER BY date COLLATE \"C\"
";

const STATS_RANGE_QUERY: &str = "
    SELECT date, MIN(tobs), AVG(tobs)::DOUBLE PRECISION, MAX(tobs)
    FROM measurement
    WHERE date COLLATE \"C\" >= $1 AND date COLLATE \"C\" <= $2
    GROUP BY date
    ORDER BY date COLLATE \"C\"
";

// ---------------------------------------------------------------------------
// Connections
// ---------------------------------------------------------------------------

/// Opens a plain (non-TLS) connection.
pub fn connect(database_url: &str) -> Result<Client, StoreError> {
    Ok(Client::connect(database_url, NoTls)?)
}

/// Opens a connection and checks that both tables expose the columns the
/// API reads. Run once at startup so a misprovisioned database fails fast
/// instead of on the first request.
pub fn connect_and_verify(database_url: &str) -> Result<Client, StoreError> {
    let mut client = connect(database_url)?;
    let report = schema::inspect(&mut client)?;
    report.log();
    report.ensure_complete()?;
    Ok(client)
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// A [`ClimateStore`] over one open connection.
pub struct PgStore {
    client: Client,
}

impl PgStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl ClimateStore for PgStore {
    fn precipitation_rows(&mut self) -> Result<Vec<PrecipitationReading>, StoreError> {
        let rows = self.client.query(PRECIPITATION_QUERY, &[])?;
        rows.iter()
            .map(|row| -> Result<_, StoreError> {
                Ok(PrecipitationReading {
                    date: row.try_get(0)?,
                    prcp: row.try_get(1)?,
                })
            })
            .collect()
    }

    fn station_rows(&mut self) -> Result<Vec<(String, String)>, StoreError> {
        let rows = self.client.query(STATIONS_QUERY, &[])?;
        rows.iter()
            .map(|row| -> Result<_, StoreError> { Ok((row.try_get(0)?, row.try_get(1)?)) })
            .collect()
    }

    fn latest_observation_date(&mut self) -> Result<Option<String>, StoreError> {
        let row = self.client.query_opt(LATEST_DATE_QUERY, &[])?;
        Ok(row.map(|row| row.try_get(0)).transpose()?)
    }

    fn temperatures_since(&mut self, since: &str) -> Result<Vec<TemperatureReading>, StoreError> {
        let rows = self.client.query(TEMPERATURES_SINCE_QUERY, &[&since])?;
        rows.iter()
            .map(|row| -> Result<_, StoreError> {
                Ok(TemperatureReading {
                    date: row.try_get(0)?,
                    tobs: row.try_get(1)?,
                })
            })
            .collect()
    }

    fn temperature_stats(
        &mut self,
        range: &DateRange,
    ) -> Result<Vec<DailyTemperatureStats>, StoreError> {
        let rows = match &range.end {
            Some(end) => self.client.query(STATS_RANGE_QUERY, &[&range.start, end])?,
            None => self.client.query(STATS_FROM_QUERY, &[&range.start])?,
        };
        rows.iter()
            .map(|row| -> Result<_, StoreError> {
                Ok(DailyTemperatureStats {
                    date: row.try_get(0)?,
                    tmin: row.try_get(1)?,
                    tavg: row.try_get(2)?,
                    tmax: row.try_get(3)?,
                })
            })
            .collect()
    }
}

/// Opens a fresh connection for every request.
pub struct PgConnector {
    database_url: String,
}

impl PgConnector {
    pub fn new(database_url: impl Into<String>) -> Self {
        Self { database_url: database_url.into() }
    }
}

impl Connector for PgConnector {
    fn open(&self) -> Result<Box<dyn ClimateStore>, StoreError> {
        Ok(Box::new(PgStore::new(connect(&self.database_url)?)))
    }
}
