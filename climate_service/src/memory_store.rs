/// In-memory observation store.
///
/// Serves a fixed dataset with the same semantics as the PostgreSQL queries
/// in `db` (string comparison on dates, per-date MIN/AVG/MAX, ascending date
/// order). Used to run the API against known data without a live database.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::model::{
    DailyTemperatureStats, DateRange, Measurement, PrecipitationReading, Station, StoreError,
    TemperatureReading,
};
use crate::store::{ClimateStore, Connector};

/// Immutable rows of both relations, in insertion ("table") order.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub measurements: Vec<Measurement>,
    pub stations: Vec<Station>,
}

pub struct MemoryStore {
    data: Arc<Dataset>,
}

impl MemoryStore {
    pub fn new(data: Arc<Dataset>) -> Self {
        Self { data }
    }

    /// Measurements sorted by date; ties keep table order, like a stable
    /// `ORDER BY date`.
    fn by_date(&self) -> Vec<&Measurement> {
        let mut rows: Vec<&Measurement> = self.data.measurements.iter().collect();
        rows.sort_by(|a, b| a.date.cmp(&b.date));
        rows
    }
}

impl ClimateStore for MemoryStore {
    fn precipitation_rows(&mut self) -> Result<Vec<PrecipitationReading>, StoreError> {
        Ok(self
            .by_date()
            .into_iter()
            .map(|m| PrecipitationReading { date: m.date.clone(), prcp: m.prcp })
            .collect())
    }

    fn station_rows(&mut self) -> Result<Vec<(String, String)>, StoreError> {
        Ok(self
            .data
            .stations
            .iter()
            .map(|s| (s.station.clone(), s.name.clone()))
            .collect())
    }

    fn latest_observation_date(&mut self) -> Result<Option<String>, StoreError> {
        Ok(self.data.measurements.iter().map(|m| m.date.clone()).max())
    }

    fn temperatures_since(&mut self, since: &str) -> Result<Vec<TemperatureReading>, StoreError> {
        Ok(self
            .by_date()
            .into_iter()
            .filter(|m| m.date.as_str() >= since)
            .map(|m| TemperatureReading { date: m.date.clone(), tobs: m.tobs })
            .collect())
    }

    fn temperature_stats(
        &mut self,
        range: &DateRange,
    ) -> Result<Vec<DailyTemperatureStats>, StoreError> {
        // date -> (min, sum, count, max)
        let mut groups: BTreeMap<&str, (i32, i64, u32, i32)> = BTreeMap::new();
        for m in self.data.measurements.iter().filter(|m| range.contains(&m.date)) {
            let entry = groups.entry(m.date.as_str()).or_insert((m.tobs, 0, 0, m.tobs));
            entry.0 = entry.0.min(m.tobs);
            entry.1 += i64::from(m.tobs);
            entry.2 += 1;
            entry.3 = entry.3.max(m.tobs);
        }

        Ok(groups
            .into_iter()
            .map(|(date, (tmin, sum, count, tmax))| DailyTemperatureStats {
                date: date.to_string(),
                tmin,
                tavg: sum as f64 / f64::from(count),
                tmax,
            })
            .collect())
    }
}

/// Hands each request its own [`MemoryStore`] over the shared dataset.
#[derive(Debug, Clone, Default)]
pub struct MemoryConnector {
    data: Arc<Dataset>,
}

impl MemoryConnector {
    pub fn new(data: Dataset) -> Self {
        Self { data: Arc::new(data) }
    }
}

impl Connector for MemoryConnector {
    fn open(&self) -> Result<Box<dyn ClimateStore>, StoreError> {
        Ok(Box::new(MemoryStore::new(Arc::clone(&self.data))))
    }
}
