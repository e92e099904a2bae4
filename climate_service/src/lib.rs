//! Read-only JSON API over a climate observation dataset: daily
//! precipitation and temperature measurements per weather station, plus
//! station metadata, served from PostgreSQL.

pub mod api;
pub mod config;
pub mod db;
pub mod logging;
pub mod memory_store;
pub mod model;
pub mod schema;
pub mod store;
