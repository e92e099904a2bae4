//! Startup schema introspection.
//!
//! The observation tables are provisioned outside this service. Before
//! serving, the columns each table actually exposes are read from
//! `information_schema` and compared with the columns the queries in `db`
//! depend on.

use postgres::Client;

use crate::logging::{self, Source};
use crate::model::StoreError;

/// A column the queries read, with the PostgreSQL `data_type` values its
/// Rust mapping accepts. An empty list accepts any type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RequiredColumn {
    pub name: &'static str,
    pub data_types: &'static [&'static str],
}

const TEXT: &[&str] = &["text", "character varying"];

/// Columns each table must expose, in `(table, columns)` form.
pub const REQUIRED_COLUMNS: &[(&str, &[RequiredColumn])] = &[
    (
        "measurement",
        &[
            RequiredColumn { name: "station", data_types: TEXT },
            RequiredColumn { name: "date", data_types: TEXT },
            RequiredColumn { name: "prcp", data_types: &["double precision"] },
            RequiredColumn { name: "tobs", data_types: &["integer"] },
        ],
    ),
    (
        "station",
        &[
            RequiredColumn { name: "id", data_types: &[] }, // only sorted on
            RequiredColumn { name: "station", data_types: TEXT },
            RequiredColumn { name: "name", data_types: TEXT },
        ],
    ),
];

// ============================================================================
// Report
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct TableReport {
    pub table: String,
    pub exists: bool,
    pub columns_found: Vec<String>,
    pub columns_missing: Vec<String>,
    /// `"column is <found>, expected <accepted>"` per wrongly typed column.
    pub columns_mistyped: Vec<String>,
}

impl TableReport {
    /// Compares the `(column, data_type)` pairs discovered for `table`
    /// against `required`. An empty `found` list means the table does not
    /// exist.
    pub fn compare(table: &str, required: &[RequiredColumn], found: Vec<(String, String)>) -> Self {
        let mut columns_missing = Vec::new();
        let mut columns_mistyped = Vec::new();

        for column in required {
            match found.iter().find(|(name, _)| name.as_str() == column.name) {
                None => columns_missing.push(column.name.to_string()),
                Some((_, data_type))
                    if !column.data_types.is_empty()
                        && !column.data_types.contains(&data_type.as_str()) =>
                {
                    columns_mistyped.push(format!(
                        "{} is {}, expected {}",
                        column.name,
                        data_type,
                        column.data_types.join(" or ")
                    ));
                }
                Some(_) => {}
            }
        }

        Self {
            table: table.to_string(),
            exists: !found.is_empty(),
            columns_found: found.into_iter().map(|(name, _)| name).collect(),
            columns_missing,
            columns_mistyped,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.exists && self.columns_missing.is_empty() && self.columns_mistyped.is_empty()
    }

    fn problems(&self) -> Vec<String> {
        if !self.exists {
            return vec![format!("{} does not exist", self.table)];
        }
        let mut problems = Vec::new();
        if !self.columns_missing.is_empty() {
            problems.push(format!("{} lacks {}", self.table, self.columns_missing.join(", ")));
        }
        problems.extend(self.columns_mistyped.iter().map(|m| format!("{}.{}", self.table, m)));
        problems
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SchemaReport {
    pub tables: Vec<TableReport>,
}

impl SchemaReport {
    pub fn log(&self) {
        for table in &self.tables {
            if table.is_complete() {
                logging::info(
                    Source::Database,
                    Some(table.table.as_str()),
                    &format!("table ok ({} columns)", table.columns_found.len()),
                );
            } else {
                for problem in table.problems() {
                    logging::error(Source::Database, Some(table.table.as_str()), &problem);
                }
            }
        }
    }

    /// Fails with a [`StoreError::Schema`] naming every missing table,
    /// missing column and wrongly typed column.
    pub fn ensure_complete(&self) -> Result<(), StoreError> {
        let problems: Vec<String> = self.tables.iter().flat_map(TableReport::problems).collect();

        if problems.is_empty() {
            Ok(())
        } else {
            Err(StoreError::Schema(problems.join("; ")))
        }
    }
}

// ============================================================================
// Introspection
// ============================================================================

/// Reads the column names and types of every table in [`REQUIRED_COLUMNS`].
pub fn inspect(client: &mut Client) -> Result<SchemaReport, StoreError> {
    let mut tables = Vec::with_capacity(REQUIRED_COLUMNS.len());

    for (table, required) in REQUIRED_COLUMNS {
        let rows = client.query(
            "SELECT column_name::TEXT, data_type::TEXT
             FROM information_schema.columns
             WHERE table_schema = current_schema()
               AND table_name::TEXT = $1
             ORDER BY ordinal_position",
            &[table],
        )?;
        let found = rows
            .iter()
            .map(|row| -> Result<(String, String), postgres::Error> {
                Ok((row.try_get(0)?, row.try_get(1)?))
            })
            .collect::<Result<Vec<_>, _>>()?;
        tables.push(TableReport::compare(table, required, found));
    }

    Ok(SchemaReport { tables })
}
