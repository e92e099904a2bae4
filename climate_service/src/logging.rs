/// Structured logging for the climate observation service
///
/// Records go through the `log` facade with the subsystem as target, so
/// `RUST_LOG=DB=debug` narrows output to database activity. A context
/// (route, table) is folded into the target, and `env_logger` renders each
/// record as `timestamp LEVEL SOURCE[context]: message` to the console or an
/// append-only file.

use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;

use chrono::Utc;
use log::{Level, LevelFilter};
use postgres::error::SqlState;

use crate::model::StoreError;

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Database,
    Http,
    System,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Database => "DB",
            Source::Http => "HTTP",
            Source::System => "SYS",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Failure Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureType {
    /// Expected failure - database is restarting or refusing connections for maintenance
    Expected,
    /// Unexpected failure - connectivity loss, broken schema, or query bug
    Unexpected,
    /// Unknown - the data itself looks wrong
    Unknown,
}

impl fmt::Display for FailureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureType::Expected => write!(f, "EXPECTED"),
            FailureType::Unexpected => write!(f, "UNEXPECTED"),
            FailureType::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

// ---------------------------------------------------------------------------
// Initialisation
// ---------------------------------------------------------------------------

/// Builds the logger without installing it.
///
/// `RUST_LOG`, when set, overrides `min_level`. With a `log_file`, records
/// are appended there instead of stderr.
pub fn build_logger(
    min_level: LevelFilter,
    log_file: Option<&str>,
    timestamps: bool,
) -> std::io::Result<env_logger::Logger> {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(min_level).parse_default_env();

    builder.format(move |buf, record| {
        if timestamps {
            write!(buf, "{} ", Utc::now().format("%Y-%m-%d %H:%M:%S UTC"))?;
        }
        writeln!(buf, "{:<5} {}: {}", record.level(), record.target(), record.args())
    });

    if let Some(path) = log_file {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }

    Ok(builder.build())
}

/// Installs the global logger. Calling this more than once keeps the first
/// logger.
pub fn init_logger(
    min_level: LevelFilter,
    log_file: Option<&str>,
    timestamps: bool,
) -> std::io::Result<()> {
    let logger = build_logger(min_level, log_file, timestamps)?;
    let max_level = logger.filter();

    // Already initialised (tests, repeated startup): keep the existing logger.
    if log::set_boxed_logger(Box::new(logger)).is_ok() {
        log::set_max_level(max_level);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Public Logging Functions
// ---------------------------------------------------------------------------

/// `SOURCE[context]`, or just `SOURCE`. Prefix filters on the source still
/// match.
fn log_target(source: Source, context: Option<&str>) -> String {
    match context {
        Some(ctx) => format!("{}[{}]", source, ctx),
        None => source.as_str().to_string(),
    }
}

fn emit(level: Level, source: Source, context: Option<&str>, message: &str) {
    log::log!(target: &log_target(source, context), level, "{}", message);
}

/// Log a general informational message
pub fn info(source: Source, context: Option<&str>, message: &str) {
    emit(Level::Info, source, context, message);
}

/// Log a warning message
pub fn warn(source: Source, context: Option<&str>, message: &str) {
    emit(Level::Warn, source, context, message);
}

/// Log an error message
pub fn error(source: Source, context: Option<&str>, message: &str) {
    emit(Level::Error, source, context, message);
}

/// Log a debug message
pub fn debug(source: Source, context: Option<&str>, message: &str) {
    emit(Level::Debug, source, context, message);
}

// ---------------------------------------------------------------------------
// Store Failure Logging
// ---------------------------------------------------------------------------

/// Classify a store failure by what it says about the database
pub fn classify_store_failure(err: &StoreError) -> FailureType {
    match err {
        StoreError::Database(db_err) => match db_err.code() {
            Some(code)
                if *code == SqlState::ADMIN_SHUTDOWN
                    || *code == SqlState::CANNOT_CONNECT_NOW =>
            {
                FailureType::Expected
            }
            _ => FailureType::Unexpected,
        },
        StoreError::Schema(_) => FailureType::Unexpected,
        StoreError::MalformedDate(_) => FailureType::Unknown,
    }
}

/// Log a failed store operation once, at the level its classification calls for
pub fn log_store_failure(operation: &str, err: &StoreError) {
    let failure_type = classify_store_failure(err);
    let message = format!("{} failed [{}]: {}", operation, failure_type, err);

    match failure_type {
        FailureType::Expected => warn(Source::Database, None, &message),
        FailureType::Unexpected => error(Source::Database, None, &message),
        FailureType::Unknown => warn(Source::Database, None, &message),
    }
}
