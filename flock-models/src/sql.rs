//! Translation of rusqlite failures into the Flock error taxonomy.
//!
//! Every model and query funnels its rusqlite errors through `sql_error`, so
//! no raw driver error escapes the crate and every fault is logged once at
//! the point it is classified.

use rusqlite::ErrorCode;
use tracing::{error, warn};

use flock_core::error::{FlockError, FlockResult};

/// Classify a rusqlite error, log it, and wrap it with `context`.
///
/// SQLite constraint failures (UNIQUE, FOREIGN KEY, CHECK, NOT NULL) become
/// `ConstraintViolation`; everything else is a `Storage` fault.
pub fn sql_error(context: &str, e: rusqlite::Error) -> FlockError {
    match &e {
        rusqlite::Error::SqliteFailure(err, detail) if err.code == ErrorCode::ConstraintViolation => {
            let detail = detail.clone().unwrap_or_else(|| err.to_string());
            warn!("{context}: {detail}");
            FlockError::ConstraintViolation(format!("{context}: {detail}"))
        }
        _ => {
            error!("{context}: {e}");
            FlockError::Storage(format!("{context}: {e}"))
        }
    }
}

/// Turn a single-row query result into `Option`, treating "no rows" as absence.
pub fn optional_row<T>(context: &str, result: rusqlite::Result<T>) -> FlockResult<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(sql_error(context, e)),
    }
}

/// Collect a mapped row iterator, failing on the first bad row.
///
/// A row that fails to decode is a storage fault, not something to skip.
pub fn collect_rows<T, I>(context: &str, rows: I) -> FlockResult<Vec<T>>
where
    I: Iterator<Item = rusqlite::Result<T>>,
{
    rows.map(|r| r.map_err(|e| sql_error(context, e))).collect()
}
