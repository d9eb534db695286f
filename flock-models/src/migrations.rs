//! Versioned database migrations.
//!
//! Migrations run sequentially from the current stored version to the latest.
//! Each migration is an idempotent SQL script.

use rusqlite::Connection;
use tracing::{info, warn};
use flock_core::constants::DB_SCHEMA_VERSION;
use flock_core::error::{FlockError, FlockResult};

use crate::sql::sql_error;

/// Run all pending migrations on the database.
pub fn run_migrations(conn: &Connection) -> FlockResult<()> {
    let current_version = schema_version(conn)?;

    if current_version >= DB_SCHEMA_VERSION {
        info!("database schema is up to date (version {current_version})");
        return Ok(());
    }

    info!("running migrations from version {current_version} to {DB_SCHEMA_VERSION}");

    for version in (current_version + 1)..=DB_SCHEMA_VERSION {
        run_migration(conn, version)?;
    }

    set_schema_version(conn, DB_SCHEMA_VERSION)?;
    info!("migrations complete, schema at version {DB_SCHEMA_VERSION}");
    Ok(())
}

/// Get the current schema version from the database.
pub fn schema_version(conn: &Connection) -> FlockResult<i32> {
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM schema_version", [], |row| row.get(0))
        .map_err(|e| sql_error("read schema version", e))?;

    if count == 0 {
        conn.execute("INSERT INTO schema_version (version) VALUES (0)", [])
            .map_err(|e| sql_error("seed schema version", e))?;
        return Ok(0);
    }

    conn.query_row("SELECT version FROM schema_version LIMIT 1", [], |row| row.get(0))
        .map_err(|e| sql_error("read schema version", e))
}

fn set_schema_version(conn: &Connection, version: i32) -> FlockResult<()> {
    conn.execute("UPDATE schema_version SET version = ?1", [version])
        .map_err(|e| sql_error("update schema version", e))?;
    Ok(())
}

fn run_migration(conn: &Connection, version: i32) -> FlockResult<()> {
    info!("applying migration version {version}");

    match version {
        1 => migration_v1(conn),
        _ => {
            warn!("unknown migration version {version}, skipping");
            Ok(())
        }
    }
}

/// Migration v1: tables are created by `schema::create_tables`. This step
/// rewrites enum spellings left by the older desktop app (enum member names
/// and mixed-case UI labels) to the canonical labels.
fn migration_v1(conn: &Connection) -> FlockResult<()> {
    let mut rewritten = 0usize;

    for (table, column, legacy, canonical) in LEGACY_LABELS {
        let sql = format!("UPDATE {table} SET {column} = ?1 WHERE {column} = ?2");
        rewritten += conn
            .execute(&sql, [canonical, legacy])
            .map_err(|e| FlockError::Migration(format!("normalize {table}.{column}: {e}")))?;
    }

    if rewritten > 0 {
        info!("normalized {rewritten} legacy enum labels");
    }

    Ok(())
}

/// (table, column, legacy spelling, canonical label)
const LEGACY_LABELS: &[(&str, &str, &str, &str)] = &[
    ("demographics", "marital_status", "Never_Married", "Never Married"),
    ("demographics", "marital_status", "Never-Married", "Never Married"),
    ("demographics", "education_level", "No_Matric", "Before Matric"),
    ("demographics", "education_level", "Before_Matric", "Before Matric"),
    ("demographics", "education_level", "High_School", "Passed Matric"),
    ("demographics", "education_level", "Passed_Matric", "Passed Matric"),
    ("demographics", "education_level", "Bachelors", "Bachelor's Degree"),
    ("demographics", "education_level", "Bachelors Degree", "Bachelor's Degree"),
    ("demographics", "education_level", "Post_Grad", "Post Grad"),
    ("demographics", "attendance", "Bi_weekly", "Bi-weekly"),
    ("demographics", "attendance", "Bi-Weekly", "Bi-weekly"),
];
