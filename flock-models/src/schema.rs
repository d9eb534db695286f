//! Database schema definitions and table creation.
//!
//! Table and column names follow the church database the desktop app has
//! always written (`church.db`), so an existing file opens in place.
//! Deletion policy is declared in the foreign keys: removing a member
//! cascades to its demographics and volunteering rows, removing a volunteer
//! opportunity is restricted while members are assigned to it.

use rusqlite::Connection;
use flock_core::error::{FlockError, FlockResult};
use tracing::info;

/// Every table, in creation order.
pub const TABLES: [&str; 7] = [
    "schema_version",
    "events",
    "members",
    "demographics",
    "volunteer_opportunities",
    "member_volunteering",
    "sent_notifications",
];

/// Create all database tables and indexes if they do not exist.
pub fn create_tables(conn: &Connection) -> FlockResult<()> {
    conn.execute_batch(SCHEMA_SQL)
        .map_err(|e| FlockError::Storage(format!("failed to create schema: {e}")))?;
    info!("database schema verified");
    Ok(())
}

/// Drop all tables (used for database reset).
pub fn drop_tables(conn: &Connection) -> FlockResult<()> {
    conn.execute_batch(
        "DROP TABLE IF EXISTS sent_notifications;
         DROP TABLE IF EXISTS member_volunteering;
         DROP TABLE IF EXISTS volunteer_opportunities;
         DROP TABLE IF EXISTS demographics;
         DROP TABLE IF EXISTS members;
         DROP TABLE IF EXISTS events;
         DROP TABLE IF EXISTS schema_version;",
    )
    .map_err(|e| FlockError::Storage(format!("failed to drop tables: {e}")))?;
    Ok(())
}

/// Complete SQL schema for all tables.
const SCHEMA_SQL: &str = r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER NOT NULL
);

-- Church events
CREATE TABLE IF NOT EXISTS events (
    id                              INTEGER PRIMARY KEY AUTOINCREMENT,
    name                            TEXT NOT NULL,
    event_date                      TEXT NOT NULL,
    start_time                      TEXT NOT NULL,
    end_time                        TEXT NOT NULL,
    location                        TEXT NOT NULL,
    description                     TEXT
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_events_name_date ON events(name, event_date);
CREATE INDEX IF NOT EXISTS idx_events_date ON events(event_date);

-- Members
CREATE TABLE IF NOT EXISTS members (
    id                              INTEGER PRIMARY KEY AUTOINCREMENT,
    first_name                      TEXT NOT NULL,
    last_name                       TEXT NOT NULL,
    date_of_birth                   TEXT,
    gender                          TEXT,
    phone_number                    TEXT,
    email                           TEXT UNIQUE,
    address                         TEXT,
    join_date                       TEXT,
    membership_status               TEXT
);

CREATE INDEX IF NOT EXISTS idx_members_name ON members(first_name, last_name);
CREATE INDEX IF NOT EXISTS idx_members_email ON members(email);

-- Demographics (1:1 extension of members)
CREATE TABLE IF NOT EXISTS demographics (
    id                              INTEGER PRIMARY KEY AUTOINCREMENT,
    member_id                       INTEGER NOT NULL UNIQUE REFERENCES members(id) ON DELETE CASCADE,
    marital_status                  TEXT,
    children                        INTEGER NOT NULL DEFAULT 0 CHECK (children >= 0),
    family_at_home                  INTEGER NOT NULL DEFAULT 0 CHECK (family_at_home >= 0),
    occupation                      TEXT,
    education_level                 TEXT,
    attendance                      TEXT,
    involvement                     TEXT,
    disabilities                    TEXT
);

CREATE INDEX IF NOT EXISTS idx_demographics_marital ON demographics(marital_status);
CREATE INDEX IF NOT EXISTS idx_demographics_education ON demographics(education_level);
CREATE INDEX IF NOT EXISTS idx_demographics_involvement ON demographics(involvement);

-- Volunteer opportunities
CREATE TABLE IF NOT EXISTS volunteer_opportunities (
    id                              INTEGER PRIMARY KEY AUTOINCREMENT,
    name                            TEXT NOT NULL,
    description                     TEXT,
    date_posted                     TEXT NOT NULL,
    location                        TEXT
);

-- Member <-> opportunity assignments
CREATE TABLE IF NOT EXISTS member_volunteering (
    member_id                       INTEGER NOT NULL REFERENCES members(id) ON DELETE CASCADE,
    opportunity_id                  INTEGER NOT NULL REFERENCES volunteer_opportunities(id) ON DELETE RESTRICT,
    date_volunteered                TEXT NOT NULL,
    PRIMARY KEY (member_id, opportunity_id)
);

CREATE INDEX IF NOT EXISTS idx_mv_opportunity ON member_volunteering(opportunity_id);

-- Ledger of notifications already sent by the daily job
CREATE TABLE IF NOT EXISTS sent_notifications (
    id                              INTEGER PRIMARY KEY AUTOINCREMENT,
    kind                            TEXT NOT NULL,
    subject_id                      INTEGER NOT NULL,
    period_key                      TEXT NOT NULL,
    attempted                       INTEGER NOT NULL DEFAULT 0,
    delivered                       INTEGER NOT NULL DEFAULT 0,
    sent_at                         TEXT NOT NULL,
    UNIQUE (kind, subject_id, period_key)
);
"#;
