//! Ledger of notifications the daily job has already sent.
//!
//! One row per (kind, subject, period). Reminders use the event id and the
//! send day as period; birthdays use the member id and the year.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use flock_core::error::FlockResult;

use crate::sql::{collect_rows, sql_error};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentNotification {
    pub id: Option<i64>,
    pub kind: String,
    pub subject_id: i64,
    pub period_key: String,
    pub attempted: u32,
    pub delivered: u32,
    pub sent_at: DateTime<Utc>,
}

impl SentNotification {
    pub fn new(kind: &str, subject_id: i64, period_key: impl Into<String>) -> Self {
        Self {
            id: None,
            kind: kind.to_string(),
            subject_id,
            period_key: period_key.into(),
            attempted: 0,
            delivered: 0,
            sent_at: Utc::now(),
        }
    }

    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            kind: row.get("kind")?,
            subject_id: row.get("subject_id")?,
            period_key: row.get("period_key")?,
            attempted: row.get("attempted")?,
            delivered: row.get("delivered")?,
            sent_at: row.get("sent_at")?,
        })
    }

    /// Whether this (kind, subject, period) has already been sent.
    pub fn exists(conn: &Connection, kind: &str, subject_id: i64, period_key: &str) -> FlockResult<bool> {
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sent_notifications
                 WHERE kind = ?1 AND subject_id = ?2 AND period_key = ?3",
                params![kind, subject_id, period_key],
                |row| row.get(0),
            )
            .map_err(|e| sql_error("check notification ledger", e))?;
        Ok(count > 0)
    }

    /// Record this notification. Recording the same key twice fails with
    /// `ConstraintViolation`.
    pub fn record(&mut self, conn: &Connection) -> FlockResult<i64> {
        conn.execute(
            "INSERT INTO sent_notifications (kind, subject_id, period_key, attempted, delivered, sent_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                self.kind,
                self.subject_id,
                self.period_key,
                self.attempted,
                self.delivered,
                self.sent_at,
            ],
        )
        .map_err(|e| sql_error("record notification", e))?;

        let id = conn.last_insert_rowid();
        self.id = Some(id);
        Ok(id)
    }

    /// Most recent ledger rows, newest first.
    pub fn load_recent(conn: &Connection, limit: u32) -> FlockResult<Vec<Self>> {
        let mut stmt = conn
            .prepare("SELECT * FROM sent_notifications ORDER BY id DESC LIMIT ?1")
            .map_err(|e| sql_error("load notification ledger", e))?;
        let rows = stmt
            .query_map([limit], Self::from_row)
            .map_err(|e| sql_error("load notification ledger", e))?;
        collect_rows("load notification ledger", rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema;

    #[test]
    fn test_record_and_exists() {
        let conn = Connection::open_in_memory().unwrap();
        schema::create_tables(&conn).unwrap();

        assert!(!SentNotification::exists(&conn, "reminder", 1, "2025-01-05").unwrap());

        let mut entry = SentNotification::new("reminder", 1, "2025-01-05");
        entry.attempted = 3;
        entry.delivered = 2;
        entry.record(&conn).unwrap();

        assert!(SentNotification::exists(&conn, "reminder", 1, "2025-01-05").unwrap());
        assert!(!SentNotification::exists(&conn, "birthday", 1, "2025-01-05").unwrap());

        let recent = SentNotification::load_recent(&conn, 10).unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].delivered, 2);
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let conn = Connection::open_in_memory().unwrap();
        schema::create_tables(&conn).unwrap();
        SentNotification::new("birthday", 4, "2025").record(&conn).unwrap();
        let err = SentNotification::new("birthday", 4, "2025").record(&conn).unwrap_err();
        assert!(err.is_constraint_violation());
    }
}
