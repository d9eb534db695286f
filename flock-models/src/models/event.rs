//! Church event entity model.

use chrono::{NaiveDate, NaiveTime};
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};
use tracing::debug;

use flock_core::error::{FlockError, FlockResult};

use super::non_blank;
use crate::sql::{collect_rows, optional_row, sql_error};

/// A scheduled church event. Unique on (name, date).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: Option<i64>,
    pub name: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub location: String,
    pub description: Option<String>,
}

/// Event fields to change. `None` keeps the stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventPatch {
    pub name: Option<String>,
    pub date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub location: Option<String>,
    pub description: Option<String>,
}

impl Event {
    /// Construct an Event from a database row.
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            date: row.get("event_date")?,
            start_time: row.get("start_time")?,
            end_time: row.get("end_time")?,
            location: row.get("location")?,
            description: row.get("description")?,
        })
    }

    /// Insert this event, assigning its id.
    ///
    /// An event with the same name on the same date fails with `ConstraintViolation`.
    pub fn insert(&mut self, conn: &Connection) -> FlockResult<i64> {
        self.name = self.name.trim().to_string();
        if self.name.is_empty() {
            return Err(FlockError::Validation("event name is required".into()));
        }
        self.description = non_blank(self.description.as_deref()).map(String::from);

        conn.execute(
            "INSERT INTO events (name, event_date, start_time, end_time, location, description)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                self.name,
                self.date,
                self.start_time,
                self.end_time,
                self.location.trim(),
                self.description,
            ],
        )
        .map_err(|e| sql_error("insert event", e))?;

        let id = conn.last_insert_rowid();
        self.id = Some(id);
        debug!("inserted event {id} '{}' on {}", self.name, self.date);
        Ok(id)
    }

    /// Apply a partial update. Fails with `NotFound` if the event is gone.
    pub fn update(conn: &Connection, id: i64, patch: &EventPatch) -> FlockResult<()> {
        let changed = conn
            .execute(
                "UPDATE events SET
                    name = COALESCE(?2, name),
                    event_date = COALESCE(?3, event_date),
                    start_time = COALESCE(?4, start_time),
                    end_time = COALESCE(?5, end_time),
                    location = COALESCE(?6, location),
                    description = COALESCE(?7, description)
                 WHERE id = ?1",
                params![
                    id,
                    non_blank(patch.name.as_deref()),
                    patch.date,
                    patch.start_time,
                    patch.end_time,
                    non_blank(patch.location.as_deref()),
                    non_blank(patch.description.as_deref()),
                ],
            )
            .map_err(|e| sql_error("update event", e))?;

        if changed == 0 {
            return Err(FlockError::NotFound(format!("event {id}")));
        }
        Ok(())
    }

    /// Delete an event.
    pub fn delete(conn: &Connection, id: i64) -> FlockResult<()> {
        let changed = conn
            .execute("DELETE FROM events WHERE id = ?1", [id])
            .map_err(|e| sql_error("delete event", e))?;
        if changed == 0 {
            return Err(FlockError::NotFound(format!("event {id}")));
        }
        debug!("deleted event {id}");
        Ok(())
    }

    /// Find an event by id.
    pub fn find_by_id(conn: &Connection, id: i64) -> FlockResult<Option<Self>> {
        optional_row(
            "find event by id",
            conn.query_row("SELECT * FROM events WHERE id = ?1", [id], Self::from_row),
        )
    }

    /// Find the event with this name on this date.
    pub fn find_by_name_and_date(
        conn: &Connection,
        name: &str,
        date: NaiveDate,
    ) -> FlockResult<Option<Self>> {
        optional_row(
            "find event by name and date",
            conn.query_row(
                "SELECT * FROM events WHERE name = ?1 AND event_date = ?2",
                params![name.trim(), date],
                Self::from_row,
            ),
        )
    }

    /// All events with this exact name, oldest first.
    pub fn find_by_name(conn: &Connection, name: &str) -> FlockResult<Vec<Self>> {
        Self::select(conn, "WHERE name = ?1", params![name.trim()], "find events by name")
    }

    /// All events on a date.
    pub fn find_by_date(conn: &Connection, date: NaiveDate) -> FlockResult<Vec<Self>> {
        Self::select(conn, "WHERE event_date = ?1", params![date], "find events by date")
    }

    /// Load every event in id order.
    pub fn load_all(conn: &Connection) -> FlockResult<Vec<Self>> {
        Self::select(conn, "", params![], "load events")
    }

    fn select(
        conn: &Connection,
        filter: &str,
        params: &[&dyn rusqlite::ToSql],
        context: &str,
    ) -> FlockResult<Vec<Self>> {
        let sql = format!("SELECT * FROM events {filter} ORDER BY id");
        let mut stmt = conn.prepare(&sql).map_err(|e| sql_error(context, e))?;
        let rows = stmt
            .query_map(params, Self::from_row)
            .map_err(|e| sql_error(context, e))?;
        collect_rows(context, rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema;

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        schema::create_tables(&conn).unwrap();
        conn
    }

    fn youth_day() -> Event {
        Event {
            id: None,
            name: "Youth Day".into(),
            date: NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
            start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(12, 30, 0).unwrap(),
            location: "Main Hall".into(),
            description: Some("Youth service and lunch".into()),
        }
    }

    #[test]
    fn test_insert_and_find() {
        let conn = conn();
        let mut event = youth_day();
        let id = event.insert(&conn).unwrap();

        assert_eq!(Event::find_by_id(&conn, id).unwrap().unwrap(), event);
        assert_eq!(Event::find_by_date(&conn, event.date).unwrap().len(), 1);
        assert_eq!(Event::find_by_name(&conn, "Youth Day").unwrap().len(), 1);
    }

    #[test]
    fn test_duplicate_name_and_date_rejected() {
        let conn = conn();
        youth_day().insert(&conn).unwrap();
        let err = youth_day().insert(&conn).unwrap_err();
        assert!(err.is_constraint_violation());

        let mut next_week = youth_day();
        next_week.date = NaiveDate::from_ymd_opt(2025, 1, 17).unwrap();
        next_week.insert(&conn).unwrap();
    }

    #[test]
    fn test_partial_update() {
        let conn = conn();
        let id = youth_day().insert(&conn).unwrap();
        let patch = EventPatch {
            location: Some("Chapel".into()),
            ..Default::default()
        };
        Event::update(&conn, id, &patch).unwrap();

        let loaded = Event::find_by_id(&conn, id).unwrap().unwrap();
        assert_eq!(loaded.location, "Chapel");
        assert_eq!(loaded.name, "Youth Day");
    }

    #[test]
    fn test_delete() {
        let conn = conn();
        let id = youth_day().insert(&conn).unwrap();
        Event::delete(&conn, id).unwrap();
        assert!(Event::find_by_id(&conn, id).unwrap().is_none());
        assert!(Event::delete(&conn, id).unwrap_err().is_not_found());
    }
}
