//! Event service for the church calendar.

use chrono::NaiveDate;
use tracing::info;

use flock_core::error::{FlockError, FlockResult};
use flock_models::queries::{self, Rows};
use flock_models::{Database, Event, EventPatch};

use crate::service::{Service, ServiceState};

/// Service for adding, editing, and finding events.
pub struct EventService {
    state: ServiceState,
    database: Database,
}

impl EventService {
    /// Create a new EventService.
    pub fn new(database: Database) -> Self {
        Self {
            state: ServiceState::Created,
            database,
        }
    }

    /// Add an event. An event with the same name on the same date fails
    /// with `ConstraintViolation`.
    pub fn add_event(&self, mut event: Event) -> FlockResult<Event> {
        let event = self.database.transaction(move |conn| {
            if Event::find_by_name_and_date(conn, &event.name, event.date)?.is_some() {
                return Err(FlockError::ConstraintViolation(format!(
                    "event '{}' on {} already exists",
                    event.name.trim(),
                    event.date
                )));
            }
            event.insert(conn)?;
            Ok(event)
        })?;
        info!("added event '{}' on {}", event.name, event.date);
        Ok(event)
    }

    /// Apply a partial edit to an event.
    pub fn edit_event(&self, id: i64, patch: &EventPatch) -> FlockResult<Event> {
        self.database.transaction(|conn| {
            Event::update(conn, id, patch)?;
            Event::find_by_id(conn, id)?.ok_or_else(|| FlockError::NotFound(format!("event {id}")))
        })
    }

    /// Remove an event.
    pub fn remove_event(&self, id: i64) -> FlockResult<()> {
        self.database.transaction(|conn| Event::delete(conn, id))?;
        info!("removed event {id}");
        Ok(())
    }

    pub fn get_event(&self, id: i64) -> FlockResult<Option<Event>> {
        let conn = self.database.conn()?;
        Event::find_by_id(&conn, id)
    }

    /// The event with this name on this date, if any. Used to confirm
    /// before editing or removing.
    pub fn find_by_name_and_date(&self, name: &str, date: NaiveDate) -> FlockResult<Option<Event>> {
        let conn = self.database.conn()?;
        Event::find_by_name_and_date(&conn, name, date)
    }

    pub fn list_events(&self) -> FlockResult<Rows<Event>> {
        let conn = self.database.conn()?;
        queries::all_events(&conn)
    }

    /// Events with this name; `NotFound` if there are none.
    pub fn events_named(&self, name: &str) -> FlockResult<Rows<Event>> {
        let conn = self.database.conn()?;
        queries::event_by_name(&conn, name)
    }

    /// Events on this date; `NotFound` if there are none.
    pub fn events_on(&self, date: NaiveDate) -> FlockResult<Rows<Event>> {
        let conn = self.database.conn()?;
        queries::event_by_date(&conn, date)
    }
}

impl Service for EventService {
    fn name(&self) -> &str {
        "events"
    }

    fn state(&self) -> ServiceState {
        self.state
    }

    fn init(&mut self) -> FlockResult<()> {
        self.state = ServiceState::Initializing;
        let count = {
            let conn = self.database.conn()?;
            queries::count_events(&conn)?
        };
        self.state = ServiceState::Running;
        info!("event service initialized ({count} events)");
        Ok(())
    }

    fn shutdown(&mut self) -> FlockResult<()> {
        self.state = ServiceState::Stopped;
        info!("event service stopped");
        Ok(())
    }
}
