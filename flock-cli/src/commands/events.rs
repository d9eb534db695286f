//! Event commands - add, edit, list, look up, and remove calendar events.

use chrono::{NaiveDate, NaiveTime};
use clap::Subcommand;
use console::style;

use flock_core::config::ConfigHandle;
use flock_core::error::{FlockError, FlockResult};
use flock_models::{Event, EventPatch};
use flock_services::EventService;

use super::{format_date, new_table, or_dash, parse_date, parse_time, print_json, truncate};
use crate::OutputFormat;

#[derive(Subcommand)]
pub enum EventsAction {
    /// List all events.
    List,
    /// Events on a date (YYYY-MM-DD).
    On {
        #[arg(value_parser = parse_date)]
        date: NaiveDate,
    },
    /// Events with a name.
    Named {
        name: String,
    },
    /// Add an event. Name and date together must be unique.
    Add {
        name: String,
        #[arg(value_parser = parse_date)]
        date: NaiveDate,
        /// Start time (HH:MM).
        #[arg(long, value_parser = parse_time)]
        start: NaiveTime,
        /// End time (HH:MM).
        #[arg(long, value_parser = parse_time)]
        end: NaiveTime,
        #[arg(long)]
        location: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// Edit the event with this name and date. Only the given fields change.
    Edit {
        name: String,
        #[arg(value_parser = parse_date)]
        date: NaiveDate,
        #[arg(long)]
        new_name: Option<String>,
        #[arg(long, value_parser = parse_date)]
        new_date: Option<NaiveDate>,
        #[arg(long, value_parser = parse_time)]
        start: Option<NaiveTime>,
        #[arg(long, value_parser = parse_time)]
        end: Option<NaiveTime>,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Remove the event with this name and date.
    Remove {
        name: String,
        #[arg(value_parser = parse_date)]
        date: NaiveDate,
        /// Skip the confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },
}

pub async fn run(config: ConfigHandle, action: EventsAction, format: OutputFormat) -> FlockResult<()> {
    let db = super::init_database(&config).await?;
    let events = EventService::new(db);

    match action {
        EventsAction::List => {
            let rows = events.list_events()?;
            match format {
                OutputFormat::Json => print_json(&rows)?,
                OutputFormat::Text => {
                    if rows.is_empty() {
                        println!("No events.");
                    } else {
                        print_events(rows.iter());
                        println!("\n{} event(s).", rows.count());
                    }
                }
            }
        }
        EventsAction::On { date } => {
            let rows = events.events_on(date)?;
            match format {
                OutputFormat::Json => print_json(&rows)?,
                OutputFormat::Text => print_events(rows.iter()),
            }
        }
        EventsAction::Named { name } => {
            let rows = events.events_named(&name)?;
            match format {
                OutputFormat::Json => print_json(&rows)?,
                OutputFormat::Text => print_events(rows.iter()),
            }
        }
        EventsAction::Add {
            name,
            date,
            start,
            end,
            location,
            description,
        } => {
            let created = events.add_event(Event {
                id: None,
                name,
                date,
                start_time: start,
                end_time: end,
                location,
                description,
            })?;
            match format {
                OutputFormat::Json => print_json(&created)?,
                OutputFormat::Text => println!(
                    "  {} Added {} on {}.",
                    style("OK").green().bold(),
                    style(&created.name).bold(),
                    format_date(created.date)
                ),
            }
        }
        EventsAction::Edit {
            name,
            date,
            new_name,
            new_date,
            start,
            end,
            location,
            description,
        } => {
            let event = find(&events, &name, date)?;
            let patch = EventPatch {
                name: new_name,
                date: new_date,
                start_time: start,
                end_time: end,
                location,
                description,
            };
            let id = event.id.ok_or_else(|| FlockError::Internal("stored event without id".into()))?;
            let updated = events.edit_event(id, &patch)?;
            match format {
                OutputFormat::Json => print_json(&updated)?,
                OutputFormat::Text => println!(
                    "  {} Updated {} on {}.",
                    style("OK").green().bold(),
                    style(&updated.name).bold(),
                    format_date(updated.date)
                ),
            }
        }
        EventsAction::Remove { name, date, yes } => {
            let event = find(&events, &name, date)?;
            let prompt = format!("  Remove '{}' on {}?", event.name, format_date(event.date));
            if !super::confirm(&prompt, yes) {
                println!("  Removal cancelled.");
                return Ok(());
            }
            let id = event.id.ok_or_else(|| FlockError::Internal("stored event without id".into()))?;
            events.remove_event(id)?;
            println!("  {} Removed '{}'.", style("OK").green().bold(), event.name);
        }
    }

    Ok(())
}

fn find(events: &EventService, name: &str, date: NaiveDate) -> FlockResult<Event> {
    events
        .find_by_name_and_date(name, date)?
        .ok_or_else(|| FlockError::NotFound(format!("event '{name}' on {}", format_date(date))))
}

fn print_events<'a>(events: impl Iterator<Item = &'a Event>) {
    let mut table = new_table(["ID", "Name", "Date", "Time", "Location", "Description"]);
    for e in events {
        table.add_row(vec![
            or_dash(e.id),
            e.name.clone(),
            format_date(e.date),
            format!("{}-{}", e.start_time.format("%H:%M"), e.end_time.format("%H:%M")),
            e.location.clone(),
            truncate(e.description.as_deref().unwrap_or("-"), 40),
        ]);
    }
    println!("{table}");
}
