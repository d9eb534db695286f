//! CLI command implementations.

pub mod members;
pub mod events;
pub mod volunteers;
pub mod reports;
pub mod notify;
pub mod db;

use chrono::{NaiveDate, NaiveTime};
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, ContentArrangement, Table};
use dialoguer::Confirm;
use serde::Serialize;

use flock_core::config::ConfigHandle;
use flock_core::error::FlockResult;
use flock_models::Database;

/// Helper to initialize the database from config.
pub async fn init_database(config: &ConfigHandle) -> FlockResult<Database> {
    let config = config.read().await;
    let db_path = config.effective_db_path()?;
    Database::init(&db_path, &config.database)
}

/// A table with the CLI's standard look.
pub fn new_table<I, S>(header: I) -> Table
where
    I: IntoIterator<Item = S>,
    S: Into<comfy_table::Cell>,
{
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

/// Print a value as pretty JSON.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> FlockResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Ask before a destructive action. `--yes` skips the prompt.
pub fn confirm(prompt: &str, assume_yes: bool) -> bool {
    if assume_yes {
        return true;
    }
    Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .unwrap_or(false)
}

/// Render an optional value, `-` when absent.
pub fn or_dash<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(flock_core::constants::DATE_FORMAT).to_string()
}

/// Parse "HH:MM" (seconds optional) for clap.
pub fn parse_time(s: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .map_err(|e| format!("'{s}' is not a time (HH:MM): {e}"))
}

/// Parse "YYYY-MM-DD" for clap.
pub fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, flock_core::constants::DATE_FORMAT)
        .map_err(|e| format!("'{s}' is not a date (YYYY-MM-DD): {e}"))
}

/// Truncate a string to a maximum length, appending an ellipsis if truncated.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len > 3 {
        let kept: String = s.chars().take(max_len - 3).collect();
        format!("{kept}...")
    } else {
        s.chars().take(max_len).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_time() {
        assert_eq!(parse_time("09:30").unwrap(), NaiveTime::from_hms_opt(9, 30, 0).unwrap());
        assert_eq!(parse_time("18:00:15").unwrap(), NaiveTime::from_hms_opt(18, 0, 15).unwrap());
        assert!(parse_time("half nine").is_err());
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("2025-01-10").unwrap(), NaiveDate::from_ymd_opt(2025, 1, 10).unwrap());
        assert!(parse_date("10/01/2025").is_err());
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Youth Day", 20), "Youth Day");
        assert_eq!(truncate("Annual General Meeting", 10), "Annual ...");
    }

    #[test]
    fn test_or_dash() {
        assert_eq!(or_dash(None::<i64>), "-");
        assert_eq!(or_dash(Some(3)), "3");
    }
}
