//! Application-wide constants.

/// Application name, also used for the platform data directory.
pub const APP_NAME: &str = "Flock";

/// Application version.
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Database schema version.
pub const DB_SCHEMA_VERSION: i32 = 1;

/// Default database file name inside the data directory.
pub const DB_FILE_NAME: &str = "church.db";

/// Days between a reminder being sent and the event taking place.
pub const DEFAULT_REMINDER_LEAD_DAYS: u32 = 5;

/// Wall-clock time the daily job runs at.
pub const DEFAULT_SEND_TIME: &str = "08:00";

/// Date format used for every date column and CLI argument.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Member import format.
pub mod import {
    /// Field separator.
    pub const DELIMITER: char = '|';

    /// Number of fields on every data line.
    pub const FIELD_COUNT: usize = 11;

    /// Column order of a data line.
    pub const COLUMNS: [&str; FIELD_COUNT] = [
        "first_name",
        "last_name",
        "email",
        "phone_number",
        "marital_status",
        "children",
        "household_size",
        "occupation",
        "education_level",
        "involvement",
        "disabilities",
    ];
}

/// Notification ledger kinds.
pub mod notification_kind {
    pub const REMINDER: &str = "reminder";
    pub const BIRTHDAY: &str = "birthday";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_import_columns_match_field_count() {
        assert_eq!(import::COLUMNS.len(), import::FIELD_COUNT);
        assert_eq!(import::COLUMNS[0], "first_name");
        assert_eq!(import::COLUMNS[10], "disabilities");
    }

    #[test]
    fn test_default_send_time_parses() {
        assert!(chrono::NaiveTime::parse_from_str(DEFAULT_SEND_TIME, "%H:%M").is_ok());
    }
}
