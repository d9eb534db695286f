//! Member import from pipe-delimited text.
//!
//! Import is two steps. [`parse_member_import`] turns text into records and
//! a list of skipped lines without touching the database. [`ImportService`]
//! then persists each record (member plus demographics) in its own
//! transaction.
//!
//! Format: one header line, then data lines of exactly eleven fields:
//!
//! ```text
//! first|last|email|phone|marital|children|household|occupation|education|involvement|disabilities
//! ```

use std::path::Path;
use std::str::FromStr;

use serde::Serialize;
use tracing::{debug, info, warn};

use flock_core::constants::import::{COLUMNS, DELIMITER, FIELD_COUNT};
use flock_core::error::{FlockError, FlockResult};
use flock_models::models::member::Member;
use flock_models::{Database, DemographicsPatch};

use crate::service::{Service, ServiceState};

/// One parsed data line.
#[derive(Debug, Clone)]
pub struct ImportRecord {
    /// 1-based line number in the source text.
    pub line: usize,
    pub member: Member,
    pub demographics: DemographicsPatch,
}

/// A line that was not imported, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedLine {
    pub line: usize,
    pub reason: String,
}

/// Output of the parse step.
#[derive(Debug, Clone, Default)]
pub struct ParsedImport {
    pub records: Vec<ImportRecord>,
    pub skipped: Vec<SkippedLine>,
}

/// Outcome of an import.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportReport {
    /// Ids of the members created.
    pub imported: Vec<i64>,
    /// Lines that could not be parsed.
    pub skipped: Vec<SkippedLine>,
    /// Parsed lines the database refused (duplicate email, ...).
    pub rejected: Vec<SkippedLine>,
}

/// Parse import text. Never fails: bad lines are collected as skipped.
pub fn parse_member_import(text: &str) -> ParsedImport {
    parse_lines(text.lines().map(Ok))
}

/// Parse raw import bytes, decoding each line on its own.
///
/// A line that is not valid UTF-8 is skipped; the rest still import.
pub fn parse_member_import_bytes(bytes: &[u8]) -> ParsedImport {
    let lines = bytes.split(|b| *b == b'\n').map(|raw| {
        let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
        std::str::from_utf8(raw)
            .map_err(|e| format!("line is not valid UTF-8 (invalid byte at column {})", e.valid_up_to() + 1))
    });
    parse_lines(lines)
}

fn parse_lines<'a, I>(lines: I) -> ParsedImport
where
    I: Iterator<Item = Result<&'a str, String>>,
{
    let mut parsed = ParsedImport::default();

    for (index, raw) in lines.enumerate().skip(1) {
        let line = index + 1;
        let parsed_line = match raw {
            Ok(raw) if raw.trim().is_empty() => continue,
            Ok(raw) => parse_line(raw, line),
            Err(reason) => Err(reason),
        };
        match parsed_line {
            Ok(record) => parsed.records.push(record),
            Err(reason) => {
                debug!("skipping import line {line}: {reason}");
                parsed.skipped.push(SkippedLine { line, reason });
            }
        }
    }

    parsed
}

fn parse_line(raw: &str, line: usize) -> Result<ImportRecord, String> {
    let fields: Vec<&str> = raw.trim().split(DELIMITER).map(str::trim).collect();
    if fields.len() != FIELD_COUNT {
        return Err(format!("expected {FIELD_COUNT} fields, found {}", fields.len()));
    }

    let (first_name, last_name) = (fields[0], fields[1]);
    if first_name.is_empty() || last_name.is_empty() {
        return Err(format!("{} and {} are required", COLUMNS[0], COLUMNS[1]));
    }

    let mut member = Member::new(first_name, last_name);
    member.email = text(fields[2]);
    member.phone_number = text(fields[3]);

    let demographics = DemographicsPatch {
        marital_status: label(COLUMNS[4], fields[4])?,
        children: Some(count(COLUMNS[5], fields[5])?),
        household_size: Some(count(COLUMNS[6], fields[6])?),
        occupation: text(fields[7]),
        education_level: label(COLUMNS[8], fields[8])?,
        attendance: None,
        involvement: label(COLUMNS[9], fields[9])?,
        disability: label(COLUMNS[10], fields[10])?,
    };

    Ok(ImportRecord {
        line,
        member,
        demographics,
    })
}

fn text(field: &str) -> Option<String> {
    (!field.is_empty()).then(|| field.to_string())
}

fn label<T>(column: &str, field: &str) -> Result<Option<T>, String>
where
    T: FromStr<Err = FlockError>,
{
    if field.is_empty() {
        return Ok(None);
    }
    field
        .parse()
        .map(Some)
        .map_err(|e: FlockError| format!("{column}: {e}"))
}

fn count(name: &str, field: &str) -> Result<u32, String> {
    if field.is_empty() {
        return Ok(0);
    }
    field
        .parse()
        .map_err(|_| format!("{name} '{field}' is not a non-negative whole number"))
}

/// Service that persists parsed imports.
pub struct ImportService {
    state: ServiceState,
    database: Database,
}

impl ImportService {
    pub fn new(database: Database) -> Self {
        Self {
            state: ServiceState::Created,
            database,
        }
    }

    /// Import members from a file.
    pub fn import_file(&self, path: &Path) -> FlockResult<ImportReport> {
        let bytes = std::fs::read(path)
            .map_err(|e| FlockError::Import(format!("failed to read {}: {e}", path.display())))?;
        info!("importing members from {}", path.display());
        self.persist(parse_member_import_bytes(&bytes))
    }

    /// Parse and import members from text.
    pub fn import_str(&self, text: &str) -> FlockResult<ImportReport> {
        let parsed = parse_member_import(text);
        self.persist(parsed)
    }

    /// Persist already-parsed records, one transaction per record.
    ///
    /// Constraint violations reject just that record. Any other failure
    /// stops the import; records committed before it stay.
    pub fn persist(&self, parsed: ParsedImport) -> FlockResult<ImportReport> {
        let mut report = ImportReport {
            skipped: parsed.skipped,
            ..ImportReport::default()
        };

        for record in parsed.records {
            let ImportRecord {
                line,
                mut member,
                demographics,
            } = record;

            let result = self.database.transaction(|conn| {
                let id = member.insert(conn)?;
                demographics.into_demographics(id).insert(conn)?;
                Ok(id)
            });

            match result {
                Ok(id) => report.imported.push(id),
                Err(e @ (FlockError::ConstraintViolation(_) | FlockError::Validation(_))) => {
                    warn!("import line {line} rejected: {e}");
                    report.rejected.push(SkippedLine {
                        line,
                        reason: e.to_string(),
                    });
                }
                Err(e) => {
                    warn!(
                        "import aborted at line {line} after {} members: {e}",
                        report.imported.len()
                    );
                    return Err(e);
                }
            }
        }

        info!(
            "import complete: {} imported, {} skipped, {} rejected",
            report.imported.len(),
            report.skipped.len(),
            report.rejected.len()
        );
        Ok(report)
    }
}

impl Service for ImportService {
    fn name(&self) -> &str {
        "import"
    }

    fn state(&self) -> ServiceState {
        self.state
    }

    fn init(&mut self) -> FlockResult<()> {
        self.state = ServiceState::Running;
        Ok(())
    }

    fn shutdown(&mut self) -> FlockResult<()> {
        self.state = ServiceState::Stopped;
        Ok(())
    }
}
