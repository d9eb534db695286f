//! Flock Services - Business logic and service layer.
//!
//! This crate provides the service trait and the concrete services the CLI
//! drives:
//! - Member registration, partial edits, and removal (member + demographics atomic)
//! - Event calendar with (name, date) uniqueness
//! - Volunteer opportunities and assignments
//! - Demographic reports
//! - Pipe-delimited member import (parse, then persist)
//! - Daily notification job (event reminders, birthday greetings) and its scheduler

pub mod service;
pub mod member;
pub mod event;
pub mod volunteer;
pub mod report;
pub mod import;
pub mod notification;
pub mod scheduler;

// Re-export key types
pub use service::{Service, ServiceState};
pub use member::{MemberProfile, MemberService};
pub use event::EventService;
pub use volunteer::VolunteerService;
pub use report::{ReportService, ReportSummary};
pub use import::{parse_member_import, parse_member_import_bytes, ImportReport, ImportService, ParsedImport, SkippedLine};
pub use notification::{JobReport, NotificationJob, NotificationOutcome, SendFailure};
pub use scheduler::DailyScheduler;
