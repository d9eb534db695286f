//! Flock Models - Database schema, entity models, migrations, and reporting queries.
//!
//! This crate owns all data persistence: SQLite pool initialization, the
//! church membership schema, versioned migrations, entity models with their
//! closed enumerations, and the reporting query layer.

pub mod db;
pub mod schema;
pub mod migrations;
pub mod models;
pub mod queries;
pub mod sql;

// Re-export key types
pub use db::{Database, DatabaseStats, DbConn, DbPool};
pub use models::demographics::{
    Attendance, Demographics, DemographicsPatch, EducationLevel, Involvement, MaritalStatus, YesNo,
};
pub use models::event::{Event, EventPatch};
pub use models::member::{Gender, Member, MemberPatch, MembershipStatus};
pub use models::sent_notification::SentNotification;
pub use models::volunteer::{MemberVolunteering, OpportunityPatch, VolunteerOpportunity};
pub use queries::Rows;
