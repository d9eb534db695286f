//! Report service: demographic reports over the membership.

use serde::Serialize;
use tracing::info;

use flock_core::error::FlockResult;
use flock_models::queries::{
    self, EducationCount, MarriedMember, MemberChildren, MemberContact, OfficeBearers, Rows,
};
use flock_models::Database;

use crate::service::{Service, ServiceState};

/// Headline counts across every report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
    pub members: i64,
    pub events: i64,
    pub married: usize,
    pub with_children: usize,
    pub uneducated: usize,
    pub educated: usize,
    pub disabled: usize,
    pub servers: usize,
    pub officers: usize,
}

pub struct ReportService {
    state: ServiceState,
    database: Database,
}

impl ReportService {
    pub fn new(database: Database) -> Self {
        Self {
            state: ServiceState::Created,
            database,
        }
    }

    pub fn married_members(&self) -> FlockResult<Rows<MarriedMember>> {
        let conn = self.database.conn()?;
        queries::married_members(&conn)
    }

    pub fn members_with_children(&self) -> FlockResult<Rows<MemberChildren>> {
        let conn = self.database.conn()?;
        queries::members_with_children(&conn)
    }

    pub fn uneducated_members(&self) -> FlockResult<Rows<MemberContact>> {
        let conn = self.database.conn()?;
        queries::uneducated_members(&conn)
    }

    pub fn educated_members(&self) -> FlockResult<Rows<MemberContact>> {
        let conn = self.database.conn()?;
        queries::educated_members(&conn)
    }

    pub fn disabled_members(&self) -> FlockResult<Rows<MemberContact>> {
        let conn = self.database.conn()?;
        queries::disabled_members(&conn)
    }

    pub fn office_bearers(&self) -> FlockResult<OfficeBearers> {
        let conn = self.database.conn()?;
        queries::office_bearers(&conn)
    }

    pub fn education_breakdown(&self) -> FlockResult<Vec<EducationCount>> {
        let conn = self.database.conn()?;
        queries::education_breakdown(&conn)
    }

    /// Run every report on one connection and collect the counts.
    pub fn summary(&self) -> FlockResult<ReportSummary> {
        let conn = self.database.conn()?;
        let bearers = queries::office_bearers(&conn)?;
        Ok(ReportSummary {
            members: queries::count_members(&conn)?,
            events: queries::count_events(&conn)?,
            married: queries::married_members(&conn)?.count(),
            with_children: queries::members_with_children(&conn)?.count(),
            uneducated: queries::uneducated_members(&conn)?.count(),
            educated: queries::educated_members(&conn)?.count(),
            disabled: queries::disabled_members(&conn)?.count(),
            servers: bearers.servers.count(),
            officers: bearers.officers.count(),
        })
    }
}

impl Service for ReportService {
    fn name(&self) -> &str {
        "reports"
    }

    fn state(&self) -> ServiceState {
        self.state
    }

    fn init(&mut self) -> FlockResult<()> {
        self.state = ServiceState::Running;
        info!("report service initialized");
        Ok(())
    }

    fn shutdown(&mut self) -> FlockResult<()> {
        self.state = ServiceState::Stopped;
        Ok(())
    }
}
