//! Member service: registration, edits, removal, and lookups.
//!
//! A member and its demographics are written in one transaction, so a
//! failure on either leaves neither behind.

use serde::Serialize;
use tracing::{debug, info};

use flock_core::error::{FlockError, FlockResult};
use flock_models::queries::{self, Rows};
use flock_models::{
    Database, Demographics, DemographicsPatch, Member, MemberPatch, VolunteerOpportunity,
};

use crate::service::{Service, ServiceState};

/// A member with everything attached to it.
#[derive(Debug, Clone, Serialize)]
pub struct MemberProfile {
    pub member: Member,
    pub demographics: Option<Demographics>,
    pub opportunities: Vec<VolunteerOpportunity>,
}

/// Service for member records.
pub struct MemberService {
    state: ServiceState,
    database: Database,
}

impl MemberService {
    /// Create a new MemberService.
    pub fn new(database: Database) -> Self {
        Self {
            state: ServiceState::Created,
            database,
        }
    }

    /// Register a member, optionally with demographics, atomically.
    ///
    /// Fails with `ConstraintViolation` if the email is taken, or if a
    /// member with the same name and date of birth already exists.
    pub fn create_member(
        &self,
        mut member: Member,
        demographics: Option<DemographicsPatch>,
    ) -> FlockResult<Member> {
        let created = self.database.transaction(move |conn| {
            member.normalize()?;

            if let Some(email) = member.email.as_deref() {
                if Member::find_by_email(conn, email)?.is_some() {
                    return Err(FlockError::ConstraintViolation(format!(
                        "a member with email {email} already exists"
                    )));
                }
            }

            if member.date_of_birth.is_some()
                && Member::find_by_identity(
                    conn,
                    &member.first_name,
                    &member.last_name,
                    member.date_of_birth,
                )?
                .is_some()
            {
                return Err(FlockError::ConstraintViolation(format!(
                    "{} born {} is already a member",
                    member.full_name(),
                    member.date_of_birth.map(|d| d.to_string()).unwrap_or_default()
                )));
            }

            let id = member.insert(conn)?;
            if let Some(patch) = demographics {
                patch.into_demographics(id).insert(conn)?;
            }
            Ok(member)
        })?;

        info!("registered member {} ({})", created.id.unwrap_or_default(), created.full_name());
        Ok(created)
    }

    /// Apply a partial edit to a member.
    pub fn edit_member(&self, id: i64, patch: &MemberPatch) -> FlockResult<Member> {
        self.database.transaction(|conn| {
            Member::update(conn, id, patch)?;
            Member::find_by_id(conn, id)?
                .ok_or_else(|| FlockError::NotFound(format!("member {id}")))
        })
    }

    /// Apply a partial edit to a member's demographics, creating the
    /// profile if the member has none yet.
    pub fn edit_demographics(&self, member_id: i64, patch: DemographicsPatch) -> FlockResult<Demographics> {
        self.database.transaction(move |conn| {
            if Member::find_by_id(conn, member_id)?.is_none() {
                return Err(FlockError::NotFound(format!("member {member_id}")));
            }

            match Demographics::find_by_member(conn, member_id)? {
                Some(_) => Demographics::update(conn, member_id, &patch)?,
                None => {
                    debug!("creating demographics for member {member_id}");
                    patch.into_demographics(member_id).insert(conn)?;
                }
            }

            Demographics::find_by_member(conn, member_id)?
                .ok_or_else(|| FlockError::NotFound(format!("demographics for member {member_id}")))
        })
    }

    /// Remove a member along with its demographics and assignments.
    pub fn remove_member(&self, id: i64) -> FlockResult<()> {
        self.database.transaction(|conn| Member::delete(conn, id))?;
        info!("removed member {id}");
        Ok(())
    }

    /// Get a member by id.
    pub fn get_member(&self, id: i64) -> FlockResult<Option<Member>> {
        let conn = self.database.conn()?;
        Member::find_by_id(&conn, id)
    }

    /// Get a member with demographics and volunteering.
    pub fn get_profile(&self, id: i64) -> FlockResult<Option<MemberProfile>> {
        let conn = self.database.conn()?;
        let Some(member) = Member::find_by_id(&conn, id)? else {
            return Ok(None);
        };
        Ok(Some(MemberProfile {
            demographics: Demographics::find_by_member(&conn, id)?,
            opportunities: VolunteerOpportunity::find_for_member(&conn, id)?,
            member,
        }))
    }

    /// Every member in id order.
    pub fn list_members(&self) -> FlockResult<Rows<Member>> {
        let conn = self.database.conn()?;
        queries::all_members(&conn)
    }

    /// The member holding this email, if any.
    pub fn find_by_email(&self, email: &str) -> FlockResult<Option<Member>> {
        let conn = self.database.conn()?;
        queries::member_by_email(&conn, email)
    }

    /// Members with this first and last name.
    pub fn find_by_name(&self, first_name: &str, last_name: &str) -> FlockResult<Rows<Member>> {
        let conn = self.database.conn()?;
        queries::member_by_name(&conn, first_name, last_name)
    }
}

impl Service for MemberService {
    fn name(&self) -> &str {
        "members"
    }

    fn state(&self) -> ServiceState {
        self.state
    }

    fn init(&mut self) -> FlockResult<()> {
        self.state = ServiceState::Initializing;
        let count = {
            let conn = self.database.conn()?;
            queries::count_members(&conn)?
        };
        self.state = ServiceState::Running;
        info!("member service initialized ({count} members)");
        Ok(())
    }

    fn shutdown(&mut self) -> FlockResult<()> {
        self.state = ServiceState::Stopped;
        info!("member service stopped");
        Ok(())
    }
}
