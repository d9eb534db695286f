//! Volunteer service: opportunities and member sign-ups.

use chrono::NaiveDate;
use tracing::info;

use flock_core::error::{FlockError, FlockResult};
use flock_models::queries::{self, Rows};
use flock_models::{Database, Member, MemberVolunteering, OpportunityPatch, VolunteerOpportunity};

use crate::service::{Service, ServiceState};

pub struct VolunteerService {
    state: ServiceState,
    database: Database,
}

impl VolunteerService {
    pub fn new(database: Database) -> Self {
        Self {
            state: ServiceState::Created,
            database,
        }
    }

    /// Post a new opportunity.
    pub fn post_opportunity(&self, mut opportunity: VolunteerOpportunity) -> FlockResult<VolunteerOpportunity> {
        let opportunity = self.database.transaction(move |conn| {
            opportunity.insert(conn)?;
            Ok(opportunity)
        })?;
        info!("posted opportunity '{}'", opportunity.name);
        Ok(opportunity)
    }

    pub fn edit_opportunity(&self, id: i64, patch: &OpportunityPatch) -> FlockResult<VolunteerOpportunity> {
        self.database.transaction(|conn| {
            VolunteerOpportunity::update(conn, id, patch)?;
            VolunteerOpportunity::find_by_id(conn, id)?
                .ok_or_else(|| FlockError::NotFound(format!("volunteer opportunity {id}")))
        })
    }

    /// Remove an opportunity. Fails with `ConstraintViolation` while
    /// members are still assigned to it.
    pub fn remove_opportunity(&self, id: i64) -> FlockResult<()> {
        self.database.transaction(|conn| VolunteerOpportunity::delete(conn, id))?;
        info!("removed opportunity {id}");
        Ok(())
    }

    /// Sign a member up for an opportunity.
    pub fn assign(&self, member_id: i64, opportunity_id: i64, date: NaiveDate) -> FlockResult<MemberVolunteering> {
        let assignment = MemberVolunteering {
            member_id,
            opportunity_id,
            date_volunteered: date,
        };
        self.database.transaction(|conn| assignment.insert(conn))?;
        info!("assigned member {member_id} to opportunity {opportunity_id}");
        Ok(assignment)
    }

    pub fn unassign(&self, member_id: i64, opportunity_id: i64) -> FlockResult<()> {
        self.database
            .transaction(|conn| MemberVolunteering::delete(conn, member_id, opportunity_id))
    }

    pub fn get_opportunity(&self, id: i64) -> FlockResult<Option<VolunteerOpportunity>> {
        let conn = self.database.conn()?;
        VolunteerOpportunity::find_by_id(&conn, id)
    }

    pub fn list_opportunities(&self) -> FlockResult<Rows<VolunteerOpportunity>> {
        let conn = self.database.conn()?;
        Ok(VolunteerOpportunity::load_all(&conn)?.into())
    }

    /// Members signed up for an opportunity.
    pub fn volunteers_for(&self, opportunity_id: i64) -> FlockResult<Rows<Member>> {
        let conn = self.database.conn()?;
        queries::volunteers_for(&conn, opportunity_id)
    }

    /// Opportunities a member is signed up for.
    pub fn opportunities_for(&self, member_id: i64) -> FlockResult<Rows<VolunteerOpportunity>> {
        let conn = self.database.conn()?;
        Ok(VolunteerOpportunity::find_for_member(&conn, member_id)?.into())
    }
}

impl Service for VolunteerService {
    fn name(&self) -> &str {
        "volunteers"
    }

    fn state(&self) -> ServiceState {
        self.state
    }

    fn init(&mut self) -> FlockResult<()> {
        self.state = ServiceState::Running;
        info!("volunteer service initialized");
        Ok(())
    }

    fn shutdown(&mut self) -> FlockResult<()> {
        self.state = ServiceState::Stopped;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flock_core::config::DatabaseConfig;

    fn create_test_db() -> (Database, tempfile::TempDir) {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("test.db");
        let db = Database::init(&path, &DatabaseConfig::default()).unwrap();
        (db, dir)
    }

    #[test]
    fn test_assign_and_restricted_removal() {
        let (db, _dir) = create_test_db();
        let member_id = {
            let conn = db.conn().unwrap();
            Member::new("Kagiso", "Molefe").insert(&conn).unwrap()
        };
        let svc = VolunteerService::new(db);
        let date = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let opp = svc
            .post_opportunity(VolunteerOpportunity {
                id: None,
                name: "Ushering".into(),
                description: None,
                date_posted: date,
                location: None,
            })
            .unwrap();
        let opp_id = opp.id.unwrap();

        svc.assign(member_id, opp_id, date).unwrap();
        assert_eq!(svc.volunteers_for(opp_id).unwrap().count(), 1);
        assert_eq!(svc.opportunities_for(member_id).unwrap().count(), 1);

        assert!(svc.remove_opportunity(opp_id).unwrap_err().is_constraint_violation());
        svc.unassign(member_id, opp_id).unwrap();
        svc.remove_opportunity(opp_id).unwrap();
        assert!(svc.get_opportunity(opp_id).unwrap().is_none());
    }

    #[test]
    fn test_unassign_missing_is_not_found() {
        let (db, _dir) = create_test_db();
        let svc = VolunteerService::new(db);
        assert!(svc.unassign(1, 1).unwrap_err().is_not_found());
    }
}
