//! Volunteer opportunities and member assignments.

use chrono::NaiveDate;
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};
use tracing::debug;

use flock_core::error::{FlockError, FlockResult};

use super::non_blank;
use crate::sql::{collect_rows, optional_row, sql_error};

/// A volunteering opportunity posted by the church.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolunteerOpportunity {
    pub id: Option<i64>,
    pub name: String,
    pub description: Option<String>,
    pub date_posted: NaiveDate,
    pub location: Option<String>,
}

/// Opportunity fields to change. `None` keeps the stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OpportunityPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub date_posted: Option<NaiveDate>,
    pub location: Option<String>,
}

/// A member signed up for an opportunity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberVolunteering {
    pub member_id: i64,
    pub opportunity_id: i64,
    pub date_volunteered: NaiveDate,
}

impl VolunteerOpportunity {
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            description: row.get("description")?,
            date_posted: row.get("date_posted")?,
            location: row.get("location")?,
        })
    }

    /// Insert this opportunity, assigning its id.
    pub fn insert(&mut self, conn: &Connection) -> FlockResult<i64> {
        self.name = self.name.trim().to_string();
        if self.name.is_empty() {
            return Err(FlockError::Validation("opportunity name is required".into()));
        }
        self.description = non_blank(self.description.as_deref()).map(String::from);
        self.location = non_blank(self.location.as_deref()).map(String::from);

        conn.execute(
            "INSERT INTO volunteer_opportunities (name, description, date_posted, location)
             VALUES (?1, ?2, ?3, ?4)",
            params![self.name, self.description, self.date_posted, self.location],
        )
        .map_err(|e| sql_error("insert volunteer opportunity", e))?;

        let id = conn.last_insert_rowid();
        self.id = Some(id);
        debug!("posted volunteer opportunity {id} '{}'", self.name);
        Ok(id)
    }

    pub fn update(conn: &Connection, id: i64, patch: &OpportunityPatch) -> FlockResult<()> {
        let changed = conn
            .execute(
                "UPDATE volunteer_opportunities SET
                    name = COALESCE(?2, name),
                    description = COALESCE(?3, description),
                    date_posted = COALESCE(?4, date_posted),
                    location = COALESCE(?5, location)
                 WHERE id = ?1",
                params![
                    id,
                    non_blank(patch.name.as_deref()),
                    non_blank(patch.description.as_deref()),
                    patch.date_posted,
                    non_blank(patch.location.as_deref()),
                ],
            )
            .map_err(|e| sql_error("update volunteer opportunity", e))?;

        if changed == 0 {
            return Err(FlockError::NotFound(format!("volunteer opportunity {id}")));
        }
        Ok(())
    }

    /// Delete an opportunity.
    ///
    /// Fails with `ConstraintViolation` while any member is assigned to it.
    pub fn delete(conn: &Connection, id: i64) -> FlockResult<()> {
        let changed = conn
            .execute("DELETE FROM volunteer_opportunities WHERE id = ?1", [id])
            .map_err(|e| sql_error("delete volunteer opportunity", e))?;
        if changed == 0 {
            return Err(FlockError::NotFound(format!("volunteer opportunity {id}")));
        }
        Ok(())
    }

    pub fn find_by_id(conn: &Connection, id: i64) -> FlockResult<Option<Self>> {
        optional_row(
            "find volunteer opportunity",
            conn.query_row(
                "SELECT * FROM volunteer_opportunities WHERE id = ?1",
                [id],
                Self::from_row,
            ),
        )
    }

    pub fn load_all(conn: &Connection) -> FlockResult<Vec<Self>> {
        let mut stmt = conn
            .prepare("SELECT * FROM volunteer_opportunities ORDER BY id")
            .map_err(|e| sql_error("load volunteer opportunities", e))?;
        let rows = stmt
            .query_map([], Self::from_row)
            .map_err(|e| sql_error("load volunteer opportunities", e))?;
        collect_rows("load volunteer opportunities", rows)
    }

    /// Opportunities a member has signed up for.
    pub fn find_for_member(conn: &Connection, member_id: i64) -> FlockResult<Vec<Self>> {
        let mut stmt = conn
            .prepare(
                "SELECT o.* FROM volunteer_opportunities o
                 JOIN member_volunteering mv ON mv.opportunity_id = o.id
                 WHERE mv.member_id = ?1
                 ORDER BY o.id",
            )
            .map_err(|e| sql_error("find opportunities for member", e))?;
        let rows = stmt
            .query_map([member_id], Self::from_row)
            .map_err(|e| sql_error("find opportunities for member", e))?;
        collect_rows("find opportunities for member", rows)
    }
}

impl MemberVolunteering {
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            member_id: row.get("member_id")?,
            opportunity_id: row.get("opportunity_id")?,
            date_volunteered: row.get("date_volunteered")?,
        })
    }

    /// Record an assignment. Assigning twice, or referencing a missing
    /// member or opportunity, fails with `ConstraintViolation`.
    pub fn insert(&self, conn: &Connection) -> FlockResult<()> {
        conn.execute(
            "INSERT INTO member_volunteering (member_id, opportunity_id, date_volunteered)
             VALUES (?1, ?2, ?3)",
            params![self.member_id, self.opportunity_id, self.date_volunteered],
        )
        .map_err(|e| sql_error("assign volunteer", e))?;
        Ok(())
    }

    /// Remove an assignment.
    pub fn delete(conn: &Connection, member_id: i64, opportunity_id: i64) -> FlockResult<()> {
        let changed = conn
            .execute(
                "DELETE FROM member_volunteering WHERE member_id = ?1 AND opportunity_id = ?2",
                [member_id, opportunity_id],
            )
            .map_err(|e| sql_error("unassign volunteer", e))?;
        if changed == 0 {
            return Err(FlockError::NotFound(format!(
                "member {member_id} is not assigned to opportunity {opportunity_id}"
            )));
        }
        Ok(())
    }

    /// Assignments on an opportunity, by member id.
    pub fn find_for_opportunity(conn: &Connection, opportunity_id: i64) -> FlockResult<Vec<Self>> {
        let mut stmt = conn
            .prepare(
                "SELECT * FROM member_volunteering WHERE opportunity_id = ?1 ORDER BY member_id",
            )
            .map_err(|e| sql_error("find assignments", e))?;
        let rows = stmt
            .query_map([opportunity_id], Self::from_row)
            .map_err(|e| sql_error("find assignments", e))?;
        collect_rows("find assignments", rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::member::Member;
    use crate::schema;

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys=ON;").unwrap();
        schema::create_tables(&conn).unwrap();
        conn
    }

    fn opportunity() -> VolunteerOpportunity {
        VolunteerOpportunity {
            id: None,
            name: "Soup kitchen".into(),
            description: Some("Saturday meals".into()),
            date_posted: NaiveDate::from_ymd_opt(2025, 2, 1).unwrap(),
            location: Some("Hall B".into()),
        }
    }

    #[test]
    fn test_assign_and_list() {
        let conn = conn();
        let member_id = Member::new("Ayanda", "Mthembu").insert(&conn).unwrap();
        let opp_id = opportunity().insert(&conn).unwrap();

        let assignment = MemberVolunteering {
            member_id,
            opportunity_id: opp_id,
            date_volunteered: NaiveDate::from_ymd_opt(2025, 2, 8).unwrap(),
        };
        assignment.insert(&conn).unwrap();

        assert_eq!(MemberVolunteering::find_for_opportunity(&conn, opp_id).unwrap(), vec![assignment.clone()]);
        assert_eq!(VolunteerOpportunity::find_for_member(&conn, member_id).unwrap().len(), 1);
        assert!(assignment.insert(&conn).unwrap_err().is_constraint_violation());
    }

    #[test]
    fn test_delete_restricted_while_assigned() {
        let conn = conn();
        let member_id = Member::new("Ayanda", "Mthembu").insert(&conn).unwrap();
        let opp_id = opportunity().insert(&conn).unwrap();
        MemberVolunteering {
            member_id,
            opportunity_id: opp_id,
            date_volunteered: NaiveDate::from_ymd_opt(2025, 2, 8).unwrap(),
        }
        .insert(&conn)
        .unwrap();

        let err = VolunteerOpportunity::delete(&conn, opp_id).unwrap_err();
        assert!(err.is_constraint_violation());

        MemberVolunteering::delete(&conn, member_id, opp_id).unwrap();
        VolunteerOpportunity::delete(&conn, opp_id).unwrap();
    }

    #[test]
    fn test_member_delete_cascades_assignments() {
        let conn = conn();
        let member_id = Member::new("Ayanda", "Mthembu").insert(&conn).unwrap();
        let opp_id = opportunity().insert(&conn).unwrap();
        MemberVolunteering {
            member_id,
            opportunity_id: opp_id,
            date_volunteered: NaiveDate::from_ymd_opt(2025, 2, 8).unwrap(),
        }
        .insert(&conn)
        .unwrap();

        Member::delete(&conn, member_id).unwrap();
        assert!(MemberVolunteering::find_for_opportunity(&conn, opp_id).unwrap().is_empty());
    }

    #[test]
    fn test_assign_unknown_member_rejected() {
        let conn = conn();
        let opp_id = opportunity().insert(&conn).unwrap();
        let err = MemberVolunteering {
            member_id: 77,
            opportunity_id: opp_id,
            date_volunteered: NaiveDate::from_ymd_opt(2025, 2, 8).unwrap(),
        }
        .insert(&conn)
        .unwrap_err();
        assert!(err.is_constraint_violation());
    }
}
