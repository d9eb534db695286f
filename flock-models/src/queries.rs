//! Reporting queries and lookups over members, demographics, and events.
//!
//! Every report returns its rows together with a count. All queries use
//! parameterized SQL and order by id so results are stable. Absence is an
//! empty result except for the event lookups, which report `NotFound`.

use chrono::NaiveDate;
use rusqlite::{params, Connection, Row};
use serde::Serialize;
use tracing::debug;

use flock_core::error::{FlockError, FlockResult};

use crate::models::demographics::{EducationLevel, Involvement, MaritalStatus, YesNo};
use crate::models::event::Event;
use crate::models::member::{Member, MembershipStatus};
use crate::sql::{collect_rows, sql_error};

/// Query result rows plus their count.
///
/// Only built from a `Vec`, so `count` always equals the number of rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rows<T> {
    rows: Vec<T>,
    count: usize,
}

impl<T> Rows<T> {
    pub fn rows(&self) -> &[T] {
        &self.rows
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn into_rows(self) -> Vec<T> {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.rows.iter()
    }
}

impl<T> From<Vec<T>> for Rows<T> {
    fn from(rows: Vec<T>) -> Self {
        let count = rows.len();
        Self { rows, count }
    }
}

impl<T> IntoIterator for Rows<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

// ─── Projections ────────────────────────────────────────────────────────────

/// A married member and when they joined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarriedMember {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub join_date: Option<NaiveDate>,
}

/// A member with at least one child.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberChildren {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub children: u32,
}

/// Name and phone number of a member.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct MemberContact {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<String>,
}

impl MemberContact {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            first_name: row.get("first_name")?,
            last_name: row.get("last_name")?,
            phone_number: row.get("phone_number")?,
        })
    }
}

/// A Server or Officer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OfficeBearer {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<String>,
    pub involvement: Involvement,
}

/// Office bearers split by tier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OfficeBearers {
    pub servers: Rows<OfficeBearer>,
    pub officers: Rows<OfficeBearer>,
}

impl OfficeBearers {
    /// Servers plus officers.
    pub fn total(&self) -> usize {
        self.servers.count() + self.officers.count()
    }
}

/// Number of members at one education level. `level` is `None` for members
/// with no recorded education.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EducationCount {
    pub level: Option<EducationLevel>,
    pub count: i64,
}

// ─── Event lookups ──────────────────────────────────────────────────────────

/// Every event, in id order.
pub fn all_events(conn: &Connection) -> FlockResult<Rows<Event>> {
    Ok(Event::load_all(conn)?.into())
}

/// Events with this exact name. No match is `NotFound`.
pub fn event_by_name(conn: &Connection, name: &str) -> FlockResult<Rows<Event>> {
    let rows = Event::find_by_name(conn, name)?;
    if rows.is_empty() {
        return Err(FlockError::NotFound(format!("no event named '{}'", name.trim())));
    }
    Ok(rows.into())
}

/// Events on this date. No match is `NotFound`.
pub fn event_by_date(conn: &Connection, date: NaiveDate) -> FlockResult<Rows<Event>> {
    let rows = Event::find_by_date(conn, date)?;
    if rows.is_empty() {
        return Err(FlockError::NotFound(format!("no event on {date}")));
    }
    Ok(rows.into())
}

/// Events on this date, possibly none.
pub fn events_on(conn: &Connection, date: NaiveDate) -> FlockResult<Rows<Event>> {
    Ok(Event::find_by_date(conn, date)?.into())
}

// ─── Member lookups ─────────────────────────────────────────────────────────

/// Every member, in id order.
pub fn all_members(conn: &Connection) -> FlockResult<Rows<Member>> {
    Ok(Member::load_all(conn)?.into())
}

/// The member with this email, if any.
pub fn member_by_email(conn: &Connection, email: &str) -> FlockResult<Option<Member>> {
    Member::find_by_email(conn, email)
}

/// Members with this first and last name. Names are not unique.
pub fn member_by_name(conn: &Connection, first_name: &str, last_name: &str) -> FlockResult<Rows<Member>> {
    Ok(Member::find_by_name(conn, first_name, last_name)?.into())
}

// ─── Demographic reports ────────────────────────────────────────────────────

/// Members whose marital status is Married.
pub fn married_members(conn: &Connection) -> FlockResult<Rows<MarriedMember>> {
    let context = "married members";
    let mut stmt = conn
        .prepare(
            "SELECT m.id, m.first_name, m.last_name, m.join_date
             FROM members m
             JOIN demographics d ON d.member_id = m.id
             WHERE d.marital_status = ?1
             ORDER BY m.id",
        )
        .map_err(|e| sql_error(context, e))?;
    let rows = stmt
        .query_map([MaritalStatus::Married], |row| {
            Ok(MarriedMember {
                id: row.get(0)?,
                first_name: row.get(1)?,
                last_name: row.get(2)?,
                join_date: row.get(3)?,
            })
        })
        .map_err(|e| sql_error(context, e))?;
    Ok(collect_rows(context, rows)?.into())
}

/// Members with one or more children.
pub fn members_with_children(conn: &Connection) -> FlockResult<Rows<MemberChildren>> {
    let context = "members with children";
    let mut stmt = conn
        .prepare(
            "SELECT m.id, m.first_name, m.last_name, d.children
             FROM members m
             JOIN demographics d ON d.member_id = m.id
             WHERE d.children >= 1
             ORDER BY m.id",
        )
        .map_err(|e| sql_error(context, e))?;
    let rows = stmt
        .query_map([], |row| {
            Ok(MemberChildren {
                id: row.get(0)?,
                first_name: row.get(1)?,
                last_name: row.get(2)?,
                children: row.get(3)?,
            })
        })
        .map_err(|e| sql_error(context, e))?;
    Ok(collect_rows(context, rows)?.into())
}

/// Members whose education level is Before Matric.
pub fn uneducated_members(conn: &Connection) -> FlockResult<Rows<MemberContact>> {
    contacts(
        conn,
        "uneducated members",
        "JOIN demographics d ON d.member_id = m.id WHERE d.education_level = ?1",
        params![EducationLevel::BeforeMatric],
    )
}

/// Every member not in [`uneducated_members`], including members with no
/// profile or no recorded education.
pub fn educated_members(conn: &Connection) -> FlockResult<Rows<MemberContact>> {
    contacts(
        conn,
        "educated members",
        "LEFT JOIN demographics d ON d.member_id = m.id
         WHERE d.education_level IS NULL OR d.education_level != ?1",
        params![EducationLevel::BeforeMatric],
    )
}

/// Members flagged with a disability.
pub fn disabled_members(conn: &Connection) -> FlockResult<Rows<MemberContact>> {
    contacts(
        conn,
        "disabled members",
        "JOIN demographics d ON d.member_id = m.id WHERE d.disabilities = ?1",
        params![YesNo::Yes],
    )
}

/// Servers and Officers as two disjoint lists.
pub fn office_bearers(conn: &Connection) -> FlockResult<OfficeBearers> {
    Ok(OfficeBearers {
        servers: bearers_with(conn, Involvement::Server)?,
        officers: bearers_with(conn, Involvement::Officer)?,
    })
}

fn bearers_with(conn: &Connection, involvement: Involvement) -> FlockResult<Rows<OfficeBearer>> {
    let context = "office bearers";
    let mut stmt = conn
        .prepare(
            "SELECT m.id, m.first_name, m.last_name, m.phone_number, d.involvement
             FROM members m
             JOIN demographics d ON d.member_id = m.id
             WHERE d.involvement = ?1
             ORDER BY m.id",
        )
        .map_err(|e| sql_error(context, e))?;
    let rows = stmt
        .query_map([involvement], |row| {
            Ok(OfficeBearer {
                id: row.get(0)?,
                first_name: row.get(1)?,
                last_name: row.get(2)?,
                phone_number: row.get(3)?,
                involvement: row.get(4)?,
            })
        })
        .map_err(|e| sql_error(context, e))?;
    Ok(collect_rows(context, rows)?.into())
}

/// Member counts per education level, lowest level first, unrecorded last.
pub fn education_breakdown(conn: &Connection) -> FlockResult<Vec<EducationCount>> {
    let context = "education breakdown";
    let mut stmt = conn
        .prepare(
            "SELECT d.education_level, COUNT(*)
             FROM members m
             LEFT JOIN demographics d ON d.member_id = m.id
             GROUP BY d.education_level",
        )
        .map_err(|e| sql_error(context, e))?;
    let rows = stmt
        .query_map([], |row| {
            Ok(EducationCount {
                level: row.get(0)?,
                count: row.get(1)?,
            })
        })
        .map_err(|e| sql_error(context, e))?;
    let mut counts = collect_rows(context, rows)?;
    counts.sort_by_key(|c| (c.level.is_none(), c.level));
    Ok(counts)
}

// ─── Notification rosters ───────────────────────────────────────────────────

/// Members with a phone number, optionally only Active ones.
pub fn members_with_phone(conn: &Connection, active_only: bool) -> FlockResult<Rows<MemberContact>> {
    let rows = contacts(
        conn,
        "members with phone",
        "WHERE m.phone_number IS NOT NULL AND TRIM(m.phone_number) != ''
           AND (?1 = 0 OR m.membership_status = ?2)",
        params![active_only, MembershipStatus::Active],
    )?;
    debug!("reminder roster has {} members", rows.count());
    Ok(rows)
}

/// Members with a recorded date of birth.
pub fn members_with_birth_date(conn: &Connection) -> FlockResult<Rows<Member>> {
    let context = "members with birth date";
    let mut stmt = conn
        .prepare("SELECT * FROM members WHERE date_of_birth IS NOT NULL ORDER BY id")
        .map_err(|e| sql_error(context, e))?;
    let rows = stmt
        .query_map([], Member::from_row)
        .map_err(|e| sql_error(context, e))?;
    Ok(collect_rows(context, rows)?.into())
}

/// Members assigned to an opportunity.
pub fn volunteers_for(conn: &Connection, opportunity_id: i64) -> FlockResult<Rows<Member>> {
    let context = "volunteers for opportunity";
    let mut stmt = conn
        .prepare(
            "SELECT m.* FROM members m
             JOIN member_volunteering mv ON mv.member_id = m.id
             WHERE mv.opportunity_id = ?1
             ORDER BY m.id",
        )
        .map_err(|e| sql_error(context, e))?;
    let rows = stmt
        .query_map([opportunity_id], Member::from_row)
        .map_err(|e| sql_error(context, e))?;
    Ok(collect_rows(context, rows)?.into())
}

// ─── Counts ─────────────────────────────────────────────────────────────────

pub fn count_members(conn: &Connection) -> FlockResult<i64> {
    conn.query_row("SELECT COUNT(*) FROM members", [], |row| row.get(0))
        .map_err(|e| sql_error("count members", e))
}

pub fn count_events(conn: &Connection) -> FlockResult<i64> {
    conn.query_row("SELECT COUNT(*) FROM events", [], |row| row.get(0))
        .map_err(|e| sql_error("count events", e))
}

/// Number of profiles with this involvement tier.
pub fn count_with_involvement(conn: &Connection, involvement: Involvement) -> FlockResult<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM demographics WHERE involvement = ?1",
        [involvement],
        |row| row.get(0),
    )
    .map_err(|e| sql_error("count involvement", e))
}

fn contacts(
    conn: &Connection,
    context: &str,
    clause: &str,
    params: &[&dyn rusqlite::ToSql],
) -> FlockResult<Rows<MemberContact>> {
    let sql = format!(
        "SELECT m.id, m.first_name, m.last_name, m.phone_number FROM members m {clause} ORDER BY m.id"
    );
    let mut stmt = conn.prepare(&sql).map_err(|e| sql_error(context, e))?;
    let rows = stmt
        .query_map(params, MemberContact::from_row)
        .map_err(|e| sql_error(context, e))?;
    Ok(collect_rows(context, rows)?.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::demographics::DemographicsPatch;
    use crate::schema;

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys=ON;").unwrap();
        schema::create_tables(&conn).unwrap();
        conn
    }

    fn add(conn: &Connection, first: &str, phone: Option<&str>, patch: Option<DemographicsPatch>) -> i64 {
        let mut member = Member::new(first, "Test");
        member.phone_number = phone.map(String::from);
        let id = member.insert(conn).unwrap();
        if let Some(patch) = patch {
            patch.into_demographics(id).insert(conn).unwrap();
        }
        id
    }

    #[test]
    fn test_rows_count_matches() {
        let rows: Rows<i32> = vec![1, 2, 3].into();
        assert_eq!(rows.count(), 3);
        assert_eq!(rows.count(), rows.rows().len());
        assert!(!rows.is_empty());

        let json = serde_json::to_value(&rows).unwrap();
        assert_eq!(json["count"], 3);
        assert_eq!(rows.into_rows(), vec![1, 2, 3]);

        let empty: Rows<i32> = Vec::new().into();
        assert!(empty.is_empty());
        assert_eq!(empty.count(), 0);
    }

    #[test]
    fn test_event_lookup_not_found() {
        let conn = conn();
        let date = NaiveDate::from_ymd_opt(2025, 1, 11).unwrap();
        assert!(event_by_date(&conn, date).unwrap_err().is_not_found());
        assert!(event_by_name(&conn, "Nothing").unwrap_err().is_not_found());
        assert!(events_on(&conn, date).unwrap().is_empty());
    }

    #[test]
    fn test_education_complement() {
        let conn = conn();
        add(&conn, "A", None, Some(DemographicsPatch {
            education_level: Some(EducationLevel::BeforeMatric),
            ..Default::default()
        }));
        add(&conn, "B", None, Some(DemographicsPatch {
            education_level: Some(EducationLevel::College),
            ..Default::default()
        }));
        add(&conn, "C", None, Some(DemographicsPatch::default()));
        add(&conn, "D", None, None);

        let uneducated = uneducated_members(&conn).unwrap();
        let educated = educated_members(&conn).unwrap();
        assert_eq!(uneducated.count(), 1);
        assert_eq!(educated.count(), 3);
        assert_eq!(uneducated.count() + educated.count(), all_members(&conn).unwrap().count());
        assert!(uneducated.iter().all(|u| educated.iter().all(|e| e.id != u.id)));
    }

    #[test]
    fn test_members_with_phone_filters() {
        let conn = conn();
        add(&conn, "HasPhone", Some("+27820000001"), None);
        add(&conn, "Blank", Some("  "), None);
        add(&conn, "NoPhone", None, None);
        let mut inactive = Member::new("Inactive", "Test");
        inactive.phone_number = Some("+27820000002".into());
        inactive.membership_status = Some(MembershipStatus::Inactive);
        inactive.insert(&conn).unwrap();

        assert_eq!(members_with_phone(&conn, false).unwrap().count(), 2);
        assert_eq!(members_with_phone(&conn, true).unwrap().count(), 0);
    }

    #[test]
    fn test_education_breakdown_order() {
        let conn = conn();
        add(&conn, "A", None, Some(DemographicsPatch {
            education_level: Some(EducationLevel::PostGrad),
            ..Default::default()
        }));
        add(&conn, "B", None, None);
        add(&conn, "C", None, Some(DemographicsPatch {
            education_level: Some(EducationLevel::PassedMatric),
            ..Default::default()
        }));

        let breakdown = education_breakdown(&conn).unwrap();
        let levels: Vec<_> = breakdown.iter().map(|c| c.level).collect();
        assert_eq!(
            levels,
            vec![Some(EducationLevel::PassedMatric), Some(EducationLevel::PostGrad), None]
        );
    }

    #[test]
    fn test_office_bearers_disjoint() {
        let conn = conn();
        for (name, tier) in [("S", Involvement::Server), ("O", Involvement::Officer), ("C", Involvement::Congregant)] {
            add(&conn, name, None, Some(DemographicsPatch {
                involvement: Some(tier),
                ..Default::default()
            }));
        }
        let bearers = office_bearers(&conn).unwrap();
        assert_eq!(bearers.servers.count(), 1);
        assert_eq!(bearers.officers.count(), 1);
        assert_eq!(bearers.servers.rows()[0].involvement, Involvement::Server);
        let tiered = count_with_involvement(&conn, Involvement::Server).unwrap()
            + count_with_involvement(&conn, Involvement::Officer).unwrap();
        assert_eq!(bearers.total() as i64, tiered);
    }
}
