//! Member entity model.

use chrono::NaiveDate;
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};
use tracing::debug;

use flock_core::error::{FlockError, FlockResult};

use super::non_blank;
use crate::sql::{collect_rows, optional_row, sql_error};

labelled_enum! {
    /// Member gender.
    Gender {
        Male => "Male",
        Female => "Female",
        Other => "Other",
    }
}

labelled_enum! {
    /// Membership standing.
    MembershipStatus {
        Active => "Active",
        Inactive => "Inactive",
    }
}

/// A church member.
///
/// Only the name is required. Email is unique across members when present;
/// blank emails are stored as NULL so they never collide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: Option<i64>,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<Gender>,
    pub phone_number: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub join_date: Option<NaiveDate>,
    pub membership_status: Option<MembershipStatus>,
}

/// Fields to change on an existing member. `None` keeps the stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemberPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<Gender>,
    pub phone_number: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub join_date: Option<NaiveDate>,
    pub membership_status: Option<MembershipStatus>,
}

impl MemberPatch {
    /// Whether the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        non_blank(self.first_name.as_deref()).is_none()
            && non_blank(self.last_name.as_deref()).is_none()
            && self.date_of_birth.is_none()
            && self.gender.is_none()
            && non_blank(self.phone_number.as_deref()).is_none()
            && non_blank(self.email.as_deref()).is_none()
            && non_blank(self.address.as_deref()).is_none()
            && self.join_date.is_none()
            && self.membership_status.is_none()
    }
}

impl Member {
    /// Create an unsaved member with just a name.
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            id: None,
            first_name: first_name.into(),
            last_name: last_name.into(),
            date_of_birth: None,
            gender: None,
            phone_number: None,
            email: None,
            address: None,
            join_date: None,
            membership_status: None,
        }
    }

    /// Construct a Member from a database row.
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            first_name: row.get("first_name")?,
            last_name: row.get("last_name")?,
            date_of_birth: row.get("date_of_birth")?,
            gender: row.get("gender")?,
            phone_number: row.get("phone_number")?,
            email: row.get("email")?,
            address: row.get("address")?,
            join_date: row.get("join_date")?,
            membership_status: row.get("membership_status")?,
        })
    }

    /// "First Last".
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Trim text fields, turn blanks into `None`, and require a name.
    pub fn normalize(&mut self) -> FlockResult<()> {
        self.first_name = self.first_name.trim().to_string();
        self.last_name = self.last_name.trim().to_string();
        if self.first_name.is_empty() || self.last_name.is_empty() {
            return Err(FlockError::Validation("member first and last name are required".into()));
        }
        self.phone_number = non_blank(self.phone_number.as_deref()).map(String::from);
        self.email = non_blank(self.email.as_deref()).map(String::from);
        self.address = non_blank(self.address.as_deref()).map(String::from);
        Ok(())
    }

    // ─── Persistence ─────────────────────────────────────────────────────

    /// Insert this member, assigning its id.
    ///
    /// A duplicate email fails with `ConstraintViolation`.
    pub fn insert(&mut self, conn: &Connection) -> FlockResult<i64> {
        self.normalize()?;
        conn.execute(
            "INSERT INTO members (first_name, last_name, date_of_birth, gender, phone_number,
                email, address, join_date, membership_status)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                self.first_name,
                self.last_name,
                self.date_of_birth,
                self.gender,
                self.phone_number,
                self.email,
                self.address,
                self.join_date,
                self.membership_status,
            ],
        )
        .map_err(|e| sql_error("insert member", e))?;

        let id = conn.last_insert_rowid();
        self.id = Some(id);
        debug!("inserted member {id} ({})", self.full_name());
        Ok(id)
    }

    /// Apply a partial update. Blank text values are ignored.
    ///
    /// Fails with `NotFound` if no member has this id.
    pub fn update(conn: &Connection, id: i64, patch: &MemberPatch) -> FlockResult<()> {
        let changed = conn
            .execute(
                "UPDATE members SET
                    first_name = COALESCE(?2, first_name),
                    last_name = COALESCE(?3, last_name),
                    date_of_birth = COALESCE(?4, date_of_birth),
                    gender = COALESCE(?5, gender),
                    phone_number = COALESCE(?6, phone_number),
                    email = COALESCE(?7, email),
                    address = COALESCE(?8, address),
                    join_date = COALESCE(?9, join_date),
                    membership_status = COALESCE(?10, membership_status)
                 WHERE id = ?1",
                params![
                    id,
                    non_blank(patch.first_name.as_deref()),
                    non_blank(patch.last_name.as_deref()),
                    patch.date_of_birth,
                    patch.gender,
                    non_blank(patch.phone_number.as_deref()),
                    non_blank(patch.email.as_deref()),
                    non_blank(patch.address.as_deref()),
                    patch.join_date,
                    patch.membership_status,
                ],
            )
            .map_err(|e| sql_error("update member", e))?;

        if changed == 0 {
            return Err(FlockError::NotFound(format!("member {id}")));
        }
        Ok(())
    }

    /// Delete a member. Demographics and volunteering rows go with it.
    pub fn delete(conn: &Connection, id: i64) -> FlockResult<()> {
        let changed = conn
            .execute("DELETE FROM members WHERE id = ?1", [id])
            .map_err(|e| sql_error("delete member", e))?;
        if changed == 0 {
            return Err(FlockError::NotFound(format!("member {id}")));
        }
        debug!("deleted member {id}");
        Ok(())
    }

    // ─── Finders ─────────────────────────────────────────────────────────

    /// Find a member by id.
    pub fn find_by_id(conn: &Connection, id: i64) -> FlockResult<Option<Self>> {
        optional_row(
            "find member by id",
            conn.query_row("SELECT * FROM members WHERE id = ?1", [id], Self::from_row),
        )
    }

    /// Find the member holding an email address.
    pub fn find_by_email(conn: &Connection, email: &str) -> FlockResult<Option<Self>> {
        optional_row(
            "find member by email",
            conn.query_row(
                "SELECT * FROM members WHERE email = ?1",
                [email.trim()],
                Self::from_row,
            ),
        )
    }

    /// All members with this exact first and last name.
    pub fn find_by_name(conn: &Connection, first_name: &str, last_name: &str) -> FlockResult<Vec<Self>> {
        let mut stmt = conn
            .prepare("SELECT * FROM members WHERE first_name = ?1 AND last_name = ?2 ORDER BY id")
            .map_err(|e| sql_error("find members by name", e))?;
        let rows = stmt
            .query_map([first_name.trim(), last_name.trim()], Self::from_row)
            .map_err(|e| sql_error("find members by name", e))?;
        collect_rows("find members by name", rows)
    }

    /// Find a member by name and date of birth. A `None` birth date matches
    /// members with no recorded birth date.
    pub fn find_by_identity(
        conn: &Connection,
        first_name: &str,
        last_name: &str,
        date_of_birth: Option<NaiveDate>,
    ) -> FlockResult<Option<Self>> {
        optional_row(
            "find member by identity",
            conn.query_row(
                "SELECT * FROM members
                 WHERE first_name = ?1 AND last_name = ?2 AND date_of_birth IS ?3
                 ORDER BY id LIMIT 1",
                params![first_name.trim(), last_name.trim(), date_of_birth],
                Self::from_row,
            ),
        )
    }

    /// Load every member in id order.
    pub fn load_all(conn: &Connection) -> FlockResult<Vec<Self>> {
        let mut stmt = conn
            .prepare("SELECT * FROM members ORDER BY id")
            .map_err(|e| sql_error("load members", e))?;
        let rows = stmt
            .query_map([], Self::from_row)
            .map_err(|e| sql_error("load members", e))?;
        collect_rows("load members", rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema;

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys=ON;").unwrap();
        schema::create_tables(&conn).unwrap();
        conn
    }

    fn sample() -> Member {
        Member {
            id: None,
            first_name: "Lerato".into(),
            last_name: "Mokoena".into(),
            date_of_birth: NaiveDate::from_ymd_opt(1990, 4, 12),
            gender: Some(Gender::Female),
            phone_number: Some("+27821234567".into()),
            email: Some("lerato@example.org".into()),
            address: Some("12 Church St".into()),
            join_date: NaiveDate::from_ymd_opt(2015, 1, 4),
            membership_status: Some(MembershipStatus::Active),
        }
    }

    #[test]
    fn test_insert_and_find() {
        let conn = conn();
        let mut member = sample();
        let id = member.insert(&conn).unwrap();

        let loaded = Member::find_by_id(&conn, id).unwrap().unwrap();
        assert_eq!(loaded, member);
    }

    #[test]
    fn test_duplicate_email_is_constraint_violation() {
        let conn = conn();
        sample().insert(&conn).unwrap();

        let mut other = Member::new("Sipho", "Dlamini");
        other.email = Some("lerato@example.org".into());
        let err = other.insert(&conn).unwrap_err();
        assert!(err.is_constraint_violation());
    }

    #[test]
    fn test_blank_emails_do_not_collide() {
        let conn = conn();
        let mut a = Member::new("A", "One");
        a.email = Some("   ".into());
        a.insert(&conn).unwrap();
        let mut b = Member::new("B", "Two");
        b.email = Some(String::new());
        b.insert(&conn).unwrap();
        assert_eq!(Member::load_all(&conn).unwrap().len(), 2);
    }

    #[test]
    fn test_missing_name_rejected() {
        let conn = conn();
        let err = Member::new(" ", "Doe").insert(&conn).unwrap_err();
        assert!(matches!(err, FlockError::Validation(_)));
    }

    #[test]
    fn test_partial_update_keeps_other_fields() {
        let conn = conn();
        let mut member = sample();
        let id = member.insert(&conn).unwrap();

        let patch = MemberPatch {
            phone_number: Some("+27829999999".into()),
            email: Some("  ".into()),
            ..Default::default()
        };
        Member::update(&conn, id, &patch).unwrap();

        let loaded = Member::find_by_id(&conn, id).unwrap().unwrap();
        assert_eq!(loaded.phone_number.as_deref(), Some("+27829999999"));
        assert_eq!(loaded.first_name, member.first_name);
        assert_eq!(loaded.email, member.email);
        assert_eq!(loaded.date_of_birth, member.date_of_birth);
    }

    #[test]
    fn test_update_missing_is_not_found() {
        let conn = conn();
        let patch = MemberPatch {
            first_name: Some("X".into()),
            ..Default::default()
        };
        assert!(Member::update(&conn, 99, &patch).unwrap_err().is_not_found());
        assert!(Member::delete(&conn, 99).unwrap_err().is_not_found());
    }

    #[test]
    fn test_find_by_identity_handles_null_birth_date() {
        let conn = conn();
        Member::new("Themba", "Zulu").insert(&conn).unwrap();

        assert!(Member::find_by_identity(&conn, "Themba", "Zulu", None).unwrap().is_some());
        let dob = NaiveDate::from_ymd_opt(1980, 1, 1);
        assert!(Member::find_by_identity(&conn, "Themba", "Zulu", dob).unwrap().is_none());
    }

    #[test]
    fn test_enum_labels() {
        assert_eq!("female".parse::<Gender>().unwrap(), Gender::Female);
        assert_eq!(MembershipStatus::Inactive.to_string(), "Inactive");
        assert!("Unknown".parse::<Gender>().is_err());
    }
}
