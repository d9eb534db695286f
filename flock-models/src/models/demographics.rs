//! Demographics: the 1:1 profile extension of a member.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use flock_core::error::{FlockError, FlockResult};

use super::non_blank;
use crate::sql::{optional_row, sql_error};

labelled_enum! {
    MaritalStatus {
        Married => "Married",
        NeverMarried => "Never Married" | "Single",
        Divorced => "Divorced",
        Widowed => "Widowed",
    }
}

labelled_enum! {
    /// Highest education reached. Variants are ordered from lowest to highest.
    EducationLevel {
        BeforeMatric => "Before Matric" | "No Matric",
        PassedMatric => "Passed Matric" | "High School" | "Matric",
        College => "College",
        Bachelors => "Bachelor's Degree" | "Bachelors",
        PostGrad => "Post Grad" | "Postgraduate",
    }
}

labelled_enum! {
    /// How often a member attends services.
    Attendance {
        Weekly => "Weekly",
        BiWeekly => "Bi-weekly",
        Monthly => "Monthly",
        Rarely => "Rarely",
    }
}

labelled_enum! {
    /// Involvement tier. Servers and Officers are office bearers.
    Involvement {
        Congregant => "Congregant",
        Server => "Server",
        Officer => "Officer",
    }
}

labelled_enum! {
    YesNo {
        Yes => "Yes" | "Y" | "True",
        No => "No" | "N" | "False",
    }
}

impl Involvement {
    /// Whether this tier holds office.
    pub fn is_office_bearer(&self) -> bool {
        matches!(self, Involvement::Server | Involvement::Officer)
    }
}

/// Demographic profile of one member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Demographics {
    pub id: Option<i64>,
    pub member_id: i64,
    pub marital_status: Option<MaritalStatus>,
    pub children: u32,
    /// Number of people living in the member's household.
    pub household_size: u32,
    pub occupation: Option<String>,
    pub education_level: Option<EducationLevel>,
    pub attendance: Option<Attendance>,
    pub involvement: Option<Involvement>,
    pub disability: Option<YesNo>,
}

/// Demographic fields to change. `None` keeps the stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DemographicsPatch {
    pub marital_status: Option<MaritalStatus>,
    pub children: Option<u32>,
    pub household_size: Option<u32>,
    pub occupation: Option<String>,
    pub education_level: Option<EducationLevel>,
    pub attendance: Option<Attendance>,
    pub involvement: Option<Involvement>,
    pub disability: Option<YesNo>,
}

impl DemographicsPatch {
    /// Build a full profile for `member_id` from this patch, zeroing unset counts.
    pub fn into_demographics(self, member_id: i64) -> Demographics {
        Demographics {
            id: None,
            member_id,
            marital_status: self.marital_status,
            children: self.children.unwrap_or(0),
            household_size: self.household_size.unwrap_or(0),
            occupation: non_blank(self.occupation.as_deref()).map(String::from),
            education_level: self.education_level,
            attendance: self.attendance,
            involvement: self.involvement,
            disability: self.disability,
        }
    }
}

impl Demographics {
    /// An empty profile for a member.
    pub fn for_member(member_id: i64) -> Self {
        DemographicsPatch::default().into_demographics(member_id)
    }

    /// Construct Demographics from a database row.
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            member_id: row.get("member_id")?,
            marital_status: row.get("marital_status")?,
            children: row.get("children")?,
            household_size: row.get("family_at_home")?,
            occupation: row.get("occupation")?,
            education_level: row.get("education_level")?,
            attendance: row.get("attendance")?,
            involvement: row.get("involvement")?,
            disability: row.get("disabilities")?,
        })
    }

    /// Insert this profile. A second profile for the same member, or a
    /// missing member, fails with `ConstraintViolation`.
    pub fn insert(&mut self, conn: &Connection) -> FlockResult<i64> {
        conn.execute(
            "INSERT INTO demographics (member_id, marital_status, children, family_at_home,
                occupation, education_level, attendance, involvement, disabilities)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                self.member_id,
                self.marital_status,
                self.children,
                self.household_size,
                non_blank(self.occupation.as_deref()),
                self.education_level,
                self.attendance,
                self.involvement,
                self.disability,
            ],
        )
        .map_err(|e| sql_error("insert demographics", e))?;

        let id = conn.last_insert_rowid();
        self.id = Some(id);
        Ok(id)
    }

    /// Apply a partial update to a member's profile.
    ///
    /// Fails with `NotFound` if the member has no profile.
    pub fn update(conn: &Connection, member_id: i64, patch: &DemographicsPatch) -> FlockResult<()> {
        let changed = conn
            .execute(
                "UPDATE demographics SET
                    marital_status = COALESCE(?2, marital_status),
                    children = COALESCE(?3, children),
                    family_at_home = COALESCE(?4, family_at_home),
                    occupation = COALESCE(?5, occupation),
                    education_level = COALESCE(?6, education_level),
                    attendance = COALESCE(?7, attendance),
                    involvement = COALESCE(?8, involvement),
                    disabilities = COALESCE(?9, disabilities)
                 WHERE member_id = ?1",
                params![
                    member_id,
                    patch.marital_status,
                    patch.children,
                    patch.household_size,
                    non_blank(patch.occupation.as_deref()),
                    patch.education_level,
                    patch.attendance,
                    patch.involvement,
                    patch.disability,
                ],
            )
            .map_err(|e| sql_error("update demographics", e))?;

        if changed == 0 {
            return Err(FlockError::NotFound(format!("demographics for member {member_id}")));
        }
        Ok(())
    }

    /// Find the profile of a member.
    pub fn find_by_member(conn: &Connection, member_id: i64) -> FlockResult<Option<Self>> {
        optional_row(
            "find demographics",
            conn.query_row(
                "SELECT * FROM demographics WHERE member_id = ?1",
                [member_id],
                Self::from_row,
            ),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::member::Member;
    use crate::schema;

    fn conn_with_member() -> (Connection, i64) {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys=ON;").unwrap();
        schema::create_tables(&conn).unwrap();
        let id = Member::new("Naledi", "Khumalo").insert(&conn).unwrap();
        (conn, id)
    }

    #[test]
    fn test_insert_and_find() {
        let (conn, member_id) = conn_with_member();
        let mut demo = DemographicsPatch {
            marital_status: Some(MaritalStatus::Married),
            children: Some(2),
            household_size: Some(4),
            occupation: Some("Teacher".into()),
            education_level: Some(EducationLevel::Bachelors),
            attendance: Some(Attendance::BiWeekly),
            involvement: Some(Involvement::Server),
            disability: Some(YesNo::No),
        }
        .into_demographics(member_id);
        demo.insert(&conn).unwrap();

        let loaded = Demographics::find_by_member(&conn, member_id).unwrap().unwrap();
        assert_eq!(loaded, demo);
    }

    #[test]
    fn test_second_profile_rejected() {
        let (conn, member_id) = conn_with_member();
        Demographics::for_member(member_id).insert(&conn).unwrap();
        let err = Demographics::for_member(member_id).insert(&conn).unwrap_err();
        assert!(err.is_constraint_violation());
    }

    #[test]
    fn test_profile_for_missing_member_rejected() {
        let (conn, _) = conn_with_member();
        let err = Demographics::for_member(404).insert(&conn).unwrap_err();
        assert!(err.is_constraint_violation());
    }

    #[test]
    fn test_partial_update() {
        let (conn, member_id) = conn_with_member();
        let mut demo = Demographics::for_member(member_id);
        demo.children = 3;
        demo.insert(&conn).unwrap();

        let patch = DemographicsPatch {
            involvement: Some(Involvement::Officer),
            ..Default::default()
        };
        Demographics::update(&conn, member_id, &patch).unwrap();

        let loaded = Demographics::find_by_member(&conn, member_id).unwrap().unwrap();
        assert_eq!(loaded.involvement, Some(Involvement::Officer));
        assert_eq!(loaded.children, 3);
    }

    #[test]
    fn test_legacy_label_parsing() {
        assert_eq!("Bi_weekly".parse::<Attendance>().unwrap(), Attendance::BiWeekly);
        assert_eq!("Bachelors Degree".parse::<EducationLevel>().unwrap(), EducationLevel::Bachelors);
        assert_eq!("Never_Married".parse::<MaritalStatus>().unwrap(), MaritalStatus::NeverMarried);
        assert_eq!("No_Matric".parse::<EducationLevel>().unwrap(), EducationLevel::BeforeMatric);
        assert!("Sometimes".parse::<Attendance>().is_err());
    }

    #[test]
    fn test_education_is_ordinal() {
        assert!(EducationLevel::BeforeMatric < EducationLevel::PassedMatric);
        assert!(EducationLevel::Bachelors < EducationLevel::PostGrad);
        assert_eq!(EducationLevel::ALL.len(), 5);
    }

    #[test]
    fn test_enum_serde_uses_labels() {
        let json = serde_json::to_string(&EducationLevel::Bachelors).unwrap();
        assert_eq!(json, "\"Bachelor's Degree\"");
        let back: Attendance = serde_json::from_str("\"Bi-weekly\"").unwrap();
        assert_eq!(back, Attendance::BiWeekly);
    }
}
