//! Shared test utilities for integration tests.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime, Utc};
use tempfile::TempDir;

use flock_api::{DeliveryReceipt, MessagingProvider};
use flock_core::config::{DatabaseConfig, ScheduleConfig};
use flock_core::error::{FlockError, FlockResult};
use flock_models::{
    Database, DemographicsPatch, EducationLevel, Event, Involvement, MaritalStatus, Member,
    MembershipStatus, YesNo,
};
use flock_services::{EventService, MemberService};

/// Create a temporary database with full schema and migrations applied.
/// Returns the Database and the TempDir (must be held alive for the duration of the test).
pub fn create_test_db() -> (Database, TempDir) {
    let dir = TempDir::new().expect("failed to create temp dir");
    let path = dir.path().join("test.db");
    let config = DatabaseConfig::default();
    let db = Database::init(&path, &config).expect("failed to init test database");
    (db, dir)
}

/// Schedule with the default five-day lead and every part enabled.
pub fn create_test_schedule() -> ScheduleConfig {
    ScheduleConfig::default()
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

pub fn event(name: &str, on: NaiveDate) -> Event {
    Event {
        id: None,
        name: name.to_string(),
        date: on,
        start_time: NaiveTime::from_hms_opt(10, 0, 0).expect("valid time"),
        end_time: NaiveTime::from_hms_opt(12, 0, 0).expect("valid time"),
        location: "Main Hall".to_string(),
        description: None,
    }
}

/// Seed the database with a small congregation.
///
/// Creates:
/// - 6 members, 5 with demographics (one has none)
/// - 2 married, 3 with children, 2 Before Matric, 1 disabled
/// - 2 Servers, 1 Officer
/// - member 6 is Inactive and has no phone
/// - 2 events: "Youth Day" 2025-01-10 and "Prayer Night" 2025-01-15
pub fn seed_test_data(db: &Database) -> Vec<i64> {
    let members = MemberService::new(db.clone());
    let rows: [(&str, Option<&str>, Option<DemographicsPatch>); 6] = [
        ("Sipho", Some("+27820000001"), Some(demo(MaritalStatus::Married, 2, EducationLevel::College, Involvement::Server, YesNo::No))),
        ("Lindiwe", Some("+27820000002"), Some(demo(MaritalStatus::Married, 0, EducationLevel::BeforeMatric, Involvement::Congregant, YesNo::No))),
        ("Pieter", Some("+27820000003"), Some(demo(MaritalStatus::NeverMarried, 1, EducationLevel::BeforeMatric, Involvement::Officer, YesNo::Yes))),
        ("Fatima", Some("+27820000004"), Some(demo(MaritalStatus::Widowed, 3, EducationLevel::PostGrad, Involvement::Server, YesNo::No))),
        ("Johan", Some("+27820000005"), Some(DemographicsPatch::default())),
        ("Nomsa", None, None),
    ];

    let mut ids = Vec::new();
    for (i, (first, phone, demographics)) in rows.into_iter().enumerate() {
        let mut member = Member::new(first, "Seed");
        member.email = Some(format!("{}@example.org", first.to_lowercase()));
        member.phone_number = phone.map(String::from);
        member.date_of_birth = Some(date(1980 + i as i32, 5, 20));
        member.join_date = Some(date(2010 + i as i32, 1, 1));
        member.membership_status = Some(if phone.is_some() {
            MembershipStatus::Active
        } else {
            MembershipStatus::Inactive
        });
        let created = members
            .create_member(member, demographics)
            .expect("failed to seed member");
        ids.push(created.id.expect("seeded member has id"));
    }

    let events = EventService::new(db.clone());
    events.add_event(event("Youth Day", date(2025, 1, 10))).expect("failed to seed event");
    events.add_event(event("Prayer Night", date(2025, 1, 15))).expect("failed to seed event");

    ids
}

fn demo(
    marital: MaritalStatus,
    children: u32,
    education: EducationLevel,
    involvement: Involvement,
    disability: YesNo,
) -> DemographicsPatch {
    DemographicsPatch {
        marital_status: Some(marital),
        children: Some(children),
        household_size: Some(children + 2),
        occupation: None,
        education_level: Some(education),
        attendance: None,
        involvement: Some(involvement),
        disability: Some(disability),
    }
}

/// Provider that records every send and fails for configured numbers.
#[derive(Default)]
pub struct RecordingProvider {
    sent: Mutex<Vec<(String, String)>>,
    failing: HashSet<String>,
}

impl RecordingProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every send to these numbers.
    pub fn failing_for(numbers: &[&str]) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            failing: numbers.iter().map(|n| n.to_string()).collect(),
        }
    }

    /// (recipient, body) pairs accepted so far.
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().expect("provider lock").clone()
    }
}

#[async_trait]
impl MessagingProvider for RecordingProvider {
    fn name(&self) -> &str {
        "recording"
    }

    async fn send(&self, to: &str, body: &str) -> FlockResult<DeliveryReceipt> {
        if self.failing.contains(to) {
            return Err(FlockError::Delivery {
                recipient: to.to_string(),
                message: "unreachable".to_string(),
            });
        }
        let mut sent = self.sent.lock().expect("provider lock");
        sent.push((to.to_string(), body.to_string()));
        Ok(DeliveryReceipt {
            recipient: to.to_string(),
            message_id: Some(format!("SM{}", sent.len())),
            status: "queued".to_string(),
            accepted_at: Utc::now(),
        })
    }
}
