//! Daily notification job against a real store and a recording provider.

mod common;

use std::sync::Arc;

use common::{create_test_db, create_test_schedule, date, event, seed_test_data, RecordingProvider};
use flock_core::constants::notification_kind;
use flock_models::{Member, SentNotification};
use flock_services::{EventService, MemberService, NotificationJob};

fn job(db: &flock_models::Database, provider: Arc<RecordingProvider>) -> NotificationJob {
    NotificationJob::new(db.clone(), provider, create_test_schedule())
}

#[tokio::test]
async fn test_reminders_go_to_whole_roster() {
    let (db, _dir) = create_test_db();
    seed_test_data(&db);
    EventService::new(db.clone())
        .add_event(event("Elders Meeting", date(2025, 1, 10)))
        .unwrap();
    let provider = Arc::new(RecordingProvider::new());

    // Five days before Youth Day and the Elders Meeting.
    let report = job(&db, provider.clone()).run_reminders(date(2025, 1, 5)).await.unwrap();

    assert_eq!(report.notifications.len(), 2);
    assert_eq!(report.delivered_count(), 10);
    // Nomsa has no phone and is not on the roster.
    assert_eq!(report.failure_count(), 0);

    let sent = provider.sent();
    assert_eq!(sent.len(), 10);
    assert!(sent.iter().any(|(_, body)| body
        == "Reminder: The event 'Youth Day' is scheduled for 2025-01-10 at 10:00."));
}

#[tokio::test]
async fn test_rerun_same_day_sends_nothing() {
    let (db, _dir) = create_test_db();
    seed_test_data(&db);
    let provider = Arc::new(RecordingProvider::new());
    let job = job(&db, provider.clone());

    let first = job.run_daily(date(2025, 1, 5)).await.unwrap();
    assert_eq!(first.delivered_count(), 5);

    let second = job.run_daily(date(2025, 1, 5)).await.unwrap();
    assert_eq!(second.delivered_count(), 0);
    assert_eq!(second.already_sent, 1);
    assert_eq!(provider.sent().len(), 5);
}

#[tokio::test]
async fn test_failed_recipient_does_not_abort_batch() {
    let (db, _dir) = create_test_db();
    seed_test_data(&db);
    let provider = Arc::new(RecordingProvider::failing_for(&["+27820000002"]));

    let report = job(&db, provider.clone()).run_reminders(date(2025, 1, 5)).await.unwrap();

    assert_eq!(report.delivered_count(), 4);
    assert_eq!(report.failure_count(), 1);
    let failure = report.failures().next().unwrap();
    assert_eq!(failure.recipient.as_deref(), Some("+27820000002"));

    // Partial success is recorded.
    let conn = db.conn().unwrap();
    let event_id = report.notifications[0].subject_id;
    assert!(SentNotification::exists(&conn, notification_kind::REMINDER, event_id, "2025-01-05").unwrap());
}

#[tokio::test]
async fn test_total_failure_is_retried() {
    let (db, _dir) = create_test_db();
    seed_test_data(&db);
    let everyone = [
        "+27820000001",
        "+27820000002",
        "+27820000003",
        "+27820000004",
        "+27820000005",
    ];
    let failing = Arc::new(RecordingProvider::failing_for(&everyone));
    let report = job(&db, failing).run_reminders(date(2025, 1, 5)).await.unwrap();
    assert_eq!(report.failure_count(), 5);

    let working = Arc::new(RecordingProvider::new());
    let retry = job(&db, working.clone()).run_reminders(date(2025, 1, 5)).await.unwrap();
    assert_eq!(retry.already_sent, 0);
    assert_eq!(working.sent().len(), 5);
}

#[tokio::test]
async fn test_reminder_with_empty_roster_is_sent_once_members_join() {
    let (db, _dir) = create_test_db();
    EventService::new(db.clone())
        .add_event(event("Harvest Festival", date(2025, 4, 6)))
        .unwrap();
    let provider = Arc::new(RecordingProvider::new());
    let job = job(&db, provider.clone());

    let empty = job.run_reminders(date(2025, 4, 1)).await.unwrap();
    assert_eq!(empty.notifications.len(), 1);
    assert_eq!(empty.notifications[0].attempted(), 0);
    assert_eq!(db.stats().unwrap().sent_notifications, 0);

    let mut member = Member::new("Zanele", "Mokoena");
    member.phone_number = Some("+27827770000".into());
    MemberService::new(db.clone()).create_member(member, None).unwrap();

    let later = job.run_reminders(date(2025, 4, 1)).await.unwrap();
    assert_eq!(later.already_sent, 0);
    assert_eq!(later.delivered_count(), 1);
    assert_eq!(provider.sent().len(), 1);
    assert_eq!(db.stats().unwrap().sent_notifications, 1);
}

#[tokio::test]
async fn test_no_events_sends_nothing() {
    let (db, _dir) = create_test_db();
    seed_test_data(&db);
    let provider = Arc::new(RecordingProvider::new());

    let report = job(&db, provider.clone()).run_reminders(date(2025, 3, 1)).await.unwrap();
    assert!(report.notifications.is_empty());
    assert!(provider.sent().is_empty());
}

#[tokio::test]
async fn test_birthday_greeting_once_per_year() {
    let (db, _dir) = create_test_db();
    let mut member = Member::new("Mpho", "Sithole");
    member.phone_number = Some("+27829990000".into());
    member.date_of_birth = Some(date(1990, 3, 14));
    MemberService::new(db.clone()).create_member(member, None).unwrap();

    let provider = Arc::new(RecordingProvider::new());
    let job = job(&db, provider.clone());

    let report = job.run_birthdays(date(2025, 3, 14)).await.unwrap();
    assert_eq!(report.delivered_count(), 1);
    assert_eq!(provider.sent()[0], ("+27829990000".to_string(), "Happy Birthday Mpho Sithole!".to_string()));

    let again = job.run_birthdays(date(2025, 3, 14)).await.unwrap();
    assert_eq!(again.already_sent, 1);
    assert_eq!(provider.sent().len(), 1);

    let next_year = job.run_birthdays(date(2026, 3, 14)).await.unwrap();
    assert_eq!(next_year.delivered_count(), 1);
}

#[tokio::test]
async fn test_birthday_without_phone_is_a_failure() {
    let (db, _dir) = create_test_db();
    let mut member = Member::new("Nomsa", "Khumalo");
    member.date_of_birth = Some(date(1985, 7, 1));
    MemberService::new(db.clone()).create_member(member, None).unwrap();

    let provider = Arc::new(RecordingProvider::new());
    let report = job(&db, provider.clone()).run_birthdays(date(2025, 7, 1)).await.unwrap();

    assert_eq!(report.failure_count(), 1);
    assert_eq!(report.failures().next().unwrap().recipient, None);
    assert!(provider.sent().is_empty());
}
