//! Daily notification job: event reminders and birthday greetings.
//!
//! Reminders go out `reminder_lead_days` before each event, to every member
//! with a phone number. Birthday greetings go to the member whose birthday
//! it is. Every send is attempted even if earlier ones fail; failures are
//! collected into the [`JobReport`].
//!
//! The `sent_notifications` ledger makes the job safe to re-run: a reminder
//! is recorded per (event, send day) and a greeting per (member, year), and
//! recorded items are skipped. Nothing is recorded when every recipient
//! failed, so a later run retries.

use std::sync::Arc;

use chrono::{Datelike, Days, NaiveDate};
use serde::Serialize;
use tracing::{debug, info, warn};

use flock_api::{DeliveryReceipt, MessagingProvider};
use flock_core::config::ScheduleConfig;
use flock_core::constants::{notification_kind, DATE_FORMAT};
use flock_core::error::{FlockError, FlockResult};
use flock_models::queries::{self, MemberContact};
use flock_models::{Database, Event, Member, SentNotification};

use crate::service::{Service, ServiceState};

/// One recipient the provider did not accept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SendFailure {
    pub member_id: i64,
    pub recipient: Option<String>,
    pub error: String,
}

/// Result of one reminder or greeting.
#[derive(Debug, Clone, Serialize)]
pub struct NotificationOutcome {
    pub kind: String,
    /// Event id for reminders, member id for greetings.
    pub subject_id: i64,
    /// Event name or member name.
    pub subject: String,
    pub body: String,
    pub delivered: Vec<DeliveryReceipt>,
    pub failures: Vec<SendFailure>,
}

impl NotificationOutcome {
    fn new(kind: &str, subject_id: i64, subject: String, body: String) -> Self {
        Self {
            kind: kind.to_string(),
            subject_id,
            subject,
            body,
            delivered: Vec::new(),
            failures: Vec::new(),
        }
    }

    pub fn attempted(&self) -> usize {
        self.delivered.len() + self.failures.len()
    }
}

/// Everything one run of the job did.
#[derive(Debug, Clone, Serialize)]
pub struct JobReport {
    pub run_date: NaiveDate,
    pub notifications: Vec<NotificationOutcome>,
    /// Items skipped because the ledger shows them already sent.
    pub already_sent: usize,
}

impl JobReport {
    fn new(run_date: NaiveDate) -> Self {
        Self {
            run_date,
            notifications: Vec::new(),
            already_sent: 0,
        }
    }

    fn merge(&mut self, other: JobReport) {
        self.notifications.extend(other.notifications);
        self.already_sent += other.already_sent;
    }

    /// Messages accepted by the provider.
    pub fn delivered_count(&self) -> usize {
        self.notifications.iter().map(|n| n.delivered.len()).sum()
    }

    /// Every failed send across the run.
    pub fn failures(&self) -> impl Iterator<Item = &SendFailure> {
        self.notifications.iter().flat_map(|n| n.failures.iter())
    }

    pub fn failure_count(&self) -> usize {
        self.failures().count()
    }
}

/// Reminder text for an event.
pub fn reminder_message(event: &Event) -> String {
    format!(
        "Reminder: The event '{}' is scheduled for {} at {}.",
        event.name,
        event.date.format(DATE_FORMAT),
        event.start_time.format("%H:%M")
    )
}

/// Greeting text for a member.
pub fn birthday_message(member: &Member) -> String {
    format!("Happy Birthday {} {}!", member.first_name, member.last_name)
}

/// Whether someone born on `date_of_birth` has a birthday on `today`.
///
/// 29 February birthdays fall on 28 February in non-leap years.
pub fn is_birthday(date_of_birth: NaiveDate, today: NaiveDate) -> bool {
    if date_of_birth.month() == today.month() && date_of_birth.day() == today.day() {
        return true;
    }
    let leap_day = date_of_birth.month() == 2 && date_of_birth.day() == 29;
    let feb_28 = today.month() == 2 && today.day() == 28;
    leap_day && feb_28 && NaiveDate::from_ymd_opt(today.year(), 2, 29).is_none()
}

/// The reminder and birthday job.
pub struct NotificationJob {
    state: ServiceState,
    database: Database,
    provider: Arc<dyn MessagingProvider>,
    schedule: ScheduleConfig,
}

impl NotificationJob {
    pub fn new(database: Database, provider: Arc<dyn MessagingProvider>, schedule: ScheduleConfig) -> Self {
        Self {
            state: ServiceState::Created,
            database,
            provider,
            schedule,
        }
    }

    pub fn schedule(&self) -> &ScheduleConfig {
        &self.schedule
    }

    /// Run every enabled part of the job for `today`.
    pub async fn run_daily(&self, today: NaiveDate) -> FlockResult<JobReport> {
        info!("notification job starting for {today} via {}", self.provider.name());
        let mut report = JobReport::new(today);

        if self.schedule.reminders_enabled {
            report.merge(self.run_reminders(today).await?);
        }
        if self.schedule.birthdays_enabled {
            report.merge(self.run_birthdays(today).await?);
        }

        info!(
            "notification job finished: {} delivered, {} failed, {} already sent",
            report.delivered_count(),
            report.failure_count(),
            report.already_sent
        );
        Ok(report)
    }

    /// Send a reminder for every event `reminder_lead_days` after `today`
    /// to the whole roster.
    pub async fn run_reminders(&self, today: NaiveDate) -> FlockResult<JobReport> {
        let mut report = JobReport::new(today);
        let target = today
            .checked_add_days(Days::new(u64::from(self.schedule.reminder_lead_days)))
            .ok_or_else(|| FlockError::Internal(format!("reminder date overflow from {today}")))?;
        let period_key = today.format(DATE_FORMAT).to_string();

        let (events, roster) = {
            let conn = self.database.conn()?;
            let events = queries::events_on(&conn, target)?;
            let roster = queries::members_with_phone(&conn, self.schedule.active_members_only)?;
            (events, roster)
        };
        debug!("{} events on {target}, roster of {}", events.count(), roster.count());

        for event in events {
            let Some(event_id) = event.id else { continue };
            if self.already_sent(notification_kind::REMINDER, event_id, &period_key)? {
                report.already_sent += 1;
                continue;
            }

            let mut outcome = NotificationOutcome::new(
                notification_kind::REMINDER,
                event_id,
                event.name.clone(),
                reminder_message(&event),
            );
            for contact in roster.iter() {
                self.deliver(contact, &mut outcome).await;
            }

            self.record(&outcome, &period_key)?;
            report.notifications.push(outcome);
        }

        Ok(report)
    }

    /// Greet every member whose birthday is `today`.
    pub async fn run_birthdays(&self, today: NaiveDate) -> FlockResult<JobReport> {
        let mut report = JobReport::new(today);
        let period_key = today.year().to_string();

        let candidates = {
            let conn = self.database.conn()?;
            queries::members_with_birth_date(&conn)?
        };

        for member in candidates {
            let (Some(member_id), Some(dob)) = (member.id, member.date_of_birth) else {
                continue;
            };
            if !is_birthday(dob, today) {
                continue;
            }
            if self.already_sent(notification_kind::BIRTHDAY, member_id, &period_key)? {
                report.already_sent += 1;
                continue;
            }

            let mut outcome = NotificationOutcome::new(
                notification_kind::BIRTHDAY,
                member_id,
                member.full_name(),
                birthday_message(&member),
            );
            let contact = MemberContact {
                id: member_id,
                first_name: member.first_name.clone(),
                last_name: member.last_name.clone(),
                phone_number: member.phone_number.clone(),
            };
            self.deliver(&contact, &mut outcome).await;

            self.record(&outcome, &period_key)?;
            report.notifications.push(outcome);
        }

        Ok(report)
    }

    /// Send one message, recording the receipt or the failure.
    async fn deliver(&self, contact: &MemberContact, outcome: &mut NotificationOutcome) {
        let Some(phone) = contact.phone_number.as_deref().map(str::trim).filter(|p| !p.is_empty()) else {
            outcome.failures.push(SendFailure {
                member_id: contact.id,
                recipient: None,
                error: "no phone number".to_string(),
            });
            return;
        };

        match self.provider.send(phone, &outcome.body).await {
            Ok(receipt) => outcome.delivered.push(receipt),
            Err(e) => {
                warn!("{} to member {} failed: {e}", outcome.kind, contact.id);
                outcome.failures.push(SendFailure {
                    member_id: contact.id,
                    recipient: Some(phone.to_string()),
                    error: e.to_string(),
                });
            }
        }
    }

    fn already_sent(&self, kind: &str, subject_id: i64, period_key: &str) -> FlockResult<bool> {
        let conn = self.database.conn()?;
        SentNotification::exists(&conn, kind, subject_id, period_key)
    }

    /// Write the ledger entry once at least one send was accepted.
    fn record(&self, outcome: &NotificationOutcome, period_key: &str) -> FlockResult<()> {
        if outcome.attempted() == 0 {
            debug!("{} for {} not recorded: no recipients", outcome.kind, outcome.subject);
            return Ok(());
        }
        if outcome.delivered.is_empty() {
            warn!(
                "{} for {} not recorded: all {} sends failed",
                outcome.kind,
                outcome.subject,
                outcome.failures.len()
            );
            return Ok(());
        }

        let mut entry = SentNotification::new(&outcome.kind, outcome.subject_id, period_key);
        entry.attempted = outcome.attempted() as u32;
        entry.delivered = outcome.delivered.len() as u32;
        self.database.transaction(|conn| entry.record(conn))?;
        Ok(())
    }
}

impl Service for NotificationJob {
    fn name(&self) -> &str {
        "notifications"
    }

    fn state(&self) -> ServiceState {
        self.state
    }

    fn init(&mut self) -> FlockResult<()> {
        self.state = ServiceState::Initializing;
        self.schedule.send_time()?;
        self.state = ServiceState::Running;
        info!(
            "notification job ready: daily at {}, reminders {} days ahead",
            self.schedule.send_time, self.schedule.reminder_lead_days
        );
        Ok(())
    }

    fn shutdown(&mut self) -> FlockResult<()> {
        self.state = ServiceState::Stopped;
        info!("notification job stopped");
        Ok(())
    }
}
