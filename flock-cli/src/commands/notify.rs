//! Notification commands - run the daily job now, run it on a schedule, or
//! inspect what has been sent.

use std::sync::Arc;

use chrono::{Local, NaiveDate};
use clap::Subcommand;
use console::style;
use tokio::sync::watch;
use tracing::info;

use flock_api::{MessagingClient, MessagingProvider};
use flock_core::config::ConfigHandle;
use flock_core::error::FlockResult;
use flock_models::SentNotification;
use flock_services::{DailyScheduler, JobReport, NotificationJob, Service};

use super::{new_table, parse_date, print_json};
use crate::OutputFormat;

#[derive(Subcommand)]
pub enum NotifyAction {
    /// Run reminders and birthday greetings once.
    Run {
        /// Run as if today were this date (YYYY-MM-DD).
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
        /// Only event reminders.
        #[arg(long, conflicts_with = "birthdays_only")]
        reminders_only: bool,
        /// Only birthday greetings.
        #[arg(long)]
        birthdays_only: bool,
    },
    /// Run the job every day at the configured send time until interrupted.
    Daemon,
    /// Show recently sent notifications.
    History {
        #[arg(short = 'n', long, default_value = "20")]
        limit: u32,
    },
}

pub async fn run(config: ConfigHandle, action: NotifyAction, format: OutputFormat) -> FlockResult<()> {
    let db = super::init_database(&config).await?;

    match action {
        NotifyAction::Run {
            date,
            reminders_only,
            birthdays_only,
        } => {
            let job = build_job(&config, db).await?;
            let today = date.unwrap_or_else(|| Local::now().date_naive());

            let report = if reminders_only {
                job.run_reminders(today).await?
            } else if birthdays_only {
                job.run_birthdays(today).await?
            } else {
                job.run_daily(today).await?
            };

            match format {
                OutputFormat::Json => print_json(&report)?,
                OutputFormat::Text => print_report(&report),
            }
        }
        NotifyAction::Daemon => {
            let job = Arc::new(build_job(&config, db).await?);
            let scheduler = DailyScheduler::new(job)?;
            println!(
                "  {} Sending daily at {}. Press Ctrl+C to stop.",
                style("...").dim(),
                scheduler.send_time().format("%H:%M")
            );

            let (shutdown_tx, shutdown_rx) = watch::channel(false);
            let handle = scheduler.spawn(shutdown_rx);

            tokio::signal::ctrl_c().await?;
            info!("interrupt received, stopping scheduler");
            let _ = shutdown_tx.send(true);
            let _ = handle.await;
            println!("  {} Scheduler stopped.", style("OK").green().bold());
        }
        NotifyAction::History { limit } => {
            let conn = db.conn()?;
            let entries = SentNotification::load_recent(&conn, limit)?;
            match format {
                OutputFormat::Json => print_json(&entries)?,
                OutputFormat::Text => {
                    if entries.is_empty() {
                        println!("Nothing sent yet.");
                    } else {
                        let mut table = new_table(["Sent", "Kind", "Subject", "Period", "Delivered"]);
                        for e in &entries {
                            table.add_row(vec![
                                e.sent_at.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string(),
                                e.kind.clone(),
                                e.subject_id.to_string(),
                                e.period_key.clone(),
                                format!("{}/{}", e.delivered, e.attempted),
                            ]);
                        }
                        println!("{table}");
                    }
                }
            }
        }
    }

    Ok(())
}

async fn build_job(config: &ConfigHandle, db: flock_models::Database) -> FlockResult<NotificationJob> {
    let config = config.snapshot().await;
    let client = MessagingClient::new(&config.messaging)?;
    info!("delivering through {}", client.name());
    let provider: Arc<dyn MessagingProvider> = Arc::new(client);

    let mut job = NotificationJob::new(db, provider, config.schedule);
    job.init()?;
    Ok(job)
}

fn print_report(report: &JobReport) {
    println!(
        "{}",
        style(format!("Notifications for {}", super::format_date(report.run_date)))
            .bold()
            .underlined()
    );

    if report.notifications.is_empty() {
        println!("  Nothing due.");
    }
    for n in &report.notifications {
        let marker = if n.failures.is_empty() {
            style("OK").green().bold()
        } else if n.delivered.is_empty() {
            style("FAIL").red().bold()
        } else {
            style("WARN").yellow().bold()
        };
        println!(
            "  {marker} {} '{}': {}/{} delivered",
            n.kind,
            n.subject,
            n.delivered.len(),
            n.attempted()
        );
    }

    if report.already_sent > 0 {
        println!("  {} already sent earlier.", report.already_sent);
    }

    if report.failure_count() > 0 {
        println!();
        println!("{}", style("Failures").bold().underlined());
        for f in report.failures() {
            println!(
                "    - member {} ({}): {}",
                f.member_id,
                f.recipient.as_deref().unwrap_or("no phone"),
                f.error
            );
        }
    }
}
