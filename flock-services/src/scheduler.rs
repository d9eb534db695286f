//! Runs the notification job once a day at a fixed local time.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, NaiveDateTime, NaiveTime};
use tokio::sync::watch;
use tracing::{error, info};

use flock_core::error::FlockResult;

use crate::notification::NotificationJob;

/// The first moment at or after `now` whose wall-clock time is `send_time`,
/// excluding `now` itself.
pub fn next_run_after(now: NaiveDateTime, send_time: NaiveTime) -> NaiveDateTime {
    let today = now.date().and_time(send_time);
    if today > now {
        today
    } else {
        (now.date() + chrono::Days::new(1)).and_time(send_time)
    }
}

/// Daily trigger for the notification job.
pub struct DailyScheduler {
    job: Arc<NotificationJob>,
    send_time: NaiveTime,
}

impl DailyScheduler {
    /// Create a scheduler using the job's configured send time.
    pub fn new(job: Arc<NotificationJob>) -> FlockResult<Self> {
        let send_time = job.schedule().send_time()?;
        Ok(Self { job, send_time })
    }

    pub fn send_time(&self) -> NaiveTime {
        self.send_time
    }

    /// Spawn the scheduling loop. It stops when `shutdown` changes or its
    /// sender is dropped.
    pub fn spawn(self, shutdown: watch::Receiver<bool>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }

    /// Sleep until each send time and run the job, until shutdown.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!("daily scheduler started, sending at {}", self.send_time.format("%H:%M"));

        loop {
            let now = Local::now().naive_local();
            let next = next_run_after(now, self.send_time);
            let wait = (next - now).to_std().unwrap_or(Duration::ZERO);
            info!("next notification run at {next}");

            tokio::select! {
                _ = tokio::time::sleep(wait) => {
                    match self.job.run_daily(next.date()).await {
                        Ok(report) => info!(
                            "daily run for {} done: {} delivered, {} failed",
                            report.run_date,
                            report.delivered_count(),
                            report.failure_count()
                        ),
                        Err(e) => error!("daily notification run failed: {e}"),
                    }
                }
                _ = shutdown.changed() => {
                    info!("daily scheduler shutting down");
                    break;
                }
            }
        }
    }
}
