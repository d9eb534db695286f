//! Flock CLI - command-line front end for the church membership records.
//!
//! Drives the service layer directly: member and event administration,
//! volunteering, demographic reports, member import, and the daily
//! notification job (one-shot or as a long-running scheduler).

mod commands;

use clap::{Parser, Subcommand};
use tracing::info;

use flock_core::config::{AppConfig, ConfigHandle};
use flock_core::error::FlockResult;
use flock_core::logging;

/// Flock - church membership records and notifications.
#[derive(Parser)]
#[command(
    name = "flock",
    version,
    about = "Church membership records CLI",
    long_about = "A command-line interface for Flock church membership records.\n\
                   Keeps members, events and volunteering in one SQLite file and sends\n\
                   event reminders and birthday greetings through a messaging provider."
)]
struct Cli {
    /// Path to the configuration file.
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Enable verbose logging (debug level).
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format (text, json).
    #[arg(short = 'f', long, global = true, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// JSON output for scripting.
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Register, edit, list, and remove members.
    Members {
        #[command(subcommand)]
        action: commands::members::MembersAction,
    },
    /// Manage the event calendar.
    Events {
        #[command(subcommand)]
        action: commands::events::EventsAction,
    },
    /// Volunteer opportunities and assignments.
    Volunteers {
        #[command(subcommand)]
        action: commands::volunteers::VolunteersAction,
    },
    /// Demographic reports.
    Reports {
        #[command(subcommand)]
        action: commands::reports::ReportsAction,
    },
    /// Event reminders and birthday greetings.
    Notify {
        #[command(subcommand)]
        action: commands::notify::NotifyAction,
    },
    /// Database management commands.
    Db {
        #[command(subcommand)]
        action: commands::db::DbAction,
    },
}

#[tokio::main]
async fn main() -> FlockResult<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = match cli.config.as_deref() {
        Some(path) => AppConfig::load_from_file(std::path::Path::new(path))?,
        None => AppConfig::load_default()?,
    };

    let log_dir = config
        .effective_log_dir()
        .unwrap_or_else(|_| std::path::PathBuf::from("logs"));
    let _guard = logging::init_from_config(&config.logging, &log_dir, cli.verbose)?;

    let config_handle = ConfigHandle::new(config);

    info!("Flock CLI v{}", flock_core::constants::APP_VERSION);

    // Dispatch to command handlers
    match cli.command {
        Commands::Members { action } => {
            commands::members::run(config_handle, action, cli.format).await
        }
        Commands::Events { action } => {
            commands::events::run(config_handle, action, cli.format).await
        }
        Commands::Volunteers { action } => {
            commands::volunteers::run(config_handle, action, cli.format).await
        }
        Commands::Reports { action } => {
            commands::reports::run(config_handle, action, cli.format).await
        }
        Commands::Notify { action } => {
            commands::notify::run(config_handle, action, cli.format).await
        }
        Commands::Db { action } => {
            commands::db::run(config_handle, action, cli.format).await
        }
    }
}
