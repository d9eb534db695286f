//! Database management commands.

use clap::Subcommand;
use console::style;

use flock_core::config::ConfigHandle;
use flock_core::error::FlockResult;
use flock_core::Platform;
use flock_models::migrations::schema_version;

use super::{new_table, print_json};
use crate::OutputFormat;

#[derive(Subcommand)]
pub enum DbAction {
    /// Show row counts per table.
    Stats,
    /// Run an integrity check.
    Check,
    /// Reset the database (WARNING: destroys all data).
    Reset {
        /// Skip the confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },
    /// Show the database file path.
    Path,
}

pub async fn run(config: ConfigHandle, action: DbAction, format: OutputFormat) -> FlockResult<()> {
    let db_path = config.read().await.effective_db_path()?;

    match action {
        DbAction::Stats => {
            let db = super::init_database(&config).await?;
            let stats = db.stats()?;
            let version = schema_version(&*db.conn()?)?;
            let file_size = std::fs::metadata(&db_path).ok().map(|m| m.len());

            match format {
                OutputFormat::Json => {
                    println!("{}", serde_json::json!({
                        "path": db_path.display().to_string(),
                        "schema_version": version,
                        "file_size_bytes": file_size,
                        "tables": stats,
                    }));
                }
                OutputFormat::Text => {
                    println!("{}", style("Database Statistics").bold().underlined());
                    println!("  Path:            {}", db_path.display());
                    println!("  Schema version:  {version}");
                    if let Some(size) = file_size {
                        println!("  File size:       {size} bytes");
                    }
                    println!();

                    let mut table = new_table(["Table", "Row Count"]);
                    table.add_row(vec!["members".to_string(), stats.members.to_string()]);
                    table.add_row(vec!["demographics".to_string(), stats.demographics.to_string()]);
                    table.add_row(vec!["events".to_string(), stats.events.to_string()]);
                    table.add_row(vec![
                        "volunteer_opportunities".to_string(),
                        stats.volunteer_opportunities.to_string(),
                    ]);
                    table.add_row(vec![
                        "member_volunteering".to_string(),
                        stats.member_volunteering.to_string(),
                    ]);
                    table.add_row(vec![
                        "sent_notifications".to_string(),
                        stats.sent_notifications.to_string(),
                    ]);
                    println!("{table}");
                }
            }
        }
        DbAction::Check => {
            println!("  {} Running integrity check...", style("...").dim());
            let db = super::init_database(&config).await?;

            match db.run_integrity_check() {
                Ok(()) => println!(
                    "  {} Integrity check passed.",
                    style("OK").green().bold()
                ),
                Err(e) => println!(
                    "  {} Integrity check failed: {}",
                    style("FAIL").red().bold(),
                    e
                ),
            }

            let conn = db.conn()?;
            let violations: i64 = conn
                .query_row("SELECT COUNT(*) FROM pragma_foreign_key_check", [], |row| row.get(0))
                .unwrap_or(-1);
            match violations {
                0 => println!("  {} Foreign key constraints OK.", style("OK").green().bold()),
                n if n < 0 => println!(
                    "  {} Could not run the foreign key check.",
                    style("WARN").yellow().bold()
                ),
                n => println!(
                    "  {} {n} foreign key violation(s).",
                    style("WARN").yellow().bold()
                ),
            }
        }
        DbAction::Reset { yes } => {
            println!(
                "  {} This will delete ALL members, events and volunteering records.",
                style("WARNING").red().bold()
            );
            println!("  Database: {}", db_path.display());

            if !super::confirm("  Are you sure you want to reset the database?", yes) {
                println!("  Reset cancelled.");
                return Ok(());
            }

            let db = super::init_database(&config).await?;
            db.reset()?;
            println!("  {} Database reset complete.", style("OK").green().bold());
        }
        DbAction::Path => {
            let platform = Platform::current();
            match format {
                OutputFormat::Json => print_json(&serde_json::json!({
                    "path": db_path.display().to_string(),
                    "platform": platform.name(),
                }))?,
                OutputFormat::Text => println!("{} ({platform})", db_path.display()),
            }
        }
    }

    Ok(())
}
