//! Volunteer commands - post opportunities and assign members to them.

use chrono::{Local, NaiveDate};
use clap::Subcommand;
use console::style;

use flock_core::config::ConfigHandle;
use flock_core::error::{FlockError, FlockResult};
use flock_models::{OpportunityPatch, VolunteerOpportunity};
use flock_services::VolunteerService;

use super::{format_date, new_table, or_dash, parse_date, print_json, truncate};
use crate::OutputFormat;

#[derive(Subcommand)]
pub enum VolunteersAction {
    /// List volunteer opportunities.
    List,
    /// Post a new opportunity.
    Post {
        name: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        location: Option<String>,
        /// Date posted (YYYY-MM-DD), today if omitted.
        #[arg(long, value_parser = parse_date)]
        posted: Option<NaiveDate>,
    },
    /// Edit an opportunity. Only the given fields change.
    Edit {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        location: Option<String>,
        #[arg(long, value_parser = parse_date)]
        posted: Option<NaiveDate>,
    },
    /// Remove an opportunity. Fails while members are assigned to it.
    Remove {
        id: i64,
        /// Skip the confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },
    /// Sign a member up for an opportunity.
    Assign {
        member_id: i64,
        opportunity_id: i64,
        /// Date volunteered (YYYY-MM-DD), today if omitted.
        #[arg(long, value_parser = parse_date)]
        on: Option<NaiveDate>,
    },
    /// Take a member off an opportunity.
    Unassign {
        member_id: i64,
        opportunity_id: i64,
    },
    /// Members volunteering for an opportunity.
    Volunteers {
        opportunity_id: i64,
    },
    /// Opportunities a member volunteers for.
    For {
        member_id: i64,
    },
}

pub async fn run(config: ConfigHandle, action: VolunteersAction, format: OutputFormat) -> FlockResult<()> {
    let db = super::init_database(&config).await?;
    let volunteers = VolunteerService::new(db);
    let today = Local::now().date_naive();

    match action {
        VolunteersAction::List => {
            let rows = volunteers.list_opportunities()?;
            match format {
                OutputFormat::Json => print_json(&rows)?,
                OutputFormat::Text => {
                    if rows.is_empty() {
                        println!("No volunteer opportunities.");
                    } else {
                        print_opportunities(rows.iter());
                    }
                }
            }
        }
        VolunteersAction::Post {
            name,
            description,
            location,
            posted,
        } => {
            let created = volunteers.post_opportunity(VolunteerOpportunity {
                id: None,
                name,
                description,
                date_posted: posted.unwrap_or(today),
                location,
            })?;
            match format {
                OutputFormat::Json => print_json(&created)?,
                OutputFormat::Text => println!(
                    "  {} Posted {} (ID {}).",
                    style("OK").green().bold(),
                    style(&created.name).bold(),
                    or_dash(created.id)
                ),
            }
        }
        VolunteersAction::Edit {
            id,
            name,
            description,
            location,
            posted,
        } => {
            let patch = OpportunityPatch {
                name,
                description,
                date_posted: posted,
                location,
            };
            let updated = volunteers.edit_opportunity(id, &patch)?;
            match format {
                OutputFormat::Json => print_json(&updated)?,
                OutputFormat::Text => println!(
                    "  {} Updated {}.",
                    style("OK").green().bold(),
                    style(&updated.name).bold()
                ),
            }
        }
        VolunteersAction::Remove { id, yes } => {
            let opportunity = volunteers
                .get_opportunity(id)?
                .ok_or_else(|| FlockError::NotFound(format!("volunteer opportunity {id}")))?;
            let prompt = format!("  Remove opportunity '{}'?", opportunity.name);
            if !super::confirm(&prompt, yes) {
                println!("  Removal cancelled.");
                return Ok(());
            }
            volunteers.remove_opportunity(id)?;
            println!("  {} Removed '{}'.", style("OK").green().bold(), opportunity.name);
        }
        VolunteersAction::Assign {
            member_id,
            opportunity_id,
            on,
        } => {
            let link = volunteers.assign(member_id, opportunity_id, on.unwrap_or(today))?;
            match format {
                OutputFormat::Json => print_json(&link)?,
                OutputFormat::Text => println!(
                    "  {} Member {member_id} assigned to opportunity {opportunity_id}.",
                    style("OK").green().bold()
                ),
            }
        }
        VolunteersAction::Unassign {
            member_id,
            opportunity_id,
        } => {
            volunteers.unassign(member_id, opportunity_id)?;
            println!(
                "  {} Member {member_id} removed from opportunity {opportunity_id}.",
                style("OK").green().bold()
            );
        }
        VolunteersAction::Volunteers { opportunity_id } => {
            let rows = volunteers.volunteers_for(opportunity_id)?;
            match format {
                OutputFormat::Json => print_json(&rows)?,
                OutputFormat::Text => {
                    if rows.is_empty() {
                        println!("Nobody has signed up yet.");
                    } else {
                        let mut table = new_table(["ID", "Name", "Phone"]);
                        for m in rows.iter() {
                            table.add_row(vec![
                                or_dash(m.id),
                                m.full_name(),
                                or_dash(m.phone_number.as_deref()),
                            ]);
                        }
                        println!("{table}");
                    }
                }
            }
        }
        VolunteersAction::For { member_id } => {
            let rows = volunteers.opportunities_for(member_id)?;
            match format {
                OutputFormat::Json => print_json(&rows)?,
                OutputFormat::Text => {
                    if rows.is_empty() {
                        println!("Member {member_id} does not volunteer.");
                    } else {
                        print_opportunities(rows.iter());
                    }
                }
            }
        }
    }

    Ok(())
}

fn print_opportunities<'a>(opportunities: impl Iterator<Item = &'a VolunteerOpportunity>) {
    let mut table = new_table(["ID", "Name", "Posted", "Location", "Description"]);
    for o in opportunities {
        table.add_row(vec![
            or_dash(o.id),
            o.name.clone(),
            format_date(o.date_posted),
            or_dash(o.location.as_deref()),
            truncate(o.description.as_deref().unwrap_or("-"), 40),
        ]);
    }
    println!("{table}");
}
