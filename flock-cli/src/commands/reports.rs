//! Demographic report commands.

use clap::Subcommand;
use console::style;

use flock_core::config::ConfigHandle;
use flock_core::error::FlockResult;
use flock_models::queries::{MemberContact, OfficeBearer};
use flock_services::ReportService;

use super::{format_date, new_table, or_dash, print_json};
use crate::OutputFormat;

#[derive(Subcommand)]
pub enum ReportsAction {
    /// Headline counts across every report.
    Summary,
    /// Married members and when they joined.
    Married,
    /// Members with at least one child.
    Children,
    /// Members who left school before matric.
    Uneducated,
    /// Everyone not in the uneducated report.
    Educated,
    /// Members with a disability.
    Disabled,
    /// Servers and officers.
    OfficeBearers,
    /// Member counts per education level.
    Education,
}

pub async fn run(config: ConfigHandle, action: ReportsAction, format: OutputFormat) -> FlockResult<()> {
    let db = super::init_database(&config).await?;
    let reports = ReportService::new(db);

    match action {
        ReportsAction::Summary => {
            let summary = reports.summary()?;
            match format {
                OutputFormat::Json => print_json(&summary)?,
                OutputFormat::Text => {
                    println!("{}", style("Congregation Summary").bold().underlined());
                    let mut table = new_table(["Report", "Count"]);
                    table.add_row(vec!["Members".to_string(), summary.members.to_string()]);
                    table.add_row(vec!["Events".to_string(), summary.events.to_string()]);
                    table.add_row(vec!["Married".to_string(), summary.married.to_string()]);
                    table.add_row(vec!["With children".to_string(), summary.with_children.to_string()]);
                    table.add_row(vec!["Before matric".to_string(), summary.uneducated.to_string()]);
                    table.add_row(vec!["Matric or higher".to_string(), summary.educated.to_string()]);
                    table.add_row(vec!["Disabled".to_string(), summary.disabled.to_string()]);
                    table.add_row(vec!["Servers".to_string(), summary.servers.to_string()]);
                    table.add_row(vec!["Officers".to_string(), summary.officers.to_string()]);
                    println!("{table}");
                }
            }
        }
        ReportsAction::Married => {
            let rows = reports.married_members()?;
            match format {
                OutputFormat::Json => print_json(&rows)?,
                OutputFormat::Text => {
                    let mut table = new_table(["ID", "Name", "Joined"]);
                    for m in rows.iter() {
                        table.add_row(vec![
                            m.id.to_string(),
                            format!("{} {}", m.first_name, m.last_name),
                            or_dash(m.join_date.map(format_date)),
                        ]);
                    }
                    println!("{table}");
                    println!("\n{} married member(s).", rows.count());
                }
            }
        }
        ReportsAction::Children => {
            let rows = reports.members_with_children()?;
            match format {
                OutputFormat::Json => print_json(&rows)?,
                OutputFormat::Text => {
                    let mut table = new_table(["ID", "Name", "Children"]);
                    for m in rows.iter() {
                        table.add_row(vec![
                            m.id.to_string(),
                            format!("{} {}", m.first_name, m.last_name),
                            m.children.to_string(),
                        ]);
                    }
                    println!("{table}");
                    println!("\n{} member(s) with children.", rows.count());
                }
            }
        }
        ReportsAction::Uneducated => {
            let rows = reports.uneducated_members()?;
            print_contacts(rows.rows(), "member(s) without matric", format)?;
        }
        ReportsAction::Educated => {
            let rows = reports.educated_members()?;
            print_contacts(rows.rows(), "member(s) not recorded as before matric", format)?;
        }
        ReportsAction::Disabled => {
            let rows = reports.disabled_members()?;
            print_contacts(rows.rows(), "member(s) with a disability", format)?;
        }
        ReportsAction::OfficeBearers => {
            let bearers = reports.office_bearers()?;
            match format {
                OutputFormat::Json => print_json(&bearers)?,
                OutputFormat::Text => {
                    println!("{}", style("Servers").bold().underlined());
                    print_bearers(bearers.servers.rows());
                    println!();
                    println!("{}", style("Officers").bold().underlined());
                    print_bearers(bearers.officers.rows());
                    println!("\n{} office bearer(s).", bearers.total());
                }
            }
        }
        ReportsAction::Education => {
            let counts = reports.education_breakdown()?;
            match format {
                OutputFormat::Json => print_json(&counts)?,
                OutputFormat::Text => {
                    let mut table = new_table(["Education", "Members"]);
                    for c in &counts {
                        let label = c
                            .level
                            .map(|l| l.to_string())
                            .unwrap_or_else(|| "Not recorded".to_string());
                        table.add_row(vec![label, c.count.to_string()]);
                    }
                    println!("{table}");
                }
            }
        }
    }

    Ok(())
}

fn print_contacts(rows: &[MemberContact], noun: &str, format: OutputFormat) -> FlockResult<()> {
    match format {
        OutputFormat::Json => print_json(rows)?,
        OutputFormat::Text => {
            let mut table = new_table(["ID", "Name", "Phone"]);
            for m in rows {
                table.add_row(vec![
                    m.id.to_string(),
                    format!("{} {}", m.first_name, m.last_name),
                    or_dash(m.phone_number.as_deref()),
                ]);
            }
            println!("{table}");
            println!("\n{} {noun}.", rows.len());
        }
    }
    Ok(())
}

fn print_bearers(rows: &[OfficeBearer]) {
    if rows.is_empty() {
        println!("  (none)");
        return;
    }
    let mut table = new_table(["ID", "Name", "Phone"]);
    for b in rows {
        table.add_row(vec![
            b.id.to_string(),
            format!("{} {}", b.first_name, b.last_name),
            or_dash(b.phone_number.as_deref()),
        ]);
    }
    println!("{table}");
}
