//! Member commands - register, edit, list, remove, and import members.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Subcommand};
use console::style;

use flock_core::config::ConfigHandle;
use flock_core::error::{FlockError, FlockResult};
use flock_models::{
    Attendance, DemographicsPatch, EducationLevel, Gender, Involvement, MaritalStatus, Member,
    MemberPatch, MembershipStatus, YesNo,
};
use flock_services::{ImportService, MemberProfile, MemberService};

use super::{format_date, new_table, or_dash, parse_date, print_json};
use crate::OutputFormat;

#[derive(Subcommand)]
pub enum MembersAction {
    /// List all members.
    List,
    /// Show a member with demographics and volunteering.
    Show {
        /// Member ID.
        id: i64,
    },
    /// Find members by email or by full name.
    Find {
        #[arg(short, long, conflicts_with_all = ["first", "last"])]
        email: Option<String>,
        #[arg(long, requires = "last")]
        first: Option<String>,
        #[arg(long, requires = "first")]
        last: Option<String>,
    },
    /// Register a new member.
    Add {
        first_name: String,
        last_name: String,
        #[command(flatten)]
        details: MemberArgs,
        #[command(flatten)]
        demographics: DemographicsArgs,
    },
    /// Edit member details. Only the given fields change.
    Edit {
        id: i64,
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        #[command(flatten)]
        details: MemberArgs,
    },
    /// Edit a member's demographics. Only the given fields change.
    Demographics {
        /// Member ID.
        id: i64,
        #[command(flatten)]
        demographics: DemographicsArgs,
    },
    /// Remove a member along with their demographics and volunteering.
    Remove {
        id: i64,
        /// Skip the confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },
    /// Import members from a pipe-delimited file.
    Import {
        file: PathBuf,
    },
}

/// Optional member fields shared by `add` and `edit`.
#[derive(Args)]
pub struct MemberArgs {
    /// Date of birth (YYYY-MM-DD).
    #[arg(long, value_parser = parse_date)]
    dob: Option<NaiveDate>,
    #[arg(long)]
    gender: Option<Gender>,
    #[arg(long)]
    phone: Option<String>,
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    address: Option<String>,
    /// Date joined (YYYY-MM-DD).
    #[arg(long, value_parser = parse_date)]
    joined: Option<NaiveDate>,
    /// Membership status (Active, Inactive).
    #[arg(long)]
    status: Option<MembershipStatus>,
}

/// Optional demographic fields shared by `add` and `demographics`.
#[derive(Args)]
pub struct DemographicsArgs {
    /// Married, Never Married, Divorced, Widowed.
    #[arg(long)]
    marital: Option<MaritalStatus>,
    #[arg(long)]
    children: Option<u32>,
    /// Number of people living at home.
    #[arg(long)]
    household: Option<u32>,
    #[arg(long)]
    occupation: Option<String>,
    /// Before Matric, Passed Matric, College, Bachelor's Degree, Post Grad.
    #[arg(long)]
    education: Option<EducationLevel>,
    /// Weekly, Bi-weekly, Monthly, Rarely.
    #[arg(long)]
    attendance: Option<Attendance>,
    /// Congregant, Server, Officer.
    #[arg(long)]
    involvement: Option<Involvement>,
    /// Yes or No.
    #[arg(long)]
    disability: Option<YesNo>,
}

impl DemographicsArgs {
    fn into_patch(self) -> DemographicsPatch {
        DemographicsPatch {
            marital_status: self.marital,
            children: self.children,
            household_size: self.household,
            occupation: self.occupation,
            education_level: self.education,
            attendance: self.attendance,
            involvement: self.involvement,
            disability: self.disability,
        }
    }

    fn is_empty(&self) -> bool {
        self.marital.is_none()
            && self.children.is_none()
            && self.household.is_none()
            && self.occupation.is_none()
            && self.education.is_none()
            && self.attendance.is_none()
            && self.involvement.is_none()
            && self.disability.is_none()
    }
}

pub async fn run(config: ConfigHandle, action: MembersAction, format: OutputFormat) -> FlockResult<()> {
    let db = super::init_database(&config).await?;
    let members = MemberService::new(db.clone());

    match action {
        MembersAction::List => {
            let rows = members.list_members()?;
            match format {
                OutputFormat::Json => print_json(&rows)?,
                OutputFormat::Text => {
                    if rows.is_empty() {
                        println!("No members.");
                    } else {
                        print_members(rows.iter());
                        println!("\n{} member(s).", rows.count());
                    }
                }
            }
        }
        MembersAction::Show { id } => {
            let profile = members
                .get_profile(id)?
                .ok_or_else(|| FlockError::NotFound(format!("member {id}")))?;
            match format {
                OutputFormat::Json => print_json(&profile)?,
                OutputFormat::Text => print_profile(&profile),
            }
        }
        MembersAction::Find { email, first, last } => {
            let found: Vec<Member> = match (email, first, last) {
                (Some(email), _, _) => members.find_by_email(&email)?.into_iter().collect(),
                (None, Some(first), Some(last)) => members.find_by_name(&first, &last)?.into_rows(),
                _ => {
                    return Err(FlockError::Validation(
                        "give --email or both --first and --last".into(),
                    ))
                }
            };
            match format {
                OutputFormat::Json => print_json(&found)?,
                OutputFormat::Text => {
                    if found.is_empty() {
                        println!("No matching members.");
                    } else {
                        print_members(found.iter());
                    }
                }
            }
        }
        MembersAction::Add {
            first_name,
            last_name,
            details,
            demographics,
        } => {
            let mut member = Member::new(first_name, last_name);
            member.date_of_birth = details.dob;
            member.gender = details.gender;
            member.phone_number = details.phone;
            member.email = details.email;
            member.address = details.address;
            member.join_date = details.joined;
            member.membership_status = details.status;

            let demographics = (!demographics.is_empty()).then(|| demographics.into_patch());
            let created = members.create_member(member, demographics)?;

            match format {
                OutputFormat::Json => print_json(&created)?,
                OutputFormat::Text => println!(
                    "  {} Added {} (ID {}).",
                    style("OK").green().bold(),
                    style(created.full_name()).bold(),
                    or_dash(created.id)
                ),
            }
        }
        MembersAction::Edit {
            id,
            first_name,
            last_name,
            details,
        } => {
            let patch = MemberPatch {
                first_name,
                last_name,
                date_of_birth: details.dob,
                gender: details.gender,
                phone_number: details.phone,
                email: details.email,
                address: details.address,
                join_date: details.joined,
                membership_status: details.status,
            };
            if patch.is_empty() {
                println!("Nothing to change.");
                return Ok(());
            }
            let updated = members.edit_member(id, &patch)?;
            match format {
                OutputFormat::Json => print_json(&updated)?,
                OutputFormat::Text => println!(
                    "  {} Updated {}.",
                    style("OK").green().bold(),
                    style(updated.full_name()).bold()
                ),
            }
        }
        MembersAction::Demographics { id, demographics } => {
            if demographics.is_empty() {
                println!("Nothing to change.");
                return Ok(());
            }
            let updated = members.edit_demographics(id, demographics.into_patch())?;
            match format {
                OutputFormat::Json => print_json(&updated)?,
                OutputFormat::Text => println!(
                    "  {} Demographics updated for member {id}.",
                    style("OK").green().bold()
                ),
            }
        }
        MembersAction::Remove { id, yes } => {
            let member = members
                .get_member(id)?
                .ok_or_else(|| FlockError::NotFound(format!("member {id}")))?;
            let prompt = format!(
                "  Remove {} and their demographics and volunteering?",
                member.full_name()
            );
            if !super::confirm(&prompt, yes) {
                println!("  Removal cancelled.");
                return Ok(());
            }
            members.remove_member(id)?;
            println!(
                "  {} Removed {}.",
                style("OK").green().bold(),
                member.full_name()
            );
        }
        MembersAction::Import { file } => {
            println!(
                "  {} Importing members from {}...",
                style("...").dim(),
                file.display()
            );
            let report = ImportService::new(db).import_file(&file)?;
            match format {
                OutputFormat::Json => print_json(&report)?,
                OutputFormat::Text => {
                    println!(
                        "  {} {} imported, {} skipped, {} rejected.",
                        style("OK").green().bold(),
                        report.imported.len(),
                        report.skipped.len(),
                        report.rejected.len()
                    );
                    for line in report.skipped.iter().chain(report.rejected.iter()) {
                        println!(
                            "    {} line {}: {}",
                            style("-").yellow(),
                            line.line,
                            line.reason
                        );
                    }
                }
            }
        }
    }

    Ok(())
}

fn print_members<'a>(members: impl Iterator<Item = &'a Member>) {
    let mut table = new_table(["ID", "Name", "Phone", "Email", "Born", "Status"]);
    for m in members {
        table.add_row(vec![
            or_dash(m.id),
            m.full_name(),
            or_dash(m.phone_number.as_deref()),
            or_dash(m.email.as_deref()),
            or_dash(m.date_of_birth.map(format_date)),
            or_dash(m.membership_status),
        ]);
    }
    println!("{table}");
}

fn print_profile(profile: &MemberProfile) {
    let m = &profile.member;
    println!("{}", style(m.full_name()).bold().underlined());
    println!("  ID:            {}", or_dash(m.id));
    println!("  Born:          {}", or_dash(m.date_of_birth.map(format_date)));
    println!("  Gender:        {}", or_dash(m.gender));
    println!("  Phone:         {}", or_dash(m.phone_number.as_deref()));
    println!("  Email:         {}", or_dash(m.email.as_deref()));
    println!("  Address:       {}", or_dash(m.address.as_deref()));
    println!("  Joined:        {}", or_dash(m.join_date.map(format_date)));
    println!("  Status:        {}", or_dash(m.membership_status));

    println!();
    println!("{}", style("Demographics").bold().underlined());
    match &profile.demographics {
        Some(d) => {
            println!("  Marital:       {}", or_dash(d.marital_status));
            println!("  Children:      {}", d.children);
            println!("  Household:     {}", d.household_size);
            println!("  Occupation:    {}", or_dash(d.occupation.as_deref()));
            println!("  Education:     {}", or_dash(d.education_level));
            println!("  Attendance:    {}", or_dash(d.attendance));
            println!("  Involvement:   {}", or_dash(d.involvement));
            println!("  Disability:    {}", or_dash(d.disability));
        }
        None => println!("  (none recorded)"),
    }

    if !profile.opportunities.is_empty() {
        println!();
        println!("{}", style("Volunteering").bold().underlined());
        for o in &profile.opportunities {
            println!("  - {} ({})", o.name, format_date(o.date_posted));
        }
    }
}
