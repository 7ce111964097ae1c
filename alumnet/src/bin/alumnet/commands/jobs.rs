use alumnet::{Job, JobPatch, JobStatus, NewJob};
use anyhow::Result;
use clap::{Args, Subcommand, builder::PossibleValuesParser};

use super::{ListArgs, Service, change, delete, get, list, show_saved};
use crate::{examples::ExampleGroup, output::OutputManager};

pub const EXAMPLES: &[ExampleGroup] = &[
    ExampleGroup {
        title: "Job board",
        commands: &[
            "alumnet jobs list --filter status=Active",
            "alumnet jobs list --filter requirements=SQL",
            "alumnet jobs get 2kP8wZq4MxNv6RtB3cYs",
        ],
    },
    ExampleGroup {
        title: "Postings",
        commands: &[
            "alumnet jobs create --title \"Backend Engineer\" --company Acme --type Full-time --requirement Rust --apply-url https://acme.example/careers/42",
            "alumnet jobs update 2kP8wZq4MxNv6RtB3cYs --status closed",
            "alumnet jobs update 2kP8wZq4MxNv6RtB3cYs --clear salary",
        ],
    },
];

const CLEARABLE: [&str; 6] = ["location", "description", "type", "salary", "apply-url", "contact-email"];

#[derive(Subcommand)]
pub enum JobCommands {
    /// List job postings, optionally filtered
    List(ListArgs),

    /// Show one posting
    Get {
        /// Job id
        id: String,
    },

    /// Post a job
    Create(JobArgs),

    /// Change fields of an existing posting
    Update {
        /// Job id
        id: String,

        #[command(flatten)]
        fields: JobArgs,

        /// Remove an optional field (repeatable)
        #[arg(long, value_name = "FIELD", value_parser = PossibleValuesParser::new(CLEARABLE))]
        clear: Vec<String>,
    },

    /// Delete a posting
    Delete {
        /// Job id
        id: String,
    },
}

#[derive(Args, Debug, Default)]
pub struct JobArgs {
    #[arg(long)]
    pub title: Option<String>,

    #[arg(long)]
    pub company: Option<String>,

    #[arg(long)]
    pub location: Option<String>,

    #[arg(long)]
    pub description: Option<String>,

    /// Full-time, Part-time, Contract, ...
    #[arg(long = "type", value_name = "TYPE")]
    pub job_type: Option<String>,

    #[arg(long)]
    pub salary: Option<String>,

    /// Requirement line (repeatable)
    #[arg(long = "requirement", value_name = "TEXT")]
    pub requirements: Vec<String>,

    /// Responsibility line (repeatable)
    #[arg(long = "responsibility", value_name = "TEXT")]
    pub responsibilities: Vec<String>,

    /// Posting user id
    #[arg(long)]
    pub posted_by: Option<String>,

    #[arg(long)]
    pub applications: Option<i64>,

    /// Active, Closed or Pending
    #[arg(long)]
    pub status: Option<JobStatus>,

    #[arg(long)]
    pub apply_url: Option<String>,

    #[arg(long)]
    pub contact_email: Option<String>,
}

impl JobArgs {
    fn into_draft(self) -> NewJob {
        NewJob {
            title: self.title,
            company: self.company,
            location: self.location,
            description: self.description,
            job_type: self.job_type,
            salary: self.salary,
            requirements: self.requirements,
            responsibilities: self.responsibilities,
            posted_by: self.posted_by,
            posted_date: None,
            applications: self.applications,
            status: self.status,
            apply_url: self.apply_url,
            contact_email: self.contact_email,
        }
    }

    fn into_patch(self, clear: &[String]) -> JobPatch {
        JobPatch {
            title: self.title,
            company: self.company,
            location: change(self.location, "location", clear),
            description: change(self.description, "description", clear),
            job_type: change(self.job_type, "type", clear),
            salary: change(self.salary, "salary", clear),
            requirements: (!self.requirements.is_empty()).then_some(self.requirements),
            responsibilities: (!self.responsibilities.is_empty()).then_some(self.responsibilities),
            applications: self.applications,
            status: self.status,
            apply_url: change(self.apply_url, "apply-url", clear),
            contact_email: change(self.contact_email, "contact-email", clear),
        }
    }
}

pub async fn handle_job_commands(command: JobCommands, service: &Service, output: &OutputManager) -> Result<()> {
    match command {
        JobCommands::List(args) => list::<Job>(service, &args, output).await,
        JobCommands::Get { id } => get::<Job>(service, &id, output).await,
        JobCommands::Create(args) => {
            let job = service.create_job(args.into_draft()).await?;
            show_saved("Posted", job, output)
        }
        JobCommands::Update { id, fields, clear } => match service.update_job(&id, fields.into_patch(&clear)).await? {
            Some(job) => show_saved("Updated", job, output),
            None => anyhow::bail!("no job with id {id}"),
        },
        JobCommands::Delete { id } => delete::<Job>(service, &id, output).await,
    }
}
