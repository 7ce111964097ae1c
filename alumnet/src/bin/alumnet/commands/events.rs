use alumnet::{Event, EventPatch, NewEvent};
use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::{Args, Subcommand, builder::PossibleValuesParser};

use super::{ListArgs, Service, change, delete, get, list, parse_datetime, show_saved};
use crate::{examples::ExampleGroup, output::OutputManager};

pub const EXAMPLES: &[ExampleGroup] = &[
    ExampleGroup {
        title: "Browse events",
        commands: &[
            "alumnet events list",
            "alumnet events list --filter isOnline=true",
            "alumnet events list --count",
        ],
    },
    ExampleGroup {
        title: "Schedule",
        commands: &[
            "alumnet events create --title \"Annual Reunion\" --date 2025-12-20 --start-time 18:00 --location Campus",
            "alumnet events update 8bQ2mYt6KzRw3NpXcV5e --attendee-count 42",
        ],
    },
];

#[derive(Subcommand)]
pub enum EventCommands {
    /// List events, optionally filtered
    List(ListArgs),

    /// Show one event
    Get {
        /// Event id
        id: String,
    },

    /// Create an event
    Create(EventArgs),

    /// Change fields of an existing event
    Update {
        /// Event id
        id: String,

        #[command(flatten)]
        fields: EventArgs,

        /// Remove an optional field (repeatable)
        #[arg(long, value_name = "FIELD", value_parser = PossibleValuesParser::new(CLEARABLE))]
        clear: Vec<String>,
    },

    /// Delete an event
    Delete {
        /// Event id
        id: String,
    },
}

const CLEARABLE: [&str; 8] = [
    "description",
    "image",
    "start-time",
    "end-time",
    "location",
    "online",
    "organizer",
    "max-attendees",
];

#[derive(Args, Debug, Default)]
pub struct EventArgs {
    #[arg(long)]
    pub title: Option<String>,

    #[arg(long)]
    pub description: Option<String>,

    #[arg(long)]
    pub image: Option<String>,

    /// YYYY-MM-DD or RFC 3339 timestamp
    #[arg(long, value_parser = parse_datetime)]
    pub date: Option<DateTime<Utc>>,

    #[arg(long)]
    pub start_time: Option<String>,

    #[arg(long)]
    pub end_time: Option<String>,

    #[arg(long)]
    pub location: Option<String>,

    #[arg(long)]
    pub online: Option<bool>,

    #[arg(long)]
    pub organizer: Option<String>,

    #[arg(long)]
    pub attendee_count: Option<i64>,

    #[arg(long)]
    pub max_attendees: Option<i64>,

    /// Attending user id (repeatable)
    #[arg(long = "attendee", value_name = "USER_ID")]
    pub attendees: Vec<String>,
}

impl EventArgs {
    fn into_draft(self) -> NewEvent {
        NewEvent {
            title: self.title,
            description: self.description,
            image: self.image,
            date: self.date,
            start_time: self.start_time,
            end_time: self.end_time,
            location: self.location,
            is_online: self.online,
            organizer: self.organizer,
            attendee_count: self.attendee_count,
            max_attendees: self.max_attendees,
            attendees: self.attendees,
        }
    }

    fn into_patch(self, clear: &[String]) -> EventPatch {
        EventPatch {
            title: self.title,
            description: change(self.description, "description", clear),
            image: change(self.image, "image", clear),
            date: self.date,
            start_time: change(self.start_time, "start-time", clear),
            end_time: change(self.end_time, "end-time", clear),
            location: change(self.location, "location", clear),
            is_online: change(self.online, "online", clear),
            organizer: change(self.organizer, "organizer", clear),
            attendee_count: self.attendee_count,
            max_attendees: change(self.max_attendees, "max-attendees", clear),
            attendees: (!self.attendees.is_empty()).then_some(self.attendees),
        }
    }
}

pub async fn handle_event_commands(command: EventCommands, service: &Service, output: &OutputManager) -> Result<()> {
    match command {
        EventCommands::List(args) => list::<Event>(service, &args, output).await,
        EventCommands::Get { id } => get::<Event>(service, &id, output).await,
        EventCommands::Create(args) => {
            let event = service.create_event(args.into_draft()).await?;
            show_saved("Created", event, output)
        }
        EventCommands::Update { id, fields, clear } => {
            match service.update_event(&id, fields.into_patch(&clear)).await? {
                Some(event) => show_saved("Updated", event, output),
                None => anyhow::bail!("no event with id {id}"),
            }
        }
        EventCommands::Delete { id } => delete::<Event>(service, &id, output).await,
    }
}
