use alumnet::{Community, CommunityPatch, NewCommunity};
use anyhow::Result;
use clap::{Args, Subcommand, builder::PossibleValuesParser};

use super::{ListArgs, Service, change, delete, get, list, show_saved};
use crate::{examples::ExampleGroup, output::OutputManager};

pub const EXAMPLES: &[ExampleGroup] = &[
    ExampleGroup {
        title: "Browse communities",
        commands: &[
            "alumnet communities list",
            "alumnet communities list --filter membersList=3hX9aQpLm2VtZr7NcKd4",
        ],
    },
    ExampleGroup {
        title: "Membership",
        commands: &[
            "alumnet communities create --name \"Robotics Club\" --description \"Builders and tinkerers\"",
            "alumnet communities join 6tRw2KpQx9ZmNc4VbL7a 3hX9aQpLm2VtZr7NcKd4",
            "alumnet communities leave 6tRw2KpQx9ZmNc4VbL7a 3hX9aQpLm2VtZr7NcKd4",
        ],
    },
];

#[derive(Subcommand)]
pub enum CommunityCommands {
    /// List communities, optionally filtered
    List(ListArgs),

    /// Show one community
    Get {
        /// Community id
        id: String,
    },

    /// Create a community
    Create(CommunityArgs),

    /// Change fields of an existing community
    Update {
        /// Community id
        id: String,

        #[command(flatten)]
        fields: CommunityArgs,

        /// Remove an optional field (repeatable)
        #[arg(long, value_name = "FIELD", value_parser = PossibleValuesParser::new(["description", "image"]))]
        clear: Vec<String>,
    },

    /// Add users to a community
    Join {
        /// Community id
        id: String,

        /// User ids to add
        #[arg(required = true)]
        users: Vec<String>,
    },

    /// Remove users from a community
    Leave {
        /// Community id
        id: String,

        /// User ids to remove
        #[arg(required = true)]
        users: Vec<String>,
    },

    /// Delete a community
    Delete {
        /// Community id
        id: String,
    },
}

#[derive(Args, Debug, Default)]
pub struct CommunityArgs {
    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub description: Option<String>,

    #[arg(long)]
    pub image: Option<String>,

    /// Member counter; defaults to the number of --member ids on create
    #[arg(long)]
    pub members: Option<i64>,

    /// Member user id (repeatable)
    #[arg(long = "member", value_name = "USER_ID")]
    pub members_list: Vec<String>,
}

impl CommunityArgs {
    fn into_draft(self) -> NewCommunity {
        NewCommunity {
            name: self.name,
            description: self.description,
            image: self.image,
            members: self.members,
            members_list: self.members_list,
        }
    }

    fn into_patch(self, clear: &[String]) -> CommunityPatch {
        CommunityPatch {
            name: self.name,
            description: change(self.description, "description", clear),
            image: change(self.image, "image", clear),
            members: self.members,
            members_list: (!self.members_list.is_empty()).then_some(self.members_list),
            ..CommunityPatch::default()
        }
    }
}

async fn save_patch(service: &Service, id: &str, patch: CommunityPatch, output: &OutputManager) -> Result<()> {
    match service.update_community(id, patch).await? {
        Some(community) => show_saved("Updated", community, output),
        None => anyhow::bail!("no community with id {id}"),
    }
}

pub async fn handle_community_commands(
    command: CommunityCommands,
    service: &Service,
    output: &OutputManager,
) -> Result<()> {
    match command {
        CommunityCommands::List(args) => list::<Community>(service, &args, output).await,
        CommunityCommands::Get { id } => get::<Community>(service, &id, output).await,
        CommunityCommands::Create(args) => {
            let community = service.create_community(args.into_draft()).await?;
            show_saved("Created", community, output)
        }
        CommunityCommands::Update { id, fields, clear } => {
            save_patch(service, &id, fields.into_patch(&clear), output).await
        }
        CommunityCommands::Join { id, users } => {
            let patch = CommunityPatch {
                add_members: users,
                ..CommunityPatch::default()
            };
            save_patch(service, &id, patch, output).await
        }
        CommunityCommands::Leave { id, users } => {
            let patch = CommunityPatch {
                remove_members: users,
                ..CommunityPatch::default()
            };
            save_patch(service, &id, patch, output).await
        }
        CommunityCommands::Delete { id } => delete::<Community>(service, &id, output).await,
    }
}
