use alumnet::{NewUser, User, UserPatch};
use anyhow::Result;
use clap::{Args, Subcommand, builder::PossibleValuesParser};

use super::{ListArgs, Service, change, delete, get, list, show_saved};
use crate::{examples::ExampleGroup, output::OutputManager};

pub const EXAMPLES: &[ExampleGroup] = &[
    ExampleGroup {
        title: "Browse the directory",
        commands: &[
            "alumnet users list",
            "alumnet users list --filter isAdmin=false",
            "alumnet users list --filter skills=Rust --filter graduationYear=2019",
            "alumnet users get 3hX9aQpLm2VtZr7NcKd4",
        ],
    },
    ExampleGroup {
        title: "Manage profiles",
        commands: &[
            "alumnet users create --name \"Asha Rao\" --email asha@kiit.ac.in --graduation-year 2019",
            "alumnet users update 3hX9aQpLm2VtZr7NcKd4 --company Acme --role \"Staff Engineer\"",
            "alumnet users update 3hX9aQpLm2VtZr7NcKd4 --clear bio --clear avatar",
            "alumnet users delete 3hX9aQpLm2VtZr7NcKd4",
        ],
    },
];

#[derive(Subcommand)]
pub enum UserCommands {
    /// List users, optionally filtered
    List(ListArgs),

    /// Show one user
    Get {
        /// User id
        id: String,
    },

    /// Create a user profile
    Create(UserArgs),

    /// Change fields of an existing user
    Update {
        /// User id
        id: String,

        #[command(flatten)]
        fields: UserArgs,

        /// Remove an optional field (repeatable)
        #[arg(long, value_name = "FIELD", value_parser = PossibleValuesParser::new(CLEARABLE))]
        clear: Vec<String>,
    },

    /// Delete a user
    Delete {
        /// User id
        id: String,
    },
}

const CLEARABLE: [&str; 7] = ["avatar", "role", "company", "location", "graduation-year", "department", "bio"];

#[derive(Args, Debug, Default)]
pub struct UserArgs {
    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub email: Option<String>,

    #[arg(long)]
    pub role: Option<String>,

    #[arg(long)]
    pub company: Option<String>,

    #[arg(long)]
    pub location: Option<String>,

    #[arg(long)]
    pub graduation_year: Option<i32>,

    #[arg(long)]
    pub department: Option<String>,

    /// Skill tag (repeatable)
    #[arg(long = "skill", value_name = "SKILL")]
    pub skills: Vec<String>,

    #[arg(long)]
    pub bio: Option<String>,

    /// Avatar image URL
    #[arg(long)]
    pub avatar: Option<String>,

    /// Grant or revoke the admin flag
    #[arg(long)]
    pub admin: Option<bool>,
}

impl UserArgs {
    fn into_draft(self) -> NewUser {
        NewUser {
            name: self.name,
            email: self.email,
            avatar: self.avatar,
            role: self.role,
            company: self.company,
            location: self.location,
            graduation_year: self.graduation_year,
            department: self.department,
            skills: self.skills,
            bio: self.bio,
            is_admin: self.admin,
        }
    }

    fn into_patch(self, clear: &[String]) -> UserPatch {
        UserPatch {
            name: self.name,
            email: self.email,
            avatar: change(self.avatar, "avatar", clear),
            role: change(self.role, "role", clear),
            company: change(self.company, "company", clear),
            location: change(self.location, "location", clear),
            graduation_year: change(self.graduation_year, "graduation-year", clear),
            department: change(self.department, "department", clear),
            skills: (!self.skills.is_empty()).then_some(self.skills),
            bio: change(self.bio, "bio", clear),
            is_admin: self.admin,
        }
    }
}

pub async fn handle_user_commands(command: UserCommands, service: &Service, output: &OutputManager) -> Result<()> {
    match command {
        UserCommands::List(args) => list::<User>(service, &args, output).await,
        UserCommands::Get { id } => get::<User>(service, &id, output).await,
        UserCommands::Create(args) => {
            let user = service.create_user(args.into_draft()).await?;
            show_saved("Created", user, output)
        }
        UserCommands::Update { id, fields, clear } => match service.update_user(&id, fields.into_patch(&clear)).await? {
            Some(user) => show_saved("Updated", user, output),
            None => anyhow::bail!("no user with id {id}"),
        },
        UserCommands::Delete { id } => delete::<User>(service, &id, output).await,
    }
}
