use alumnet::{Message, MessageStatus, NewMessage};
use anyhow::Result;
use clap::{Args, Subcommand};

use super::{ListArgs, Service, delete, get, list, show_saved};
use crate::{examples::ExampleGroup, output::OutputManager};

pub const EXAMPLES: &[ExampleGroup] = &[
    ExampleGroup {
        title: "Inbox",
        commands: &[
            "alumnet messages list --filter status=Unread",
            "alumnet messages list --filter recipient=\"All Alumni\" --count",
            "alumnet messages mark 9cV4nB7xQ2LzKw5RtY8p --status read",
        ],
    },
    ExampleGroup {
        title: "Send",
        commands: &[
            "alumnet messages create --sender 3hX9aQpLm2VtZr7NcKd4 --recipient \"All Alumni\" --subject Reunion --body \"See you in December\"",
        ],
    },
];

#[derive(Subcommand)]
pub enum MessageCommands {
    /// List messages, optionally filtered
    List(ListArgs),

    /// Show one message
    Get {
        /// Message id
        id: String,
    },

    /// Send a message
    Create(MessageArgs),

    /// Mark a message read or unread
    Mark {
        /// Message id
        id: String,

        /// Read or Unread
        #[arg(long)]
        status: MessageStatus,
    },

    /// Delete a message
    Delete {
        /// Message id
        id: String,
    },
}

#[derive(Args, Debug)]
pub struct MessageArgs {
    /// Sending user id
    #[arg(long)]
    pub sender: Option<String>,

    #[arg(long)]
    pub sender_name: Option<String>,

    /// User id, name or group label such as "All Alumni"
    #[arg(long)]
    pub recipient: Option<String>,

    #[arg(long)]
    pub subject: Option<String>,

    /// Message text
    #[arg(long)]
    pub body: Option<String>,

    /// Initial read state (defaults to unread)
    #[arg(long)]
    pub status: Option<MessageStatus>,
}

impl MessageArgs {
    fn into_draft(self) -> NewMessage {
        NewMessage {
            sender: self.sender,
            sender_name: self.sender_name,
            recipient: self.recipient,
            subject: self.subject,
            body: self.body,
            date: None,
            status: self.status,
        }
    }
}

pub async fn handle_message_commands(
    command: MessageCommands,
    service: &Service,
    output: &OutputManager,
) -> Result<()> {
    match command {
        MessageCommands::List(args) => list::<Message>(service, &args, output).await,
        MessageCommands::Get { id } => get::<Message>(service, &id, output).await,
        MessageCommands::Create(args) => {
            let message = service.create_message(args.into_draft()).await?;
            if !message.recipient_is_reference() {
                output.verbose(&format!("recipient {:?} is stored as a label", message.recipient));
            }
            show_saved("Sent", message, output)
        }
        MessageCommands::Mark { id, status } => {
            match service.update_message_status(&id, status).await? {
                Some(message) => show_saved("Marked", message, output),
                None => anyhow::bail!("no message with id {id}"),
            }
        }
        MessageCommands::Delete { id } => delete::<Message>(service, &id, output).await,
    }
}

