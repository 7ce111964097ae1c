use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Draft, Entity, Patch, assign, check_present, check_reference, required_text};
use crate::{
    errors::{IssueCollector, StoreError, ValidationResult},
    search::IndexField,
    validators::is_valid_reference,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageStatus {
    Read,
    #[default]
    Unread,
}

impl MessageStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            MessageStatus::Read => "Read",
            MessageStatus::Unread => "Unread",
        }
    }
}

impl fmt::Display for MessageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageStatus {
    type Err = StoreError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "read" => Ok(MessageStatus::Read),
            "unread" => Ok(MessageStatus::Unread),
            other => Err(StoreError::Other {
                message: format!("unknown message status {other:?} (expected Read or Unread)").into(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(rename = "_id")]
    pub id: String,
    /// User id of the author.
    pub sender: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_name: Option<String>,
    /// Free text: a user id, a display name or a group label such as "All Alumni".
    pub recipient: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(rename = "message", default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub status: MessageStatus,
}

impl Message {
    pub fn is_unread(&self) -> bool {
        self.status == MessageStatus::Unread
    }

    /// Whether `recipient` has the shape of a record id rather than a label.
    pub fn recipient_is_reference(&self) -> bool {
        is_valid_reference(&self.recipient)
    }
}

impl Entity for Message {
    const COLLECTION: &'static str = "messages";
    const LABEL: &'static str = "message";
    const INDEXED: &'static [IndexField] = &[
        IndexField::tag("$.sender", "sender"),
        IndexField::tag("$.recipient", "recipient"),
        IndexField::tag("$.status", "status"),
    ];

    fn id(&self) -> &str {
        &self.id
    }

    fn validate(&self) -> ValidationResult<()> {
        let mut issues = IssueCollector::new();
        check_present(&mut issues, "sender", &self.sender);
        if !self.sender.is_empty() {
            check_reference(&mut issues, "sender", Some(&self.sender));
        }
        check_present(&mut issues, "recipient", &self.recipient);
        issues.finish()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMessage {
    pub sender: Option<String>,
    pub sender_name: Option<String>,
    pub recipient: Option<String>,
    pub subject: Option<String>,
    #[serde(rename = "message")]
    pub body: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub status: Option<MessageStatus>,
}

impl NewMessage {
    pub fn new(sender: impl Into<String>, recipient: impl Into<String>) -> Self {
        Self {
            sender: Some(sender.into()),
            recipient: Some(recipient.into()),
            ..Self::default()
        }
    }
}

impl Draft for NewMessage {
    type Entity = Message;

    fn into_entity(self, id: String, now: DateTime<Utc>) -> ValidationResult<Message> {
        let mut issues = IssueCollector::new();
        let sender = required_text(&mut issues, "sender", self.sender);
        let recipient = required_text(&mut issues, "recipient", self.recipient);
        issues.finish()?;

        Ok(Message {
            id,
            sender,
            sender_name: self.sender_name,
            recipient,
            subject: self.subject,
            body: self.body,
            date: self.date.unwrap_or(now),
            status: self.status.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePatch {
    #[serde(default, deserialize_with = "super::nullable")]
    pub sender_name: Option<Option<String>>,
    pub recipient: Option<String>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub subject: Option<Option<String>>,
    #[serde(rename = "message", default, deserialize_with = "super::nullable")]
    pub body: Option<Option<String>>,
    pub status: Option<MessageStatus>,
}

impl MessagePatch {
    pub fn status(status: MessageStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }
}

impl Patch for MessagePatch {
    type Entity = Message;

    fn apply_to(self, message: &mut Message) -> ValidationResult<()> {
        if let Some(recipient) = self.recipient {
            message.recipient = recipient;
        }
        if let Some(status) = self.status {
            message.status = status;
        }
        for (slot, change) in [
            (&mut message.sender_name, self.sender_name),
            (&mut message.subject, self.subject),
            (&mut message.body, self.body),
        ] {
            assign(slot, change);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::generate_entity_id;
    use serde_json::json;

    #[test]
    fn status_defaults_to_unread() {
        let message = NewMessage::new(generate_entity_id(), "All Alumni")
            .into_entity("ID".into(), Utc::now())
            .unwrap();
        assert_eq!(message.status, MessageStatus::Unread);
        assert!(message.is_unread());
        assert!(!message.recipient_is_reference());
    }

    #[test]
    fn explicit_status_is_preserved() {
        let draft: NewMessage = serde_json::from_value(json!({
            "sender": generate_entity_id(),
            "recipient": "Career Office",
            "message": "Hello",
            "status": "Read"
        }))
        .unwrap();
        let message = draft.into_entity("ID".into(), Utc::now()).unwrap();
        assert_eq!(message.status, MessageStatus::Read);
        assert_eq!(message.body.as_deref(), Some("Hello"));
    }

    #[test]
    fn unknown_status_is_rejected_when_parsing() {
        let parsed: Result<NewMessage, _> = serde_json::from_value(json!({ "status": "Archived" }));
        assert!(parsed.is_err());
        assert!("archived".parse::<MessageStatus>().is_err());
        assert_eq!("read".parse::<MessageStatus>().unwrap(), MessageStatus::Read);
    }

    #[test]
    fn sender_must_be_a_record_id() {
        let message = NewMessage::new("somebody", "All Alumni")
            .into_entity("ID".into(), Utc::now())
            .unwrap();
        let err = message.validate().unwrap_err();
        assert_eq!(err.issues[0].field, "sender");
        assert_eq!(err.issues[0].code, "validation.id");
    }

    #[test]
    fn body_is_stored_under_message_key() {
        let message = NewMessage {
            body: Some("Welcome".into()),
            ..NewMessage::new(generate_entity_id(), "Asha")
        }
        .into_entity("ID".into(), Utc::now())
        .unwrap();
        let doc = serde_json::to_value(&message).unwrap();
        assert_eq!(doc["message"], "Welcome");
        assert_eq!(doc["status"], "Unread");
    }

    #[test]
    fn status_patch_marks_read() {
        let mut message = NewMessage::new(generate_entity_id(), "Asha")
            .into_entity("ID".into(), Utc::now())
            .unwrap();
        MessagePatch::status(MessageStatus::Read).apply_to(&mut message).unwrap();
        assert!(!message.is_unread());
    }

    #[test]
    fn patch_clears_subject_under_wire_key() {
        let mut message = NewMessage {
            subject: Some("Reunion".into()),
            body: Some("See you there".into()),
            ..NewMessage::new(generate_entity_id(), "Asha")
        }
        .into_entity("ID".into(), Utc::now())
        .unwrap();
        let patch: MessagePatch =
            serde_json::from_value(json!({ "subject": null, "message": "Moved to Friday" })).unwrap();
        patch.apply_to(&mut message).unwrap();
        assert!(message.subject.is_none());
        assert_eq!(message.body.as_deref(), Some("Moved to Friday"));
    }
}
