use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Draft, Entity, Patch, assign, check_present, check_references, count, required, required_text};
use crate::{
    errors::{IssueCollector, ValidationResult},
    search::IndexField,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_online: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organizer: Option<String>,
    #[serde(default)]
    pub attendee_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_attendees: Option<u32>,
    /// User ids.
    #[serde(default)]
    pub attendees: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl Event {
    /// `true` when a capacity is set and the attendee count has reached it.
    pub fn is_full(&self) -> bool {
        self.max_attendees.is_some_and(|max| self.attendee_count >= max)
    }
}

impl Entity for Event {
    const COLLECTION: &'static str = "events";
    const LABEL: &'static str = "event";
    const INDEXED: &'static [IndexField] = &[
        IndexField::tag("$.location", "location"),
        IndexField::tag("$.organizer", "organizer"),
        IndexField::tag("$.isOnline", "isOnline"),
        IndexField::tag("$.attendees[*]", "attendees"),
        IndexField::numeric("$.attendeeCount", "attendeeCount"),
    ];

    fn id(&self) -> &str {
        &self.id
    }

    fn validate(&self) -> ValidationResult<()> {
        let mut issues = IssueCollector::new();
        check_present(&mut issues, "title", &self.title);
        check_references(&mut issues, "attendees", &self.attendees);
        issues.finish()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEvent {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub location: Option<String>,
    pub is_online: Option<bool>,
    pub organizer: Option<String>,
    pub attendee_count: Option<i64>,
    pub max_attendees: Option<i64>,
    #[serde(default)]
    pub attendees: Vec<String>,
}

impl NewEvent {
    pub fn new(title: impl Into<String>, date: DateTime<Utc>) -> Self {
        Self {
            title: Some(title.into()),
            date: Some(date),
            ..Self::default()
        }
    }
}

impl Draft for NewEvent {
    type Entity = Event;

    fn into_entity(self, id: String, now: DateTime<Utc>) -> ValidationResult<Event> {
        let mut issues = IssueCollector::new();
        let title = required_text(&mut issues, "title", self.title);
        let date = required(&mut issues, "date", self.date);
        let attendee_count = count(&mut issues, "attendeeCount", self.attendee_count).unwrap_or(0);
        let max_attendees = self
            .max_attendees
            .and_then(|limit| count(&mut issues, "maxAttendees", Some(limit)));
        issues.finish()?;

        Ok(Event {
            id,
            title,
            description: self.description,
            image: self.image,
            date: date.unwrap_or(now),
            start_time: self.start_time,
            end_time: self.end_time,
            location: self.location,
            is_online: self.is_online,
            organizer: self.organizer,
            attendee_count,
            max_attendees,
            attendees: self.attendees,
            created_at: now,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPatch {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub image: Option<Option<String>>,
    pub date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub start_time: Option<Option<String>>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub end_time: Option<Option<String>>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub location: Option<Option<String>>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub is_online: Option<Option<bool>>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub organizer: Option<Option<String>>,
    pub attendee_count: Option<i64>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub max_attendees: Option<Option<i64>>,
    pub attendees: Option<Vec<String>>,
}

impl Patch for EventPatch {
    type Entity = Event;

    fn apply_to(self, event: &mut Event) -> ValidationResult<()> {
        let mut issues = IssueCollector::new();
        let attendee_count = count(&mut issues, "attendeeCount", self.attendee_count);
        let max_attendees = self
            .max_attendees
            .map(|limit| count(&mut issues, "maxAttendees", limit));
        issues.finish()?;

        if let Some(title) = self.title {
            event.title = title;
        }
        if let Some(date) = self.date {
            event.date = date;
        }
        if let Some(attendee_count) = attendee_count {
            event.attendee_count = attendee_count;
        }
        assign(&mut event.max_attendees, max_attendees);
        if let Some(attendees) = self.attendees {
            event.attendees = attendees;
        }
        assign(&mut event.is_online, self.is_online);
        for (slot, change) in [
            (&mut event.description, self.description),
            (&mut event.image, self.image),
            (&mut event.start_time, self.start_time),
            (&mut event.end_time, self.end_time),
            (&mut event.location, self.location),
            (&mut event.organizer, self.organizer),
        ] {
            assign(slot, change);
        }
        Ok(())
    }
}
