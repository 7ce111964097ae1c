//! Typed record kinds and the drafts/patches that create and change them.
//!
//! Records serialize to the stored document shape: camelCase field names and
//! the identifier under `_id`. Drafts deserialize from the same shape, with
//! every field optional so that a missing required field is reported as a
//! validation issue rather than a parse failure.

pub mod community;
pub mod event;
pub mod job;
pub mod message;
pub mod user;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, de::DeserializeOwned};

use crate::{
    errors::{IssueCollector, ValidationResult},
    search::IndexField,
    validators::{is_present, is_valid_email, is_valid_reference, is_valid_url},
};

pub use community::{Community, CommunityPatch, NewCommunity};
pub use event::{Event, EventPatch, NewEvent};
pub use job::{Job, JobPatch, JobStatus, NewJob};
pub use message::{Message, MessagePatch, MessageStatus, NewMessage};
pub use user::{NewUser, User, UserPatch};

/// A record kind with its own collection.
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Collection the records are stored in.
    const COLLECTION: &'static str;
    /// Singular name used in log lines.
    const LABEL: &'static str;
    /// Top-level string fields whose values must be unique across the collection.
    const UNIQUE_FIELDS: &'static [&'static str] = &[];
    /// Fields the store may answer filters on without reading every document.
    const INDEXED: &'static [IndexField] = &[];

    fn id(&self) -> &str;

    /// Format checks on a complete record. Run after every create and update.
    fn validate(&self) -> ValidationResult<()>;
}

/// Partial record accepted by a create operation.
pub trait Draft: Send {
    type Entity: Entity;

    /// Checks required fields and applies defaults. `id` is the store-assigned
    /// identifier and `now` the creation instant.
    fn into_entity(self, id: String, now: DateTime<Utc>) -> ValidationResult<Self::Entity>;
}

/// Set of field changes accepted by an update operation. `None` leaves a field untouched;
/// optional fields take `Some(None)` to clear the stored value.
pub trait Patch: Send {
    type Entity: Entity;

    fn apply_to(self, entity: &mut Self::Entity) -> ValidationResult<()>;
}

/// Reads a clearable patch field: a missing key leaves the field alone and `null` clears it.
pub(crate) fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

pub(crate) fn assign<T>(slot: &mut Option<T>, change: Option<Option<T>>) {
    if let Some(value) = change {
        *slot = value;
    }
}

pub(crate) fn required_text(issues: &mut IssueCollector, field: &str, value: Option<String>) -> String {
    match value {
        Some(text) if is_present(&text) => text,
        _ => {
            issues.missing(field);
            String::new()
        }
    }
}

pub(crate) fn required<T>(issues: &mut IssueCollector, field: &str, value: Option<T>) -> Option<T> {
    if value.is_none() {
        issues.missing(field);
    }
    value
}

/// Non-negative counter; negative input is reported and clamped to zero.
pub(crate) fn count(issues: &mut IssueCollector, field: &str, value: Option<i64>) -> Option<u32> {
    let value = value?;
    match u32::try_from(value) {
        Ok(count) => Some(count),
        Err(_) => {
            issues.push(field, "validation.range", format!("value must be between 0 and {}", u32::MAX));
            Some(0)
        }
    }
}

pub(crate) fn check_present(issues: &mut IssueCollector, field: &str, value: &str) {
    if !is_present(value) {
        issues.missing(field);
    }
}

pub(crate) fn check_email(issues: &mut IssueCollector, field: &str, value: Option<&str>) {
    if let Some(value) = value
        && !is_valid_email(value)
    {
        issues.push(field, "validation.email", "value must be a valid email address");
    }
}

pub(crate) fn check_url(issues: &mut IssueCollector, field: &str, value: Option<&str>) {
    if let Some(value) = value
        && !is_valid_url(value)
    {
        issues.push(field, "validation.url", "value must be a valid URL");
    }
}

pub(crate) fn check_reference(issues: &mut IssueCollector, field: &str, value: Option<&str>) {
    if let Some(value) = value
        && !is_valid_reference(value)
    {
        issues.push(field, "validation.id", format!("{value:?} is not a valid record id"));
    }
}

pub(crate) fn check_references(issues: &mut IssueCollector, field: &str, values: &[String]) {
    for value in values {
        check_reference(issues, field, Some(value));
    }
}
