use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Draft, Entity, Patch, assign, check_email, check_present, required_text};
use crate::{
    errors::{IssueCollector, ValidationResult},
    search::IndexField,
};

/// Alumni profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graduation_year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

impl Entity for User {
    const COLLECTION: &'static str = "users";
    const LABEL: &'static str = "user";
    const UNIQUE_FIELDS: &'static [&'static str] = &["email"];
    const INDEXED: &'static [IndexField] = &[
        IndexField::tag("$.email", "email"),
        IndexField::tag("$.role", "role"),
        IndexField::tag("$.company", "company"),
        IndexField::tag("$.location", "location"),
        IndexField::tag("$.department", "department"),
        IndexField::tag("$.skills[*]", "skills"),
        IndexField::tag("$.isAdmin", "isAdmin"),
        IndexField::numeric("$.graduationYear", "graduationYear"),
    ];

    fn id(&self) -> &str {
        &self.id
    }

    fn validate(&self) -> ValidationResult<()> {
        let mut issues = IssueCollector::new();
        check_present(&mut issues, "name", &self.name);
        check_present(&mut issues, "email", &self.email);
        if !self.email.is_empty() {
            check_email(&mut issues, "email", Some(&self.email));
        }
        issues.finish()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub name: Option<String>,
    pub email: Option<String>,
    pub avatar: Option<String>,
    pub role: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub graduation_year: Option<i32>,
    pub department: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    pub bio: Option<String>,
    pub is_admin: Option<bool>,
}

impl NewUser {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            email: Some(email.into()),
            ..Self::default()
        }
    }
}

impl Draft for NewUser {
    type Entity = User;

    fn into_entity(self, id: String, now: DateTime<Utc>) -> ValidationResult<User> {
        let mut issues = IssueCollector::new();
        let name = required_text(&mut issues, "name", self.name);
        let email = required_text(&mut issues, "email", self.email);
        issues.finish()?;

        Ok(User {
            id,
            name,
            email,
            avatar: self.avatar,
            role: self.role,
            company: self.company,
            location: self.location,
            graduation_year: self.graduation_year,
            department: self.department,
            skills: self.skills,
            bio: self.bio,
            is_admin: self.is_admin.unwrap_or(false),
            created_at: now,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub avatar: Option<Option<String>>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub role: Option<Option<String>>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub company: Option<Option<String>>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub location: Option<Option<String>>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub graduation_year: Option<Option<i32>>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub department: Option<Option<String>>,
    pub skills: Option<Vec<String>>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub bio: Option<Option<String>>,
    pub is_admin: Option<bool>,
}

impl Patch for UserPatch {
    type Entity = User;

    fn apply_to(self, user: &mut User) -> ValidationResult<()> {
        if let Some(name) = self.name {
            user.name = name;
        }
        if let Some(email) = self.email {
            user.email = email;
        }
        if let Some(skills) = self.skills {
            user.skills = skills;
        }
        if let Some(is_admin) = self.is_admin {
            user.is_admin = is_admin;
        }
        assign(&mut user.graduation_year, self.graduation_year);
        for (slot, change) in [
            (&mut user.avatar, self.avatar),
            (&mut user.role, self.role),
            (&mut user.company, self.company),
            (&mut user.location, self.location),
            (&mut user.department, self.department),
            (&mut user.bio, self.bio),
        ] {
            assign(slot, change);
        }
        Ok(())
    }
}
