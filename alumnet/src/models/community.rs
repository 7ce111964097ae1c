use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Draft, Entity, Patch, assign, check_present, check_references, count, required_text};
use crate::{
    errors::{IssueCollector, ValidationResult},
    search::IndexField,
};

/// Interest or chapter group.
///
/// `members` is a counter kept alongside `members_list`; the two are set
/// independently and may disagree for imported records. Membership changes
/// made through [`CommunityPatch::add_members`] and
/// [`CommunityPatch::remove_members`] move both together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Community {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default)]
    pub members: u32,
    #[serde(default)]
    pub members_list: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl Community {
    pub fn has_member(&self, user_id: &str) -> bool {
        self.members_list.iter().any(|member| member == user_id)
    }
}

impl Entity for Community {
    const COLLECTION: &'static str = "communities";
    const LABEL: &'static str = "community";
    const INDEXED: &'static [IndexField] = &[
        IndexField::tag("$.name", "name"),
        IndexField::tag("$.membersList[*]", "membersList"),
        IndexField::numeric("$.members", "members"),
    ];

    fn id(&self) -> &str {
        &self.id
    }

    fn validate(&self) -> ValidationResult<()> {
        let mut issues = IssueCollector::new();
        check_present(&mut issues, "name", &self.name);
        check_references(&mut issues, "membersList", &self.members_list);
        issues.finish()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCommunity {
    pub name: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    /// Defaults to the length of `members_list`.
    pub members: Option<i64>,
    #[serde(default)]
    pub members_list: Vec<String>,
}

impl NewCommunity {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }
}

impl Draft for NewCommunity {
    type Entity = Community;

    fn into_entity(self, id: String, now: DateTime<Utc>) -> ValidationResult<Community> {
        let mut issues = IssueCollector::new();
        let name = required_text(&mut issues, "name", self.name);
        let members = count(&mut issues, "members", self.members);
        issues.finish()?;

        let members = members.unwrap_or_else(|| u32::try_from(self.members_list.len()).unwrap_or(u32::MAX));
        Ok(Community {
            id,
            name,
            description: self.description,
            image: self.image,
            members,
            members_list: self.members_list,
            created_at: now,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunityPatch {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub image: Option<Option<String>>,
    pub members: Option<i64>,
    pub members_list: Option<Vec<String>>,
    /// Appended to `members_list` when not already present; each addition bumps `members`.
    #[serde(default)]
    pub add_members: Vec<String>,
    /// Removed from `members_list` when present; each removal decrements `members`.
    #[serde(default)]
    pub remove_members: Vec<String>,
}

impl Patch for CommunityPatch {
    type Entity = Community;

    fn apply_to(self, community: &mut Community) -> ValidationResult<()> {
        let mut issues = IssueCollector::new();
        let members = count(&mut issues, "members", self.members);
        issues.finish()?;

        if let Some(name) = self.name {
            community.name = name;
        }
        assign(&mut community.description, self.description);
        assign(&mut community.image, self.image);
        if let Some(members) = members {
            community.members = members;
        }
        if let Some(list) = self.members_list {
            community.members_list = list;
        }
        for user_id in self.add_members {
            if !community.has_member(&user_id) {
                community.members_list.push(user_id);
                community.members = community.members.saturating_add(1);
            }
        }
        for user_id in self.remove_members {
            let before = community.members_list.len();
            community.members_list.retain(|member| *member != user_id);
            if community.members_list.len() < before {
                community.members = community.members.saturating_sub(1);
            }
        }
        Ok(())
    }
}
