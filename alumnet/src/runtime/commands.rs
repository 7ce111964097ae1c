use serde::Serialize;

use crate::{keys::KeyContext, store::UniqueClaim};

/// A write executed atomically by one Lua script.
#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreCommand {
    Insert(InsertCommand),
    Replace(ReplaceCommand),
    Remove(RemoveCommand),
}

impl StoreCommand {
    pub fn collection(&self) -> &str {
        match self {
            StoreCommand::Insert(cmd) => &cmd.collection,
            StoreCommand::Replace(cmd) => &cmd.collection,
            StoreCommand::Remove(cmd) => &cmd.collection,
        }
    }
}

/// A unique value together with the key that records its owner.
#[derive(Debug, Clone, Serialize)]
pub struct ClaimKey {
    pub field: String,
    pub value: String,
    pub key: String,
}

#[derive(Debug, Serialize)]
pub struct InsertCommand {
    pub collection: String,
    pub key: String,
    pub entity_id: String,
    pub order_key: String,
    pub sequence_key: String,
    pub payload_json: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub claims: Vec<ClaimKey>,
}

#[derive(Debug, Serialize)]
pub struct ReplaceCommand {
    pub collection: String,
    pub key: String,
    pub entity_id: String,
    pub payload_json: String,
    pub unique_prefix: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub claims: Vec<ClaimKey>,
}

#[derive(Debug, Serialize)]
pub struct RemoveCommand {
    pub collection: String,
    pub key: String,
    pub entity_id: String,
    pub order_key: String,
    pub unique_prefix: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unique_fields: Vec<String>,
}

fn claim_keys(keys: &KeyContext<'_>, collection: &str, claims: &[UniqueClaim]) -> Vec<ClaimKey> {
    claims
        .iter()
        .map(|claim| ClaimKey {
            field: claim.field.clone(),
            value: claim.value.clone(),
            key: keys.unique(collection, &claim.field, &claim.value),
        })
        .collect()
}

pub fn build_insert(
    keys: &KeyContext<'_>,
    collection: &str,
    entity_id: &str,
    payload_json: String,
    claims: &[UniqueClaim],
) -> StoreCommand {
    StoreCommand::Insert(InsertCommand {
        collection: collection.to_string(),
        key: keys.entity(collection, entity_id),
        entity_id: entity_id.to_string(),
        order_key: keys.order(collection),
        sequence_key: keys.sequence(collection),
        payload_json,
        claims: claim_keys(keys, collection, claims),
    })
}

pub fn build_replace(
    keys: &KeyContext<'_>,
    collection: &str,
    entity_id: &str,
    payload_json: String,
    claims: &[UniqueClaim],
) -> StoreCommand {
    StoreCommand::Replace(ReplaceCommand {
        collection: collection.to_string(),
        key: keys.entity(collection, entity_id),
        entity_id: entity_id.to_string(),
        payload_json,
        unique_prefix: keys.unique_prefix(collection),
        claims: claim_keys(keys, collection, claims),
    })
}

pub fn build_remove(
    keys: &KeyContext<'_>,
    collection: &str,
    entity_id: &str,
    unique_fields: &[&str],
) -> StoreCommand {
    StoreCommand::Remove(RemoveCommand {
        collection: collection.to_string(),
        key: keys.entity(collection, entity_id),
        entity_id: entity_id.to_string(),
        order_key: keys.order(collection),
        unique_prefix: keys.unique_prefix(collection),
        unique_fields: unique_fields.iter().map(|field| field.to_string()).collect(),
    })
}
