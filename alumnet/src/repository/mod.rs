//! Typed access to one collection.
//!
//! [`Repo`] turns drafts and patches into stored documents and stored
//! documents back into typed snapshots. It is stateless; every call takes the
//! [`DocumentStore`] handle to run against.

use std::marker::PhantomData;

use chrono::Utc;
use serde_json::Value;

use crate::{
    errors::StoreError,
    filter::Filter,
    id::{generate_entity_id, is_valid_entity_id},
    models::{Draft, Entity, Patch},
    store::{DocumentStore, Query, UniqueClaim},
};

pub struct Repo<T: Entity> {
    _marker: PhantomData<fn() -> T>,
}

impl<T: Entity> Default for Repo<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Entity> Repo<T> {
    pub fn new() -> Self {
        Self { _marker: PhantomData }
    }

    pub fn collection(&self) -> &'static str {
        T::COLLECTION
    }

    /// Records matching `filter` (all records when `None`) in insertion order.
    pub async fn find<S: DocumentStore>(&self, store: &S, filter: Option<&Filter>) -> Result<Vec<T>, StoreError> {
        let documents = store.find(self.query(filter)).await?;
        documents.into_iter().map(decode::<T>).collect()
    }

    pub async fn count<S: DocumentStore>(&self, store: &S, filter: Option<&Filter>) -> Result<u64, StoreError> {
        store.count(self.query(filter)).await
    }

    fn query<'a>(&self, filter: Option<&'a Filter>) -> Query<'a> {
        Query::all(T::COLLECTION).indexed(T::INDEXED).filter(filter)
    }

    /// `Ok(None)` when no record has `id`; [`StoreError::InvalidId`] when `id` is malformed.
    pub async fn find_by_id<S: DocumentStore>(&self, store: &S, id: &str) -> Result<Option<T>, StoreError> {
        self.check_id(id)?;
        store.get(T::COLLECTION, id).await?.map(decode::<T>).transpose()
    }

    pub async fn create<S, D>(&self, store: &S, draft: D) -> Result<T, StoreError>
    where
        S: DocumentStore,
        D: Draft<Entity = T>,
    {
        let id = generate_entity_id();
        let entity = draft.into_entity(id, Utc::now())?;
        entity.validate()?;

        let document = serde_json::to_value(&entity)?;
        let claims = unique_claims::<T>(&document);
        store.insert(T::COLLECTION, entity.id(), document, claims).await?;
        Ok(entity)
    }

    /// Applies `patch` to the stored record. `Ok(None)` when no record has `id`.
    pub async fn update<S, P>(&self, store: &S, id: &str, patch: P) -> Result<Option<T>, StoreError>
    where
        S: DocumentStore,
        P: Patch<Entity = T>,
    {
        let Some(mut entity) = self.find_by_id(store, id).await? else {
            return Ok(None);
        };
        patch.apply_to(&mut entity)?;
        entity.validate()?;

        let document = serde_json::to_value(&entity)?;
        let claims = unique_claims::<T>(&document);
        if store.replace(T::COLLECTION, id, document, claims).await? {
            Ok(Some(entity))
        } else {
            // removed between the read and the write
            Ok(None)
        }
    }

    /// Returns `true` when a record was removed.
    pub async fn delete<S: DocumentStore>(&self, store: &S, id: &str) -> Result<bool, StoreError> {
        self.check_id(id)?;
        store.remove(T::COLLECTION, id, T::UNIQUE_FIELDS).await
    }

    fn check_id(&self, id: &str) -> Result<(), StoreError> {
        if is_valid_entity_id(id) {
            Ok(())
        } else {
            Err(StoreError::InvalidId {
                collection: T::COLLECTION.to_string(),
                id: id.to_string(),
            })
        }
    }
}

fn decode<T: Entity>(document: Value) -> Result<T, StoreError> {
    let id = document
        .get("_id")
        .and_then(Value::as_str)
        .unwrap_or("<unknown>")
        .to_string();
    serde_json::from_value(document).map_err(|err| StoreError::Corrupt {
        collection: T::COLLECTION.to_string(),
        id,
        message: err.to_string(),
    })
}

fn unique_claims<T: Entity>(document: &Value) -> Vec<UniqueClaim> {
    T::UNIQUE_FIELDS
        .iter()
        .filter_map(|field| {
            document
                .get(*field)
                .and_then(Value::as_str)
                .map(|value| UniqueClaim::new(*field, value))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::{NewUser, User, UserPatch},
        store::MemoryStore,
    };
    use serde_json::json;

    #[tokio::test]
    async fn create_then_find_by_id_round_trips() {
        let store = MemoryStore::new();
        let repo = Repo::<User>::new();
        let created = repo.create(&store, NewUser::new("Asha", "asha@kiit.ac.in")).await.unwrap();
        let fetched = repo.find_by_id(&store, &created.id).await.unwrap();
        assert_eq!(fetched, Some(created));
    }

    #[tokio::test]
    async fn invalid_draft_writes_nothing() {
        let store = MemoryStore::new();
        let repo = Repo::<User>::new();
        let err = repo.create(&store, NewUser::new("Asha", "nope")).await.unwrap_err();
        assert!(err.is_validation());
        assert_eq!(store.len("users"), 0);
    }

    #[tokio::test]
    async fn malformed_id_is_distinct_from_missing() {
        let store = MemoryStore::new();
        let repo = Repo::<User>::new();
        assert!(repo.find_by_id(&store, "bad id").await.unwrap_err().is_invalid_id());
        assert!(repo.find_by_id(&store, &generate_entity_id()).await.unwrap().is_none());
        assert!(repo.delete(&store, "bad id").await.unwrap_err().is_invalid_id());
    }

    #[tokio::test]
    async fn mistyped_document_is_reported_as_corrupt() {
        let store = MemoryStore::new();
        let id = generate_entity_id();
        store
            .insert("users", &id, json!({ "_id": id, "name": 42 }), Vec::new())
            .await
            .unwrap();
        let err = Repo::<User>::new().find(&store, None).await.unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { id: ref bad, .. } if *bad == id));
    }

    #[tokio::test]
    async fn update_missing_record_is_none() {
        let store = MemoryStore::new();
        let outcome = Repo::<User>::new()
            .update(&store, &generate_entity_id(), UserPatch::default())
            .await
            .unwrap();
        assert!(outcome.is_none());
    }

    #[tokio::test]
    async fn count_respects_filter() {
        let store = MemoryStore::new();
        let repo = Repo::<User>::new();
        repo.create(&store, NewUser::new("Asha", "asha@kiit.ac.in")).await.unwrap();
        repo.create(
            &store,
            NewUser {
                is_admin: Some(true),
                ..NewUser::new("Ravi", "ravi@kiit.ac.in")
            },
        )
        .await
        .unwrap();
        let admins = Filter::all().eq("isAdmin", true);
        assert_eq!(repo.count(&store, Some(&admins)).await.unwrap(), 1);
        assert_eq!(repo.count(&store, None).await.unwrap(), 2);
    }
}
