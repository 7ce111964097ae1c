//! In-process document store.
//!
//! [`MemoryStore`] applies the same rules as the Redis store (insertion order,
//! atomic unique claims, owned snapshots) without a server, and
//! [`MemoryConnector`] counts connection attempts and can simulate outages.

use std::{
    collections::HashMap,
    sync::{
        Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use serde_json::Value;

use crate::{
    errors::StoreError,
    store::{Connector, DocumentStore, Query, UniqueClaim},
};

#[derive(Debug, Default)]
struct MemoryCollection {
    order: Vec<String>,
    documents: HashMap<String, Value>,
    // (field, value) -> owning id
    claims: HashMap<(String, String), String>,
}

impl MemoryCollection {
    fn ordered(&self) -> impl Iterator<Item = &Value> {
        self.order.iter().filter_map(|id| self.documents.get(id))
    }

    fn conflict(&self, id: &str, claims: &[UniqueClaim]) -> Option<(UniqueClaim, String)> {
        claims.iter().find_map(|claim| {
            self.claims
                .get(&(claim.field.clone(), claim.value.clone()))
                .filter(|owner| owner.as_str() != id)
                .map(|owner| (claim.clone(), owner.clone()))
        })
    }

    fn release(&mut self, id: &str, previous: &Value, field: &str) {
        if let Some(old_value) = previous.get(field).and_then(Value::as_str) {
            let key = (field.to_string(), old_value.to_string());
            if self.claims.get(&key).is_some_and(|owner| owner == id) {
                self.claims.remove(&key);
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    collections: Arc<RwLock<HashMap<String, MemoryCollection>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents currently stored in `collection`.
    pub fn len(&self, collection: &str) -> usize {
        self.read().get(collection).map_or(0, |c| c.documents.len())
    }

    pub fn is_empty(&self) -> bool {
        self.read().values().all(|c| c.documents.is_empty())
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, MemoryCollection>> {
        self.collections.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, MemoryCollection>> {
        self.collections.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn duplicate(collection: &str, claim: UniqueClaim, owner: String) -> StoreError {
    StoreError::DuplicateKey {
        collection: collection.to_string(),
        field: claim.field,
        value: claim.value,
        existing_id: owner,
    }
}

impl DocumentStore for MemoryStore {
    async fn insert(
        &self,
        collection: &str,
        id: &str,
        document: Value,
        claims: Vec<UniqueClaim>,
    ) -> Result<(), StoreError> {
        let mut collections = self.write();
        let target = collections.entry(collection.to_string()).or_default();
        if target.documents.contains_key(id) {
            return Err(StoreError::Other {
                message: format!("{collection}/{id} already exists").into(),
            });
        }
        if let Some((claim, owner)) = target.conflict(id, &claims) {
            return Err(duplicate(collection, claim, owner));
        }
        for claim in claims {
            target.claims.insert((claim.field, claim.value), id.to_string());
        }
        target.order.push(id.to_string());
        target.documents.insert(id.to_string(), document);
        Ok(())
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, StoreError> {
        Ok(self
            .read()
            .get(collection)
            .and_then(|c| c.documents.get(id))
            .cloned())
    }

    async fn find(&self, query: Query<'_>) -> Result<Vec<Value>, StoreError> {
        let collections = self.read();
        let Some(target) = collections.get(query.collection) else {
            return Ok(Vec::new());
        };
        Ok(target
            .ordered()
            .filter(|document| query.matches(document))
            .cloned()
            .collect())
    }

    async fn count(&self, query: Query<'_>) -> Result<u64, StoreError> {
        let collections = self.read();
        let matching = collections
            .get(query.collection)
            .map_or(0, |target| target.ordered().filter(|document| query.matches(document)).count());
        Ok(matching as u64)
    }

    async fn replace(
        &self,
        collection: &str,
        id: &str,
        document: Value,
        claims: Vec<UniqueClaim>,
    ) -> Result<bool, StoreError> {
        let mut collections = self.write();
        let Some(target) = collections.get_mut(collection) else {
            return Ok(false);
        };
        let Some(previous) = target.documents.get(id).cloned() else {
            return Ok(false);
        };
        if let Some((claim, owner)) = target.conflict(id, &claims) {
            return Err(duplicate(collection, claim, owner));
        }
        for claim in claims {
            target.release(id, &previous, &claim.field);
            target.claims.insert((claim.field, claim.value), id.to_string());
        }
        target.documents.insert(id.to_string(), document);
        Ok(true)
    }

    async fn remove(&self, collection: &str, id: &str, unique_fields: &[&str]) -> Result<bool, StoreError> {
        let mut collections = self.write();
        let Some(target) = collections.get_mut(collection) else {
            return Ok(false);
        };
        let Some(previous) = target.documents.remove(id) else {
            return Ok(false);
        };
        for field in unique_fields {
            target.release(id, &previous, field);
        }
        target.order.retain(|existing| existing != id);
        Ok(true)
    }
}

/// Connector handing out a shared [`MemoryStore`].
///
/// Every call to [`Connector::connect`] counts as one attempt. Attempts can be
/// slowed down with [`MemoryConnector::with_latency`] and made to fail with
/// [`MemoryConnector::fail_next`].
#[derive(Debug, Clone, Default)]
pub struct MemoryConnector {
    store: MemoryStore,
    latency: Duration,
    attempts: Arc<AtomicUsize>,
    pending_failures: Arc<AtomicUsize>,
}

impl MemoryConnector {
    pub fn new(store: MemoryStore) -> Self {
        Self {
            store,
            ..Self::default()
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Make the next `count` attempts fail with a connection error.
    pub fn fail_next(&self, count: usize) {
        self.pending_failures.store(count, Ordering::SeqCst);
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn store(&self) -> &MemoryStore {
        &self.store
    }
}

impl Connector for MemoryConnector {
    type Handle = MemoryStore;

    async fn connect(&self) -> Result<MemoryStore, StoreError> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let failed = self
            .pending_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |remaining| remaining.checked_sub(1))
            .is_ok();
        if failed {
            return Err(StoreError::connection(format!("simulated outage on attempt {attempt}")));
        }
        Ok(self.store.clone())
    }
}
