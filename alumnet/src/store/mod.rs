//! Document store abstraction.
//!
//! A [`DocumentStore`] holds JSON documents grouped into collections. It keeps
//! insertion order, enforces unique claims atomically with each write, and
//! hands out owned copies of stored documents. Two implementations ship with
//! the crate: [`redis_store::RedisStore`] (Redis with the RedisJSON module) and
//! [`memory::MemoryStore`] (in-process, used by tests and local tooling).

pub mod memory;
pub mod redis_store;

use std::future::Future;

use serde::Serialize;
use serde_json::Value;

use crate::{errors::StoreError, filter::Filter, search::IndexField};

pub use self::memory::{MemoryConnector, MemoryStore};
pub use self::redis_store::{RedisConnector, RedisStore};

/// A field value that must not be held by any other document of the same collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct UniqueClaim {
    pub field: String,
    pub value: String,
}

impl UniqueClaim {
    pub fn new(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// A read over one collection: every document, or those matching a filter.
#[derive(Debug, Clone, Copy)]
pub struct Query<'a> {
    pub collection: &'a str,
    /// Fields the backend may have indexed for this collection.
    pub indexed: &'static [IndexField],
    pub filter: Option<&'a Filter>,
}

impl<'a> Query<'a> {
    pub fn all(collection: &'a str) -> Self {
        Self {
            collection,
            indexed: &[],
            filter: None,
        }
    }

    pub fn indexed(mut self, fields: &'static [IndexField]) -> Self {
        self.indexed = fields;
        self
    }

    pub fn filter(mut self, filter: Option<&'a Filter>) -> Self {
        self.filter = filter.filter(|filter| !filter.is_empty());
        self
    }

    pub fn matches(&self, document: &Value) -> bool {
        self.filter.is_none_or(|filter| filter.matches(document))
    }
}

pub trait DocumentStore: Send + Sync {
    /// Stores a new document. Fails with [`StoreError::DuplicateKey`] when a claim is held by another
    /// document; in that case nothing is written.
    fn insert(
        &self,
        collection: &str,
        id: &str,
        document: Value,
        claims: Vec<UniqueClaim>,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Returns an owned copy of the document, or `None` when no document has that id.
    fn get(&self, collection: &str, id: &str) -> impl Future<Output = Result<Option<Value>, StoreError>> + Send;

    /// Returns owned copies of the documents matching `query`, in insertion order.
    fn find(&self, query: Query<'_>) -> impl Future<Output = Result<Vec<Value>, StoreError>> + Send;

    /// Number of documents matching `query`.
    fn count(&self, query: Query<'_>) -> impl Future<Output = Result<u64, StoreError>> + Send;

    /// Overwrites an existing document and moves any claims whose value changed.
    /// Returns `false` when the document does not exist.
    fn replace(
        &self,
        collection: &str,
        id: &str,
        document: Value,
        claims: Vec<UniqueClaim>,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send;

    /// Deletes a document and releases the claims it held on `unique_fields`.
    /// Returns `false` when the document does not exist.
    fn remove(
        &self,
        collection: &str,
        id: &str,
        unique_fields: &[&str],
    ) -> impl Future<Output = Result<bool, StoreError>> + Send;
}

/// Establishes store handles. Implemented once per backend and driven by
/// [`crate::connection::ConnectionManager`].
pub trait Connector: Send + Sync + 'static {
    type Handle: DocumentStore + Clone + 'static;

    fn connect(&self) -> impl Future<Output = Result<Self::Handle, StoreError>> + Send;
}
