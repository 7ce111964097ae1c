use std::{
    collections::HashSet,
    fmt,
    sync::{Arc, Mutex, PoisonError},
};

use ::redis::{aio::ConnectionManager as RedisConnection, cmd};
use log::debug;
use serde_json::Value;

use crate::{
    config::{StoreConfig, redact_url},
    errors::StoreError,
    keys::KeyContext,
    runtime::{
        ScriptOutcome,
        commands::{build_insert, build_remove, build_replace},
        execute_command,
    },
    search::{self, IndexDefinition, IndexState},
    store::{Connector, DocumentStore, Query, UniqueClaim},
};

/// Ids read from the order set, and documents fetched with one JSON.MGET, per round trip.
const READ_BATCH: usize = 500;

/// Document store backed by Redis with the RedisJSON and RediSearch modules.
///
/// Cloning is cheap; clones share the underlying multiplexed connection.
#[derive(Clone)]
pub struct RedisStore {
    conn: RedisConnection,
    prefix: Arc<str>,
    // collections whose search index exists and has caught up with existing documents
    ready_indexes: Arc<Mutex<HashSet<String>>>,
}

/// How a read is answered.
#[derive(Debug, PartialEq, Eq)]
enum Plan {
    /// Walk the insertion order.
    All,
    /// Ask the collection's search index.
    Indexed(String),
    /// Walk the insertion order and match documents in process.
    Scan,
}

impl RedisStore {
    pub fn new(conn: RedisConnection, prefix: impl Into<Arc<str>>) -> Self {
        Self {
            conn,
            prefix: prefix.into(),
            ready_indexes: Arc::default(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn key_context(&self) -> KeyContext<'_> {
        KeyContext::new(&self.prefix)
    }

    /// A handle on the shared multiplexed connection.
    pub fn connection(&self) -> RedisConnection {
        self.conn.clone()
    }

    pub async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let _: String = cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }

    /// Delete every key under this store's prefix (for test cleanup).
    ///
    /// Uses SCAN + DEL so Redis is never blocked by a single large command.
    pub async fn clear_namespace(&self) -> Result<u64, StoreError> {
        const SCAN_COUNT: usize = 1000;
        let pattern = self.key_context().namespace_pattern();
        let mut conn = self.conn.clone();

        let index_prefix = format!("{}:", self.prefix);
        let indexes: Vec<String> = cmd("FT._LIST").query_async(&mut conn).await?;
        for index in indexes.iter().filter(|name| name.starts_with(&index_prefix)) {
            search::drop_index(&mut conn, index).await?;
        }
        self.ready_indexes.lock().unwrap_or_else(PoisonError::into_inner).clear();
        let mut cursor: u64 = 0;
        let mut total_deleted: u64 = 0;

        loop {
            let (next_cursor, keys): (u64, Vec<String>) = cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_COUNT)
                .query_async(&mut conn)
                .await?;

            if !keys.is_empty() {
                let deleted: u64 = cmd("DEL").arg(&keys).query_async(&mut conn).await?;
                total_deleted += deleted;
            }

            cursor = next_cursor;
            if cursor == 0 {
                break;
            }
        }

        Ok(total_deleted)
    }
}

impl RedisStore {
    async fn plan(&self, query: &Query<'_>) -> Result<Plan, StoreError> {
        let Some(filter) = query.filter else {
            return Ok(Plan::All);
        };
        if query.indexed.is_empty() {
            return Ok(Plan::Scan);
        }
        let Some(clauses) = search::build_query(filter, query.indexed) else {
            debug!("filter on {} not covered by its index; scanning", query.collection);
            return Ok(Plan::Scan);
        };
        if self.index_ready(query).await? {
            Ok(Plan::Indexed(clauses))
        } else {
            Ok(Plan::Scan)
        }
    }

    async fn index_ready(&self, query: &Query<'_>) -> Result<bool, StoreError> {
        let ready = |store: &Self| {
            store
                .ready_indexes
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .contains(query.collection)
        };
        if ready(self) {
            return Ok(true);
        }

        let definition = self.index_definition(query);
        let mut conn = self.conn.clone();
        match search::ensure_index(&mut conn, &definition).await? {
            IndexState::Ready => {
                self.ready_indexes
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .insert(query.collection.to_string());
                Ok(true)
            }
            IndexState::Building => {
                debug!("index {} still building; scanning", definition.name);
                Ok(false)
            }
        }
    }

    fn index_definition(&self, query: &Query<'_>) -> IndexDefinition {
        IndexDefinition::for_collection(&self.key_context(), query.collection, query.indexed)
    }

    /// Next page of ids after the sequence `after`, with their sequence numbers.
    async fn ordered_ids(&self, collection: &str, after: Option<f64>) -> Result<Vec<(String, f64)>, StoreError> {
        let lower = after.map_or_else(|| "-inf".to_string(), |score| format!("({score}"));
        let mut conn = self.conn.clone();
        let page: Vec<(String, f64)> = cmd("ZRANGEBYSCORE")
            .arg(self.key_context().order(collection))
            .arg(lower)
            .arg("+inf")
            .arg("WITHSCORES")
            .arg("LIMIT")
            .arg(0)
            .arg(READ_BATCH)
            .query_async(&mut conn)
            .await?;
        Ok(page)
    }

    async fn fetch_documents(&self, collection: &str, ids: &[String]) -> Result<Vec<Value>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let keys = self.key_context();
        let entity_keys: Vec<String> = ids.iter().map(|id| keys.entity(collection, id)).collect();
        let mut conn = self.conn.clone();
        let raw: Vec<Option<String>> = cmd("JSON.MGET").arg(&entity_keys).arg(".").query_async(&mut conn).await?;

        // A document removed after its id was read comes back as nil.
        raw.into_iter()
            .flatten()
            .map(|json| serde_json::from_str(&json).map_err(StoreError::from))
            .collect()
    }

    /// Walks the collection in insertion order, one batch at a time, keeping documents `query` matches.
    async fn scan(&self, query: &Query<'_>) -> Result<Vec<Value>, StoreError> {
        let mut matching = Vec::new();
        let mut after = None;
        loop {
            let page = self.ordered_ids(query.collection, after).await?;
            let Some((_, last)) = page.last() else {
                return Ok(matching);
            };
            after = Some(*last);
            let exhausted = page.len() < READ_BATCH;
            let ids: Vec<String> = page.into_iter().map(|(id, _)| id).collect();
            let documents = self.fetch_documents(query.collection, &ids).await?;
            matching.extend(documents.into_iter().filter(|document| query.matches(document)));
            if exhausted {
                return Ok(matching);
            }
        }
    }

    /// Documents behind the search hits, put back into insertion order.
    async fn indexed(&self, query: &Query<'_>, clauses: &str) -> Result<Vec<Value>, StoreError> {
        let definition = self.index_definition(query);
        let mut conn = self.conn.clone();
        let hits = search::matching_keys(&mut conn, &definition.name, clauses).await?;
        let ids: Vec<String> = hits
            .iter()
            .filter_map(|key| key.strip_prefix(definition.prefix.as_str()))
            .map(str::to_string)
            .collect();
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut ordered = Vec::with_capacity(ids.len());
        for chunk in ids.chunks(READ_BATCH) {
            let scores: Vec<Option<f64>> = cmd("ZMSCORE")
                .arg(self.key_context().order(query.collection))
                .arg(chunk)
                .query_async(&mut conn)
                .await?;
            ordered.extend(
                chunk
                    .iter()
                    .zip(scores)
                    .filter_map(|(id, score)| score.map(|score| (score, id.clone()))),
            );
        }
        ordered.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut documents = Vec::with_capacity(ordered.len());
        for chunk in ordered.chunks(READ_BATCH) {
            let ids: Vec<String> = chunk.iter().map(|(_, id)| id.clone()).collect();
            documents.extend(self.fetch_documents(query.collection, &ids).await?);
        }
        Ok(documents)
    }
}

impl DocumentStore for RedisStore {
    async fn insert(
        &self,
        collection: &str,
        id: &str,
        document: Value,
        claims: Vec<UniqueClaim>,
    ) -> Result<(), StoreError> {
        let payload = serde_json::to_string(&document)?;
        let command = build_insert(&self.key_context(), collection, id, payload, &claims);
        let mut conn = self.conn.clone();
        execute_command(&mut conn, &command).await?;
        debug!("inserted {collection}/{id}");
        Ok(())
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, StoreError> {
        let key = self.key_context().entity(collection, id);
        let mut conn = self.conn.clone();
        let raw: Option<String> = cmd("JSON.GET").arg(&key).query_async(&mut conn).await?;
        match raw {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn find(&self, query: Query<'_>) -> Result<Vec<Value>, StoreError> {
        match self.plan(&query).await? {
            Plan::All | Plan::Scan => self.scan(&query).await,
            Plan::Indexed(clauses) => self.indexed(&query, &clauses).await,
        }
    }

    async fn count(&self, query: Query<'_>) -> Result<u64, StoreError> {
        match self.plan(&query).await? {
            Plan::All => {
                let mut conn = self.conn.clone();
                let total: u64 = cmd("ZCARD")
                    .arg(self.key_context().order(query.collection))
                    .query_async(&mut conn)
                    .await?;
                Ok(total)
            }
            Plan::Indexed(clauses) => {
                let definition = self.index_definition(&query);
                let mut conn = self.conn.clone();
                search::count_matches(&mut conn, &definition.name, &clauses).await
            }
            Plan::Scan => Ok(self.scan(&query).await?.len() as u64),
        }
    }

    async fn replace(
        &self,
        collection: &str,
        id: &str,
        document: Value,
        claims: Vec<UniqueClaim>,
    ) -> Result<bool, StoreError> {
        let payload = serde_json::to_string(&document)?;
        let command = build_replace(&self.key_context(), collection, id, payload, &claims);
        let mut conn = self.conn.clone();
        let outcome = execute_command(&mut conn, &command).await?;
        Ok(outcome == ScriptOutcome::Applied)
    }

    async fn remove(&self, collection: &str, id: &str, unique_fields: &[&str]) -> Result<bool, StoreError> {
        let command = build_remove(&self.key_context(), collection, id, unique_fields);
        let mut conn = self.conn.clone();
        let outcome = execute_command(&mut conn, &command).await?;
        Ok(outcome == ScriptOutcome::Applied)
    }
}

/// Opens [`RedisStore`] handles for a configured URL and key prefix.
#[derive(Clone)]
pub struct RedisConnector {
    url: String,
    prefix: String,
}

impl RedisConnector {
    pub fn new(url: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            prefix: prefix.into(),
        }
    }

    pub fn from_config(config: &StoreConfig) -> Self {
        Self::new(config.url.clone(), config.key_prefix.clone())
    }
}

impl fmt::Debug for RedisConnector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisConnector")
            .field("url", &redact_url(&self.url))
            .field("prefix", &self.prefix)
            .finish()
    }
}

impl Connector for RedisConnector {
    type Handle = RedisStore;

    async fn connect(&self) -> Result<RedisStore, StoreError> {
        let client = ::redis::Client::open(self.url.as_str())
            .map_err(|err| StoreError::connection(format!("invalid store url {}: {err}", redact_url(&self.url))))?;
        let conn = RedisConnection::new(client)
            .await
            .map_err(|err| StoreError::connection(format!("failed to connect to {}: {err}", redact_url(&self.url))))?;
        Ok(RedisStore::new(conn, self.prefix.as_str()))
    }
}
