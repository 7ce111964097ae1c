//! RediSearch indexes over stored documents.
//!
//! Every collection that declares indexed fields gets one `FT` index `ON JSON`
//! covering the collection's key prefix. An exact-match [`Filter`] is
//! translated into index clauses when every condition can be expressed:
//!
//! | Field type | Filter value      | Clause              |
//! |------------|-------------------|---------------------|
//! | TAG        | string            | `@field:{value}`    |
//! | TAG        | bool              | `@field:{true}`     |
//! | NUMERIC    | number            | `@field:[n n]`      |
//!
//! Anything else (`null`, nested paths, arrays, unindexed fields) is left to
//! the caller, which falls back to matching documents in process.

use std::borrow::Cow;

use redis::{Value, aio::ConnectionManager, cmd, from_redis_value};
use serde_json::Value as JsonValue;

use crate::{errors::StoreError, filter::Filter, keys::KeyContext};

/// Separator for multi-valued TAG fields. Values containing it are never queried through the index.
pub const TAG_SEPARATOR: char = '|';

const SEARCH_PAGE_SIZE: usize = 500;
const SEARCH_DIALECT: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexFieldType {
    Tag,
    Numeric,
}

/// One indexed attribute of a stored document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexField {
    /// JSONPath inside the document, e.g. `$.skills[*]`.
    pub path: &'static str,
    /// Attribute name; matches the camelCase document field used in filters.
    pub field_name: &'static str,
    pub field_type: IndexFieldType,
}

impl IndexField {
    pub const fn tag(path: &'static str, field_name: &'static str) -> Self {
        Self {
            path,
            field_name,
            field_type: IndexFieldType::Tag,
        }
    }

    pub const fn numeric(path: &'static str, field_name: &'static str) -> Self {
        Self {
            path,
            field_name,
            field_type: IndexFieldType::Numeric,
        }
    }
}

#[derive(Debug, Clone)]
pub struct IndexDefinition {
    pub name: String,
    pub prefix: String,
    pub schema: &'static [IndexField],
}

impl IndexDefinition {
    pub fn for_collection(keys: &KeyContext<'_>, collection: &str, schema: &'static [IndexField]) -> Self {
        Self {
            name: keys.index(collection),
            prefix: keys.entity(collection, ""),
            schema,
        }
    }
}

/// Escape a value for a TAG clause.
///
/// Every ASCII character other than letters, digits and `_` is escaped, which
/// covers the query operators (`-`, `|`, `@`, `{`, `}`) and the separators
/// RediSearch tokenizes on.
pub fn escape_for_tag_query(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        if ch.is_ascii() && !ch.is_ascii_alphanumeric() && ch != '_' {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Translate `filter` into a query over an index with `schema`.
///
/// Returns `None` when any condition cannot be answered exactly by the index.
pub fn build_query(filter: &Filter, schema: &[IndexField]) -> Option<String> {
    if filter.is_empty() {
        return Some("*".to_string());
    }
    let clauses = filter
        .conditions()
        .map(|(field, value)| {
            let indexed = schema.iter().find(|candidate| candidate.field_name == field)?;
            clause(indexed, value)
        })
        .collect::<Option<Vec<_>>>()?;
    Some(clauses.join(" "))
}

fn clause(field: &IndexField, value: &JsonValue) -> Option<String> {
    match (field.field_type, value) {
        (IndexFieldType::Tag, JsonValue::String(text)) => {
            let indexable = !text.is_empty() && text.trim() == text && !text.contains(TAG_SEPARATOR);
            indexable.then(|| format!("@{}:{{{}}}", field.field_name, escape_for_tag_query(text)))
        }
        (IndexFieldType::Tag, JsonValue::Bool(flag)) => Some(format!("@{}:{{{flag}}}", field.field_name)),
        (IndexFieldType::Numeric, JsonValue::Number(number)) => {
            let number = number.as_f64()?;
            number
                .is_finite()
                .then(|| format!("@{}:[{number} {number}]", field.field_name))
        }
        _ => None,
    }
}

/// Whether the index exists and has finished indexing documents written before it was created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexState {
    Ready,
    Building,
}

pub async fn ensure_index(
    conn: &mut ConnectionManager,
    definition: &IndexDefinition,
) -> Result<IndexState, StoreError> {
    let indexes: Vec<String> = cmd("FT._LIST").query_async(conn).await?;
    if !indexes.iter().any(|name| name == &definition.name) {
        create_index(conn, definition).await?;
    }
    index_state(conn, &definition.name).await
}

async fn create_index(conn: &mut ConnectionManager, definition: &IndexDefinition) -> Result<(), StoreError> {
    let mut command = cmd("FT.CREATE");
    command.arg(definition.name.as_str());
    command.arg("ON").arg("JSON");
    command.arg("PREFIX").arg(1).arg(definition.prefix.as_str());
    command.arg("SCHEMA");
    for field in definition.schema {
        command.arg(field.path).arg("AS").arg(field.field_name);
        match field.field_type {
            IndexFieldType::Tag => {
                command
                    .arg("TAG")
                    .arg("SEPARATOR")
                    .arg(TAG_SEPARATOR.to_string())
                    .arg("CASESENSITIVE");
            }
            IndexFieldType::Numeric => {
                command.arg("NUMERIC");
            }
        }
    }

    match command.query_async::<()>(conn).await {
        Ok(()) => Ok(()),
        Err(err) if index_exists_error(&err) => Ok(()),
        Err(err) => Err(err.into()),
    }
}

async fn index_state(conn: &mut ConnectionManager, name: &str) -> Result<IndexState, StoreError> {
    let raw: Value = cmd("FT.INFO").arg(name).query_async(conn).await?;
    let indexing = info_entry(&raw, "indexing").and_then(|value| match value {
        Value::Int(flag) => Some(*flag),
        other => from_redis_value::<String>(other).ok()?.parse::<f64>().ok().map(|flag| flag as i64),
    });
    Ok(match indexing {
        Some(flag) if flag != 0 => IndexState::Building,
        _ => IndexState::Ready,
    })
}

fn info_entry<'a>(info: &'a Value, key: &str) -> Option<&'a Value> {
    match info {
        Value::Array(items) => items.chunks(2).find_map(|pair| match pair {
            [name, value] if from_redis_value::<String>(name).is_ok_and(|name| name == key) => Some(value),
            _ => None,
        }),
        Value::Map(entries) => entries.iter().find_map(|(name, value)| {
            from_redis_value::<String>(name)
                .is_ok_and(|name| name == key)
                .then_some(value)
        }),
        _ => None,
    }
}

fn index_exists_error(err: &redis::RedisError) -> bool {
    let msg = err.to_string().to_ascii_lowercase();
    msg.contains("already exists") && msg.contains("index")
}

/// Drops the index if it exists. Documents are kept.
pub async fn drop_index(conn: &mut ConnectionManager, name: &str) -> Result<(), StoreError> {
    let indexes: Vec<String> = cmd("FT._LIST").query_async(conn).await?;
    if indexes.iter().any(|existing| existing == name) {
        let _: () = cmd("FT.DROPINDEX").arg(name).query_async(conn).await?;
    }
    Ok(())
}

/// Number of documents matching `query`.
pub async fn count_matches(conn: &mut ConnectionManager, index_name: &str, query: &str) -> Result<u64, StoreError> {
    let raw: Value = cmd("FT.SEARCH")
        .arg(index_name)
        .arg(query)
        .arg("NOCONTENT")
        .arg("LIMIT")
        .arg(0)
        .arg(0)
        .arg("DIALECT")
        .arg(SEARCH_DIALECT)
        .query_async(conn)
        .await?;
    let (total, _) = parse_key_page(&raw)?;
    Ok(total)
}

/// Keys of every document matching `query`, fetched a page at a time.
pub async fn matching_keys(
    conn: &mut ConnectionManager,
    index_name: &str,
    query: &str,
) -> Result<Vec<String>, StoreError> {
    let mut keys = Vec::new();
    loop {
        let raw: Value = cmd("FT.SEARCH")
            .arg(index_name)
            .arg(query)
            .arg("NOCONTENT")
            .arg("LIMIT")
            .arg(keys.len())
            .arg(SEARCH_PAGE_SIZE)
            .arg("DIALECT")
            .arg(SEARCH_DIALECT)
            .query_async(conn)
            .await?;
        let (total, page) = parse_key_page(&raw)?;
        let exhausted = page.len() < SEARCH_PAGE_SIZE;
        keys.extend(page);
        if exhausted || keys.len() as u64 >= total {
            return Ok(keys);
        }
    }
}

fn parse_key_page(raw: &Value) -> Result<(u64, Vec<String>), StoreError> {
    let values: Vec<Value> = from_redis_value(raw).map_err(|err| StoreError::Other {
        message: Cow::Owned(format!("failed to parse search response: {err}")),
    })?;
    let Some((total, rest)) = values.split_first() else {
        return Ok((0, Vec::new()));
    };
    let total: u64 = from_redis_value(total).map_err(|err| StoreError::Other {
        message: Cow::Owned(format!("invalid total in search response: {err}")),
    })?;
    let keys = rest
        .iter()
        .map(|key| {
            from_redis_value::<String>(key).map_err(|err| StoreError::Other {
                message: Cow::Owned(format!("invalid key in search response: {err}")),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok((total, keys))
}
