//! Exact-match query filters.
//!
//! A [`Filter`] maps document field names (camelCase, as stored) to the value
//! the field must equal. Matching follows document-store conventions:
//!
//! - a scalar value matches a list field when the list contains it
//!   (`skills = "Rust"` matches a user whose skills include `"Rust"`);
//! - `null` matches a missing field;
//! - numbers compare by value, so `2020` and `2020.0` are equal;
//! - dotted names (`a.b`) reach into nested objects.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::StoreError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Filter {
    conditions: BTreeMap<String, Value>,
}

impl Filter {
    /// An empty filter, matching every record.
    pub fn all() -> Self {
        Self::default()
    }

    /// Adds an exact-match condition on `field`.
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.insert(field.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    pub fn conditions(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.conditions.iter().map(|(field, value)| (field.as_str(), value))
    }

    /// Returns `true` if `document` satisfies every condition.
    pub fn matches(&self, document: &Value) -> bool {
        self.conditions
            .iter()
            .all(|(field, expected)| value_matches(lookup(document, field), expected))
    }

    /// Parses a `field=value` pair. The value is read as JSON when it parses
    /// (`true`, `42`, `null`, `"quoted"`), otherwise it is taken as a plain string.
    pub fn parse_pair(raw: &str) -> Result<(String, Value), StoreError> {
        let (field, value) = raw.split_once('=').ok_or_else(|| StoreError::Other {
            message: format!("filter `{raw}` must have the form field=value").into(),
        })?;
        let field = field.trim();
        if field.is_empty() {
            return Err(StoreError::Other {
                message: format!("filter `{raw}` has an empty field name").into(),
            });
        }
        let value = value.trim();
        let value = serde_json::from_str::<Value>(value).unwrap_or_else(|_| Value::String(value.to_string()));
        Ok((field.to_string(), value))
    }
}

impl FromIterator<(String, Value)> for Filter {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            conditions: iter.into_iter().collect(),
        }
    }
}

fn lookup<'a>(document: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(document, |current, segment| current.get(segment))
}

fn value_matches(actual: Option<&Value>, expected: &Value) -> bool {
    match actual {
        None => expected.is_null(),
        Some(Value::Array(items)) if !expected.is_array() => items.iter().any(|item| scalar_eq(item, expected)),
        Some(actual) => scalar_eq(actual, expected),
    }
}

fn scalar_eq(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Number(a), Value::Number(b)) => match (a.as_f64(), b.as_f64()) {
            (Some(a), Some(b)) => a == b,
            _ => a == b,
        },
        _ => actual == expected,
    }
}
