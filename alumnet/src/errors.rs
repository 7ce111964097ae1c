use std::borrow::Cow;

use thiserror::Error;

/// Top-level error type returned by the persistence service.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The document store could not be reached or the connection attempt failed.
    #[error("connection error: {message}")]
    Connection { message: String },

    /// Validation failed for one or more fields. Nothing was written.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Unique constraint violation - the value already belongs to another record.
    #[error("duplicate key: {collection}.{field} = {value:?} already used by '{existing_id}'")]
    DuplicateKey {
        collection: String,
        field: String,
        value: String,
        existing_id: String,
    },

    /// The identifier is not structurally valid for the store's id format.
    #[error("invalid identifier {id:?} for collection '{collection}'")]
    InvalidId { collection: String, id: String },

    /// A stored document no longer matches the typed schema of its collection.
    #[error("corrupt document {collection}/{id}: {message}")]
    Corrupt {
        collection: String,
        id: String,
        message: String,
    },

    /// Underlying Redis command failed for a reason other than connectivity.
    #[error("redis error: {0}")]
    Backend(redis::RedisError),

    /// Configuration could not be loaded or is incomplete.
    #[error("configuration error: {message}")]
    Config { message: String },

    #[error("{message}")]
    Other { message: Cow<'static, str> },
}

impl StoreError {
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection { .. })
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    pub fn is_duplicate_key(&self) -> bool {
        matches!(self, Self::DuplicateKey { .. })
    }

    pub fn is_invalid_id(&self) -> bool {
        matches!(self, Self::InvalidId { .. })
    }
}

impl From<redis::RedisError> for StoreError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_io_error() || err.is_connection_refusal() || err.is_connection_dropped() || err.is_timeout() {
            StoreError::Connection {
                message: err.to_string(),
            }
        } else {
            StoreError::Backend(err)
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Other {
            message: Cow::Owned(format!("json error: {err}")),
        }
    }
}

/// Collection of validation issues encountered while preparing a write.
#[derive(Debug, Clone, Error)]
#[error("validation errors: {issues:?}")]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationError {
    pub fn new<I>(issues: I) -> Self
    where
        I: IntoIterator<Item = ValidationIssue>,
    {
        Self {
            issues: issues.into_iter().collect(),
        }
    }

    /// Convenience helper for constructing a single-field validation error.
    pub fn single(field: impl Into<String>, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new([ValidationIssue::new(field, code, message)])
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// Returns `true` if any issue was raised for `field`.
    pub fn has_field(&self, field: &str) -> bool {
        self.issues.iter().any(|issue| issue.field == field)
    }
}

/// Detailed validation failure for a single field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub field: String,
    pub code: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(field: impl Into<String>, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            code: code.into(),
            message: message.into(),
        }
    }
}

pub type ValidationResult<T> = Result<T, ValidationError>;

/// Accumulates issues while a draft or patch is checked, then converts into a result.
#[derive(Debug, Default)]
pub struct IssueCollector {
    issues: Vec<ValidationIssue>,
}

impl IssueCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: &str, code: &str, message: impl Into<String>) {
        self.issues.push(ValidationIssue::new(field, code, message));
    }

    pub fn missing(&mut self, field: &str) {
        self.push(field, "validation.required", "field is required");
    }

    pub fn finish(self) -> ValidationResult<()> {
        if self.issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::new(self.issues))
        }
    }
}
