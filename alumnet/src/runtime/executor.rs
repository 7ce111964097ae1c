use std::borrow::Cow;

use redis::aio::ConnectionLike;
use serde_json::Value;

use crate::{
    errors::StoreError,
    runtime::{
        commands::StoreCommand,
        scripts::{INSERT_DOCUMENT_SCRIPT, REMOVE_DOCUMENT_SCRIPT, REPLACE_DOCUMENT_SCRIPT},
    },
};

/// What a write script did to its target document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptOutcome {
    Applied,
    /// The target document did not exist (replace/remove only).
    Missing,
}

pub async fn execute_command<C>(conn: &mut C, command: &StoreCommand) -> Result<ScriptOutcome, StoreError>
where
    C: ConnectionLike + Send,
{
    let (script, payload) = match command {
        StoreCommand::Insert(cmd) => (&*INSERT_DOCUMENT_SCRIPT, serde_json::to_string(cmd)),
        StoreCommand::Replace(cmd) => (&*REPLACE_DOCUMENT_SCRIPT, serde_json::to_string(cmd)),
        StoreCommand::Remove(cmd) => (&*REMOVE_DOCUMENT_SCRIPT, serde_json::to_string(cmd)),
    };
    let payload = payload.map_err(|err| StoreError::Other {
        message: Cow::Owned(format!("failed to serialize command: {err}")),
    })?;

    let mut invocation = script.prepare_invoke();
    invocation.arg(payload);
    let raw: String = invocation.invoke_async(conn).await?;

    let value: Value = serde_json::from_str(&raw).map_err(|err| StoreError::Other {
        message: Cow::Owned(format!("failed to parse lua response: {err}")),
    })?;

    interpret_response(command.collection(), &value)
}

pub(crate) fn interpret_response(collection: &str, value: &Value) -> Result<ScriptOutcome, StoreError> {
    let Some(error) = value.get("error") else {
        let found = value.get("found").and_then(Value::as_bool).unwrap_or(true);
        return Ok(if found { ScriptOutcome::Applied } else { ScriptOutcome::Missing });
    };

    let text = |field: &str| {
        value
            .get(field)
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_default()
    };

    match error.as_str() {
        Some("duplicate_key") => Err(StoreError::DuplicateKey {
            collection: collection.to_string(),
            field: text("field"),
            value: text("value"),
            existing_id: text("existing_entity_id"),
        }),
        Some("entity_exists") => Err(StoreError::Other {
            message: Cow::Owned(format!("{collection}/{} already exists", text("entity_id"))),
        }),
        Some(other) => Err(StoreError::Other {
            message: Cow::Owned(other.to_string()),
        }),
        None => Err(StoreError::Other {
            message: Cow::Borrowed("lua_error"),
        }),
    }
}
