//! Lua-backed write commands for the Redis document store.

pub mod commands;
pub mod executor;
pub mod scripts;

pub use commands::{ClaimKey, InsertCommand, RemoveCommand, ReplaceCommand, StoreCommand};
pub use executor::{ScriptOutcome, execute_command};
