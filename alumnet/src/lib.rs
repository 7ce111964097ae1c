//! Alumnet persistence library.
//!
//! Typed records for the alumni network (users, events, communities,
//! messages and job postings) stored as JSON documents in Redis with the
//! RedisJSON module. [`PersistenceService`] is the entry point: it lazily
//! opens one shared connection through [`ConnectionManager`] and exposes
//! filtered reads, by-id reads, creates, updates and deletes per record kind.

pub mod config;
pub mod connection;
pub mod errors;
pub mod filter;
pub mod id;
pub mod keys;
pub mod models;
pub mod repository;
pub mod runtime;
pub mod search;
pub mod service;
pub mod store;
pub mod validators;

pub use config::StoreConfig;
pub use connection::{ConnectionManager, ReconnectPolicy};
pub use errors::*;
pub use filter::Filter;
pub use models::*;
pub use repository::Repo;
pub use service::PersistenceService;
pub use store::{Connector, DocumentStore, MemoryConnector, MemoryStore, Query, RedisConnector, RedisStore};

// Re-export redis types so users don't need to depend on a specific redis version
pub use redis;
