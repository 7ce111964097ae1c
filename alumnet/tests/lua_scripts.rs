//! Write scripts executed against Redis with the RedisJSON module.
//!
//! Uses `ALUMNET_STORE_URL` when set, `redis://127.0.0.1:6379/` otherwise.
//! Every test works under its own key prefix and clears it afterwards.

use alumnet::{
    Connector, RedisConnector, RedisStore, StoreError,
    config::DEFAULT_STORE_URL,
    id::generate_entity_id,
    keys::KeyContext,
    redis::{self, aio::ConnectionManager},
    runtime::{
        ScriptOutcome, StoreCommand,
        commands::{build_insert, build_remove, build_replace},
        execute_command,
    },
    store::UniqueClaim,
};
use serde_json::{Value, json};
use serial_test::serial;

const USERS: &str = "users";

struct Namespace {
    store: RedisStore,
    conn: ConnectionManager,
}

impl Namespace {
    async fn open() -> Self {
        let url = std::env::var("ALUMNET_STORE_URL").unwrap_or_else(|_| DEFAULT_STORE_URL.to_string());
        let prefix = format!("alumnet_lua_{}", generate_entity_id());
        let store = RedisConnector::new(url, prefix).connect().await.expect("connect to redis");
        let conn = store.connection();
        Self { store, conn }
    }

    fn keys(&self) -> KeyContext<'_> {
        self.store.key_context()
    }

    async fn run(&mut self, command: StoreCommand) -> Result<ScriptOutcome, StoreError> {
        execute_command(&mut self.conn, &command).await
    }

    async fn insert_user(&mut self, id: &str, email: &str) -> Result<ScriptOutcome, StoreError> {
        let command = build_insert(&self.keys(), USERS, id, user(id, email), &[email_claim(email)]);
        self.run(command).await
    }

    async fn replace_user(&mut self, id: &str, email: &str) -> Result<ScriptOutcome, StoreError> {
        let command = build_replace(&self.keys(), USERS, id, user(id, email), &[email_claim(email)]);
        self.run(command).await
    }

    async fn remove_user(&mut self, id: &str) -> Result<ScriptOutcome, StoreError> {
        let command = build_remove(&self.keys(), USERS, id, &["email"]);
        self.run(command).await
    }

    async fn claim_owner(&mut self, email: &str) -> Option<String> {
        let key = self.keys().unique(USERS, "email", email);
        redis::cmd("GET").arg(key).query_async(&mut self.conn).await.expect("GET claim")
    }

    async fn document(&mut self, id: &str) -> Option<Value> {
        let key = self.keys().entity(USERS, id);
        let raw: Option<String> = redis::cmd("JSON.GET")
            .arg(key)
            .query_async(&mut self.conn)
            .await
            .expect("JSON.GET");
        raw.map(|json| serde_json::from_str(&json).expect("stored json"))
    }

    async fn order(&mut self) -> Vec<String> {
        let key = self.keys().order(USERS);
        redis::cmd("ZRANGE")
            .arg(key)
            .arg(0)
            .arg(-1)
            .query_async(&mut self.conn)
            .await
            .expect("ZRANGE")
    }

    async fn cleanup(self) {
        self.store.clear_namespace().await.expect("clear namespace");
    }
}

fn user(id: &str, email: &str) -> String {
    json!({ "_id": id, "name": "Alum", "email": email }).to_string()
}

fn email_claim(email: &str) -> UniqueClaim {
    UniqueClaim::new("email", email)
}

#[tokio::test]
#[serial]
async fn insert_claims_value_and_appends_to_order() {
    let mut ns = Namespace::open().await;

    for (id, email) in [("c", "c@kiit.ac.in"), ("a", "a@kiit.ac.in"), ("b", "b@kiit.ac.in")] {
        assert_eq!(ns.insert_user(id, email).await.unwrap(), ScriptOutcome::Applied);
    }

    assert_eq!(ns.order().await, ["c", "a", "b"]);
    assert_eq!(ns.claim_owner("a@kiit.ac.in").await.as_deref(), Some("a"));
    assert_eq!(ns.document("a").await.unwrap()["email"], "a@kiit.ac.in");

    ns.cleanup().await;
}

#[tokio::test]
#[serial]
async fn duplicate_claim_rejects_insert_without_writing() {
    let mut ns = Namespace::open().await;
    ns.insert_user("a", "asha@kiit.ac.in").await.unwrap();

    let err = ns.insert_user("b", "asha@kiit.ac.in").await.unwrap_err();
    match err {
        StoreError::DuplicateKey {
            collection,
            field,
            value,
            existing_id,
        } => {
            assert_eq!(collection, USERS);
            assert_eq!(field, "email");
            assert_eq!(value, "asha@kiit.ac.in");
            assert_eq!(existing_id, "a");
        }
        other => panic!("expected duplicate key, got {other:?}"),
    }

    assert!(ns.document("b").await.is_none());
    assert_eq!(ns.order().await, ["a"]);
    assert_eq!(ns.claim_owner("asha@kiit.ac.in").await.as_deref(), Some("a"));

    ns.cleanup().await;
}

#[tokio::test]
#[serial]
async fn insert_over_existing_document_is_refused() {
    let mut ns = Namespace::open().await;
    ns.insert_user("a", "first@kiit.ac.in").await.unwrap();

    let err = ns.insert_user("a", "second@kiit.ac.in").await.unwrap_err();
    assert!(!err.is_duplicate_key());
    assert_eq!(ns.document("a").await.unwrap()["email"], "first@kiit.ac.in");
    assert!(ns.claim_owner("second@kiit.ac.in").await.is_none());

    ns.cleanup().await;
}

#[tokio::test]
#[serial]
async fn replace_moves_changed_claim() {
    let mut ns = Namespace::open().await;
    ns.insert_user("a", "old@kiit.ac.in").await.unwrap();

    assert_eq!(ns.replace_user("a", "new@kiit.ac.in").await.unwrap(), ScriptOutcome::Applied);
    assert_eq!(ns.document("a").await.unwrap()["email"], "new@kiit.ac.in");
    assert!(ns.claim_owner("old@kiit.ac.in").await.is_none());
    assert_eq!(ns.claim_owner("new@kiit.ac.in").await.as_deref(), Some("a"));

    // the released address can be claimed again
    assert_eq!(ns.insert_user("b", "old@kiit.ac.in").await.unwrap(), ScriptOutcome::Applied);
    assert_eq!(ns.order().await, ["a", "b"]);

    ns.cleanup().await;
}

#[tokio::test]
#[serial]
async fn replace_onto_claimed_value_changes_nothing() {
    let mut ns = Namespace::open().await;
    ns.insert_user("a", "asha@kiit.ac.in").await.unwrap();
    ns.insert_user("b", "ravi@kiit.ac.in").await.unwrap();

    let err = ns.replace_user("b", "asha@kiit.ac.in").await.unwrap_err();
    assert!(err.is_duplicate_key());
    assert_eq!(ns.document("b").await.unwrap()["email"], "ravi@kiit.ac.in");
    assert_eq!(ns.claim_owner("ravi@kiit.ac.in").await.as_deref(), Some("b"));
    assert_eq!(ns.claim_owner("asha@kiit.ac.in").await.as_deref(), Some("a"));

    ns.cleanup().await;
}

#[tokio::test]
#[serial]
async fn replace_keeping_own_claim_succeeds() {
    let mut ns = Namespace::open().await;
    ns.insert_user("a", "asha@kiit.ac.in").await.unwrap();

    assert_eq!(ns.replace_user("a", "asha@kiit.ac.in").await.unwrap(), ScriptOutcome::Applied);
    assert_eq!(ns.claim_owner("asha@kiit.ac.in").await.as_deref(), Some("a"));

    ns.cleanup().await;
}

#[tokio::test]
#[serial]
async fn remove_releases_claim_and_order_entry() {
    let mut ns = Namespace::open().await;
    ns.insert_user("a", "asha@kiit.ac.in").await.unwrap();
    ns.insert_user("b", "ravi@kiit.ac.in").await.unwrap();

    assert_eq!(ns.remove_user("a").await.unwrap(), ScriptOutcome::Applied);
    assert!(ns.document("a").await.is_none());
    assert!(ns.claim_owner("asha@kiit.ac.in").await.is_none());
    assert_eq!(ns.order().await, ["b"]);

    assert_eq!(ns.insert_user("c", "asha@kiit.ac.in").await.unwrap(), ScriptOutcome::Applied);

    ns.cleanup().await;
}

#[tokio::test]
#[serial]
async fn missing_document_reports_not_found() {
    let mut ns = Namespace::open().await;

    assert_eq!(ns.replace_user("ghost", "ghost@kiit.ac.in").await.unwrap(), ScriptOutcome::Missing);
    assert!(ns.document("ghost").await.is_none());
    assert!(ns.claim_owner("ghost@kiit.ac.in").await.is_none());

    assert_eq!(ns.remove_user("ghost").await.unwrap(), ScriptOutcome::Missing);
    assert!(ns.order().await.is_empty());

    ns.cleanup().await;
}
