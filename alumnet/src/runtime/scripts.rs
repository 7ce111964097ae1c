use redis::Script;
use std::sync::LazyLock;

pub const INSERT_DOCUMENT_SCRIPT_BODY: &str = include_str!("../../lua/insert_document.lua");
pub const REPLACE_DOCUMENT_SCRIPT_BODY: &str = include_str!("../../lua/replace_document.lua");
pub const REMOVE_DOCUMENT_SCRIPT_BODY: &str = include_str!("../../lua/remove_document.lua");

pub static INSERT_DOCUMENT_SCRIPT: LazyLock<Script> = LazyLock::new(|| Script::new(INSERT_DOCUMENT_SCRIPT_BODY));
pub static REPLACE_DOCUMENT_SCRIPT: LazyLock<Script> = LazyLock::new(|| Script::new(REPLACE_DOCUMENT_SCRIPT_BODY));
pub static REMOVE_DOCUMENT_SCRIPT: LazyLock<Script> = LazyLock::new(|| Script::new(REMOVE_DOCUMENT_SCRIPT_BODY));
