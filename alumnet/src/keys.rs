/// Key-construction helpers for the Redis document layout.
#[derive(Debug, Clone)]
pub struct KeyContext<'a> {
    pub prefix: &'a str,
}

impl<'a> KeyContext<'a> {
    pub fn new(prefix: &'a str) -> Self {
        Self { prefix }
    }

    pub fn entity(&self, collection: &str, entity_id: &str) -> String {
        format!("{}:{}:{}", self.prefix, collection, entity_id)
    }

    /// Sorted set of ids scored by insertion sequence.
    pub fn order(&self, collection: &str) -> String {
        format!("{}:{}:_order", self.prefix, collection)
    }

    pub fn sequence(&self, collection: &str) -> String {
        format!("{}:{}:_seq", self.prefix, collection)
    }

    /// Prefix shared by every unique-claim key of a collection; the field and value are appended.
    pub fn unique_prefix(&self, collection: &str) -> String {
        format!("{}:{}:_unique:", self.prefix, collection)
    }

    pub fn unique(&self, collection: &str, field: &str, value: &str) -> String {
        format!("{}{}:{}", self.unique_prefix(collection), field, value)
    }

    /// Name of the search index over the collection's documents.
    pub fn index(&self, collection: &str) -> String {
        format!("{}:{}:_idx", self.prefix, collection)
    }

    /// Glob matching every key owned by this prefix.
    pub fn namespace_pattern(&self) -> String {
        format!("{}:*", self.prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_entity_keys() {
        let ctx = KeyContext::new("alumnet");
        assert_eq!(ctx.entity("users", "abc"), "alumnet:users:abc");
        assert_eq!(ctx.order("users"), "alumnet:users:_order");
        assert_eq!(ctx.sequence("users"), "alumnet:users:_seq");
        assert_eq!(ctx.index("users"), "alumnet:users:_idx");
    }

    #[test]
    fn unique_key_extends_prefix() {
        let ctx = KeyContext::new("alumnet");
        let key = ctx.unique("users", "email", "a@b.io");
        assert!(key.starts_with(&ctx.unique_prefix("users")));
        assert_eq!(key, "alumnet:users:_unique:email:a@b.io");
    }
}
