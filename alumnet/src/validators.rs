use email_address::EmailAddress;
use url::Url;

use crate::id::is_valid_entity_id;

/// Returns `true` if the provided string is a syntactically valid email address.
pub fn is_valid_email(value: &str) -> bool {
    EmailAddress::is_valid(value)
}

/// Returns `true` if the provided string parses as a URL with a scheme.
pub fn is_valid_url(value: &str) -> bool {
    Url::parse(value).is_ok()
}

/// Returns `true` if the provided string is a well-formed record reference.
pub fn is_valid_reference(value: &str) -> bool {
    is_valid_entity_id(value)
}

/// Returns `true` when the string has visible content.
pub fn is_present(value: &str) -> bool {
    !value.trim().is_empty()
}
