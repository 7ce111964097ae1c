use nanoid::nanoid;

/// Alphabet for record identifiers (no ambiguous glyphs).
const ENTITY_ID_ALPHABET: &[char] = &[
    'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'J', 'K', 'L', 'M', 'N', 'P', 'Q', 'R', 'S', 'T', 'U', 'V', 'W', 'X', 'Y',
    'Z', 'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'j', 'm', 'n', 'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z',
];
/// Record identifier length.
pub const ENTITY_ID_LENGTH: usize = 20;

/// Generates a new store-assigned record identifier.
pub fn generate_entity_id() -> String {
    nanoid!(ENTITY_ID_LENGTH, ENTITY_ID_ALPHABET)
}

/// Returns `true` when `candidate` has the shape of an identifier produced by [`generate_entity_id`].
///
/// This is a structural check only; it says nothing about whether a record exists.
pub fn is_valid_entity_id(candidate: &str) -> bool {
    candidate.chars().count() == ENTITY_ID_LENGTH && candidate.chars().all(|c| ENTITY_ID_ALPHABET.contains(&c))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_has_expected_length_and_charset() {
        let id = generate_entity_id();
        assert_eq!(id.len(), ENTITY_ID_LENGTH);
        assert!(id.chars().all(|c| ENTITY_ID_ALPHABET.contains(&c)));
    }

    #[test]
    fn generated_ids_are_valid() {
        for _ in 0..32 {
            assert!(is_valid_entity_id(&generate_entity_id()));
        }
    }

    #[test]
    fn rejects_malformed_ids() {
        assert!(!is_valid_entity_id(""));
        assert!(!is_valid_entity_id("not-an-id"));
        // right length, but contains glyphs outside the alphabet
        assert!(!is_valid_entity_id("0000000000000000000I"));
        assert!(!is_valid_entity_id("ABCDEFGHJKLMNPQRSTUVW"));
    }
}
