//! Hash based suffixes for generated identifiers
use std::hash::{DefaultHasher, Hash, Hasher};

/// Hash a value with the standard library hasher
pub(crate) fn calculate_hash<T: Hash + ?Sized>(t: &T) -> u64 {
    let mut s = DefaultHasher::new();
    t.hash(&mut s);
    s.finish()
}

/// Hexadecimal representation of the hash of `t`, used to keep generated variable ids from
/// colliding with ids already present in a model
pub(crate) fn hash_as_hex_string<T: Hash + ?Sized>(t: &T) -> String {
    format!("{:x}", calculate_hash(t))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_stable_within_a_run() {
        assert_eq!(hash_as_hex_string("PFK"), hash_as_hex_string("PFK"));
        assert_ne!(hash_as_hex_string("PFK"), hash_as_hex_string("PGI"));
    }
}
