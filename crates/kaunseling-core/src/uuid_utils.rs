//! Identifier generation.
//!
//! New records, attachments, comments and links get UUIDv7 identifiers in
//! their hyphenated text form. UUIDv7 embeds a millisecond timestamp, so ids
//! generated later sort after earlier ones. Documents written by older
//! clients carry short opaque ids; those are kept as-is, which is why every
//! id in the model is a `String` rather than a `Uuid`.

use uuid::Uuid;

/// Generate a new opaque identifier.
///
/// # Example
///
/// ```
/// use kaunseling_core::uuid_utils::new_id;
///
/// let a = new_id();
/// let b = new_id();
/// assert_ne!(a, b);
/// ```
#[inline]
pub fn new_id() -> String {
    Uuid::now_v7().to_string()
}

/// Generate an identifier not already taken in the owning list.
///
/// `taken` reports whether a candidate id already exists in scope.
pub fn unique_id(taken: impl Fn(&str) -> bool) -> String {
    loop {
        let candidate = new_id();
        if !taken(&candidate) {
            return candidate;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_new_id_is_v7() {
        let id = new_id();
        let parsed = Uuid::parse_str(&id).unwrap();
        assert_eq!(parsed.get_version_num(), 7);
    }

    #[test]
    fn test_new_id_no_duplicates_in_batch() {
        let ids: HashSet<String> = (0..1000).map(|_| new_id()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn test_unique_id_skips_taken() {
        let existing: HashSet<String> = (0..10).map(|_| new_id()).collect();
        let id = unique_id(|c| existing.contains(c));
        assert!(!existing.contains(&id));
    }

    #[test]
    fn test_ids_sort_by_creation() {
        let first = new_id();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let second = new_id();
        assert!(first < second);
    }
}
