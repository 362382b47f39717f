//! Entity identifiers.

use uuid::Uuid;

/// Generates a fresh entity id.
///
/// Ids are UUIDv7 values rendered as 32 lowercase hex digits. The leading
/// bits are a millisecond timestamp, so ids generated later sort later and
/// a scan over one scope returns entities roughly in creation order.
#[must_use]
pub fn new_id() -> String {
    Uuid::now_v7().simple().to_string()
}

/// Returns `override_id` when given, a fresh id otherwise.
pub(crate) fn resolve_id(override_id: Option<&str>) -> String {
    match override_id {
        Some(id) => id.to_string(),
        None => new_id(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::validate_id;
    use std::collections::HashSet;

    #[test]
    fn ids_are_lowercase_hex() {
        let id = new_id();
        assert_eq!(id.len(), 32);
        assert!(id.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
        assert!(validate_id(&id).is_ok());
    }

    #[test]
    fn ids_are_unique() {
        let ids: HashSet<_> = (0..1000).map(|_| new_id()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn ids_carry_version_seven() {
        let id = Uuid::parse_str(&new_id()).unwrap();
        assert_eq!(id.get_version_num(), 7);
    }

    #[test]
    fn override_wins() {
        assert_eq!(resolve_id(Some("fixed")), "fixed");
        assert_ne!(resolve_id(None), "fixed");
    }
}
