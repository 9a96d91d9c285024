//! Composite identifier helpers
//!
//! Several resources are addressed by joining parent identifiers with a
//! delimiter: a dedicated host is `pool:host`, an ingress secret is
//! `cluster/secret/namespace`. An identifier must decompose into exactly
//! the expected number of non-empty parts.

use stratus_core::provider::{ProviderError, ProviderResult};

/// Join identifier parts with `:`
pub fn join_colon(parts: &[&str]) -> String {
    parts.join(":")
}

/// Join identifier parts with `/`
pub fn join_slash(parts: &[&str]) -> String {
    parts.join("/")
}

/// Split `id` on `sep` into exactly `expected` non-empty parts
pub fn split_composite(id: &str, sep: char, expected: usize) -> ProviderResult<Vec<&str>> {
    let parts: Vec<&str> = id.split(sep).collect();
    if parts.len() != expected || parts.iter().any(|p| p.is_empty()) {
        return Err(ProviderError::new(format!(
            "malformed identifier '{}': expected {} parts separated by '{}'",
            id, expected, sep
        )));
    }
    Ok(parts)
}

/// Split a `:`-joined identifier
pub fn split_colon(id: &str, expected: usize) -> ProviderResult<Vec<&str>> {
    split_composite(id, ':', expected)
}

/// Split a `/`-joined identifier
pub fn split_slash(id: &str, expected: usize) -> ProviderResult<Vec<&str>> {
    split_composite(id, '/', expected)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_and_split_round_trip() {
        let id = join_colon(&["c-1", "h-7"]);
        assert_eq!(id, "c-1:h-7");
        assert_eq!(split_colon(&id, 2).unwrap(), vec!["c-1", "h-7"]);

        let id = join_slash(&["c-1", "tls-main", "ingress"]);
        assert_eq!(split_slash(&id, 3).unwrap(), vec!["c-1", "tls-main", "ingress"]);
    }

    #[test]
    fn wrong_part_count_is_rejected() {
        assert!(split_colon("c-1", 2).is_err());
        assert!(split_colon("c-1:h-7:extra", 2).is_err());
    }

    #[test]
    fn empty_parts_are_rejected() {
        assert!(split_colon("c-1:", 2).is_err());
        assert!(split_colon(":h-7", 2).is_err());
        assert!(split_slash("c-1//ingress", 3).is_err());
    }
}
