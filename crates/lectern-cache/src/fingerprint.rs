//! Deterministic request fingerprints.
//!
//! A fingerprint identifies one cacheable request: resource kind, path
//! parameters in order, and query parameters sorted by key. Two logically
//! identical requests produce the same fingerprint regardless of the order
//! the caller assembled the query in.

use sha2::{Digest, Sha256};

/// Stable identifier for a cacheable request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Build a fingerprint from a resource kind, ordered path parameters,
    /// and unordered query parameters.
    ///
    /// Each component is percent-encoded, so the `/`, `?`, `&` and `=`
    /// separators cannot occur inside a component and distinct inputs
    /// cannot collide.
    pub fn new(kind: &str, path_ids: &[&str], query: &[(&str, &str)]) -> Self {
        let mut key = String::from(kind);
        for id in path_ids {
            key.push('/');
            key.push_str(&urlencoding::encode(id));
        }

        if !query.is_empty() {
            let mut pairs: Vec<(&str, &str)> = query.to_vec();
            pairs.sort_unstable();
            key.push('?');
            let encoded = pairs
                .iter()
                .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
                .collect::<Vec<_>>()
                .join("&");
            key.push_str(&encoded);
        }

        Self(key)
    }

    /// The fingerprint as a string key.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Filesystem-safe name for the entry backing this fingerprint.
    ///
    /// SHA-256 of the key rather than sanitized text: sanitization maps
    /// distinct keys onto the same file name, a hash does not.
    pub fn file_name(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.0.as_bytes());
        format!("{:x}.json", hasher.finalize())
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for Fingerprint {
    fn from(key: String) -> Self {
        Self(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_order_is_irrelevant() {
        let a = Fingerprint::new(
            "course_work",
            &["course-1"],
            &[("pageSize", "50"), ("state", "PUBLISHED")],
        );
        let b = Fingerprint::new(
            "course_work",
            &["course-1"],
            &[("state", "PUBLISHED"), ("pageSize", "50")],
        );
        assert_eq!(a, b);
    }

    #[test]
    fn test_distinct_inputs_distinct_fingerprints() {
        let base = Fingerprint::new("courses", &[], &[]);
        let with_id = Fingerprint::new("courses", &["c1"], &[]);
        let other_kind = Fingerprint::new("announcements", &["c1"], &[]);
        let with_query = Fingerprint::new("courses", &["c1"], &[("state", "ACTIVE")]);

        assert_ne!(base, with_id);
        assert_ne!(with_id, other_kind);
        assert_ne!(with_id, with_query);
    }

    #[test]
    fn test_separators_in_components_cannot_collide() {
        // A path id containing '/' must not equal two separate path ids.
        let tricky = Fingerprint::new("courses", &["a/b"], &[]);
        let split = Fingerprint::new("courses", &["a", "b"], &[]);
        assert_ne!(tricky, split);

        // '=' and '&' inside values must not forge extra pairs.
        let forged = Fingerprint::new("courses", &[], &[("k", "v&x=y")]);
        let honest = Fingerprint::new("courses", &[], &[("k", "v"), ("x", "y")]);
        assert_ne!(forged, honest);
    }

    #[test]
    fn test_file_name_is_stable_and_safe() {
        let fp = Fingerprint::new("submissions", &["course/1", "work:2"], &[]);
        let name = fp.file_name();
        assert_eq!(name, fp.file_name());
        assert!(name.ends_with(".json"));
        assert!(!name[..name.len() - 5].contains(|c: char| !c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_display_matches_key() {
        let fp = Fingerprint::new("courses", &[], &[("state", "ACTIVE")]);
        assert_eq!(fp.to_string(), "courses?state=ACTIVE");
    }
}
