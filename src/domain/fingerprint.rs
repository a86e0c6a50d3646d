//! Stable short fingerprints for domain objects.

use serde::Serialize;
use sha2::{Digest, Sha256};

/// Number of digest bytes kept (8 hex characters).
const FINGERPRINT_BYTES: usize = 4;

/// Hash the canonical JSON encoding of `parts` into a short hex id.
///
/// Equal inputs always produce equal fingerprints, across processes.
pub fn fingerprint<T: Serialize + ?Sized>(parts: &T) -> String {
    let encoded = serde_json::to_vec(parts).unwrap_or_default();
    let digest = Sha256::digest(&encoded);
    hex::encode(&digest[..FINGERPRINT_BYTES])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_is_stable_and_short() {
        let a = fingerprint(&("Task", "classify", None::<&str>));
        let b = fingerprint(&("Task", "classify", None::<&str>));
        assert_eq!(a, b);
        assert_eq!(a.len(), 8);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_fingerprint_distinguishes_fields() {
        let a = fingerprint(&("Task", "classify", Some("be brief")));
        let b = fingerprint(&("Task", "classify", None::<&str>));
        assert_ne!(a, b);
    }
}
