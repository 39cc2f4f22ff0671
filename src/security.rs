//! Security helpers (meeting ids, salts, password hashing, constant-time compare)

use rand::Rng;
use sha3::{Digest, Sha3_256};
use subtle::ConstantTimeEq;
use uuid::Uuid;

/// Generate an 8-character opaque meeting id.
/// Collisions within a meeting's 24h lifetime are vanishingly unlikely.
pub fn generate_meeting_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(8);
    id
}

/// Generate a random salt (hex) for hashing passwords.
pub fn generate_salt_hex() -> String {
    let mut rng = rand::rng();
    let mut bytes = [0u8; 16];
    rng.fill(&mut bytes);
    hex::encode(bytes)
}

/// Hash `password` with `salt_hex` using SHA3-256 over the plain
/// concatenation `password || salt`. Output is hex-encoded.
pub fn hash_password(password: &str, salt_hex: &str) -> String {
    let mut hasher = Sha3_256::new();
    hasher.update(password.as_bytes());
    hasher.update(salt_hex.as_bytes());
    let digest = hasher.finalize();
    hex::encode(digest)
}

/// Constant-time equality for hex strings.
pub fn ct_eq_hex(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meeting_id_is_eight_chars() {
        let id = generate_meeting_id();
        assert_eq!(id.len(), 8);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn meeting_ids_are_distinct() {
        assert_ne!(generate_meeting_id(), generate_meeting_id());
    }

    #[test]
    fn password_hash_is_deterministic() {
        let salt = generate_salt_hex();
        assert_eq!(hash_password("pass1", &salt), hash_password("pass1", &salt));
    }

    #[test]
    fn password_hash_depends_on_salt() {
        let a = generate_salt_hex();
        let b = generate_salt_hex();
        assert_ne!(a, b);
        assert_ne!(hash_password("pass1", &a), hash_password("pass1", &b));
    }

    #[test]
    fn password_hash_depends_on_password() {
        let salt = generate_salt_hex();
        assert_ne!(hash_password("pass1", &salt), hash_password("pass2", &salt));
    }

    #[test]
    fn ct_eq_hex_matches_equality() {
        let salt = generate_salt_hex();
        let h = hash_password("pass1", &salt);
        assert!(ct_eq_hex(&h, &h));
        assert!(!ct_eq_hex(&h, &hash_password("pass2", &salt)));
    }
}
