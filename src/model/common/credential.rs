use argon2::Config;
use rand::Rng;

/// Hash a secret for storage, using a fresh random salt.
pub fn hash_credential(secret: &str) -> Result<String, argon2::Error> {
    // 16 bytes is recommended for password hashing:
    //  https://en.wikipedia.org/wiki/Argon2
    let mut salt = [0_u8; 16];
    rand::thread_rng().fill(&mut salt);
    argon2::hash_encoded(secret.as_bytes(), &salt, &Config::default())
}

/// Check a supplied secret against a stored hash.
///
/// The plaintext is never compared directly. A malformed stored hash verifies as `false`.
pub fn verify_credential(stored_hash: &str, supplied: impl AsRef<[u8]>) -> bool {
    argon2::verify_encoded(stored_hash, supplied.as_ref()).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let hash = hash_credential("hunter22").unwrap();
        assert_ne!(hash, "hunter22");
        assert!(verify_credential(&hash, "hunter22"));
        assert!(!verify_credential(&hash, "hunter23"));
    }

    #[test]
    fn salts_differ() {
        let first = hash_credential("hunter22").unwrap();
        let second = hash_credential("hunter22").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn malformed_hash_never_verifies() {
        assert!(!verify_credential("", "anything"));
        assert!(!verify_credential("$argon2i$garbage", "anything"));
        assert!(!verify_credential("hunter22", "hunter22"));
    }
}
