use std::borrow::Cow;

use sha2::{Digest, Sha256};

use crate::errors::AppError;

/// bcrypt truncates its input past this many bytes.
const BCRYPT_MAX_BYTES: usize = 72;

/// Inputs longer than the bcrypt ceiling are replaced by the hex digest of
/// their SHA-256 (64 ASCII bytes), keeping the entropy of long passwords.
fn prepare_password(password: &str) -> Cow<'_, str> {
    if password.len() > BCRYPT_MAX_BYTES {
        Cow::Owned(hex::encode(Sha256::digest(password.as_bytes())))
    } else {
        Cow::Borrowed(password)
    }
}

pub fn hash_password(password: &str) -> Result<String, AppError> {
    bcrypt::hash(prepare_password(password).as_ref(), bcrypt::DEFAULT_COST)
        .map_err(|e| AppError::PasswordError(e.to_string()))
}

/// Constant-time comparison against a stored hash. A malformed hash is a
/// mismatch, never an error.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    bcrypt::verify(prepare_password(password).as_ref(), stored_hash).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify_roundtrip() {
        let hash = hash_password("s3cret-mot-de-passe").unwrap();
        assert!(verify_password("s3cret-mot-de-passe", &hash));
        assert!(!verify_password("autre-mot-de-passe", &hash));
    }

    #[test]
    fn long_passwords_hash_and_verify() {
        // 100 ASCII chars, past the 72-byte bcrypt ceiling.
        let long: String = std::iter::repeat('a').take(100).collect();
        let hash = hash_password(&long).unwrap();
        assert!(verify_password(&long, &hash));

        // A different long password must not verify against it.
        let other: String = std::iter::repeat('b').take(100).collect();
        assert!(!verify_password(&other, &hash));
    }

    #[test]
    fn multibyte_input_counts_bytes_not_chars() {
        // 30 chars but 90 UTF-8 bytes, so the digest path is taken.
        let long: String = std::iter::repeat('é').take(45).collect();
        assert!(long.len() > BCRYPT_MAX_BYTES);
        let hash = hash_password(&long).unwrap();
        assert!(verify_password(&long, &hash));
    }

    #[test]
    fn verify_against_garbage_hash_is_false() {
        assert!(!verify_password("whatever", "not-a-bcrypt-hash"));
    }

    #[test]
    fn short_passwords_are_passed_through() {
        assert_eq!(prepare_password("abc"), Cow::Borrowed("abc"));
    }
}
