use argon2::{
    password_hash::{PasswordHasher, SaltString},
    Argon2,
};
use rand::rngs::OsRng;

use crate::error::{Error, Result};

/// Argon2id PHC string with a fresh random salt.
pub fn hash_password(plain: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| Error::PasswordHash(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use argon2::password_hash::{PasswordHash, PasswordVerifier};

    fn verify(plain: &str, hashed: &str) -> bool {
        let parsed = PasswordHash::new(hashed).unwrap();
        Argon2::default()
            .verify_password(plain.as_bytes(), &parsed)
            .is_ok()
    }

    #[test]
    fn hash_matches_only_its_own_password() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify("correct horse", &hash));
        assert!(!verify("wrong horse", &hash));
    }

    #[test]
    fn salts_differ_between_calls() {
        assert_ne!(hash_password("same").unwrap(), hash_password("same").unwrap());
    }
}
