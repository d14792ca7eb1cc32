//! Account passwords
//!
//! Registration and password changes store an Argon2id PHC string; the login
//! form checks against it. Accounts created through GitHub get a hash of a
//! throwaway secret so the column is never empty.

use anyhow::{anyhow, Result};
use argon2::{
    password_hash::{
        rand_core::OsRng, Error as HashError, PasswordHash, PasswordHasher, PasswordVerifier,
        SaltString,
    },
    Argon2,
};

pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| anyhow!("Failed to hash password: {}", e))
}

/// Whether `password` matches the stored `hash`. A stored value that is not
/// a PHC string is an error, not a mismatch.
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed =
        PasswordHash::new(hash).map_err(|e| anyhow!("Stored password hash is malformed: {}", e))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(HashError::Password) => Ok(false),
        Err(e) => Err(anyhow!("Failed to verify password: {}", e)),
    }
}

/// Hash for accounts that sign in through a login provider only
pub fn unusable_password_hash() -> Result<String> {
    hash_password(&uuid::Uuid::new_v4().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registration_length_passwords_verify() {
        // shortest and longest passwords the registration form accepts
        for password in ["secret", "twenty-characters-ok"] {
            let hash = hash_password(password).unwrap();
            assert!(hash.starts_with("$argon2id$"));
            assert!(!hash.contains(password));
            assert!(verify_password(password, &hash).unwrap());
        }
    }

    #[test]
    fn test_same_password_gets_fresh_salt() {
        let ada = hash_password("secret123").unwrap();
        let bob = hash_password("secret123").unwrap();
        assert_ne!(ada, bob);
        assert!(verify_password("secret123", &bob).unwrap());
    }

    #[test]
    fn test_wrong_login_password_is_a_mismatch() {
        let hash = hash_password("secret123").unwrap();
        assert!(!verify_password("Secret123", &hash).unwrap());
        assert!(!verify_password("", &hash).unwrap());
    }

    #[test]
    fn test_malformed_stored_hash_is_an_error() {
        assert!(verify_password("secret123", "").is_err());
        assert!(verify_password("secret123", "plain-text-password").is_err());
    }

    #[test]
    fn test_provider_account_rejects_form_passwords() {
        let hash = unusable_password_hash().unwrap();
        assert!(hash.starts_with("$argon2id$"));
        for attempt in ["", "secret123", "password"] {
            assert!(!verify_password(attempt, &hash).unwrap());
        }
    }
}
