//! Collaborator implementations
//!
//! - [`postgres`]: `sqlx` backed directory and patient lookup
//! - [`memory`]: in-process store for tests and embedding

pub mod memory;
pub mod postgres;

pub use memory::{InMemoryDirectory, InMemoryReferences};
pub use postgres::{PgAccountDirectory, PgReferenceLookup};

use crate::error::AuthError;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, Params,
};

/// Hash a password using Argon2id, producing a PHC string
pub fn hash_password(password: &str, params: Params) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params);

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)?
        .to_string();

    Ok(hash)
}

/// Verify a password against a PHC string.
///
/// Cost parameters are taken from the hash itself.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    let parsed_hash = PasswordHash::new(hash)?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn light_params() -> Params {
        Params::new(1024, 1, 1, None).unwrap()
    }

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("Molar#42", light_params()).unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("Molar#42", &hash).unwrap());
        assert!(!verify_password("molar#42", &hash).unwrap());
    }

    #[test]
    fn test_verify_rejects_garbage_hash() {
        assert!(matches!(
            verify_password("x", "not-a-phc-string"),
            Err(AuthError::Collaborator(_))
        ));
    }
}
