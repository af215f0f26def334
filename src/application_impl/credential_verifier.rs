use crate::application_port::*;
use crate::domain_port::{UserRecord, UserRepo};
use argon2::password_hash::rand_core::OsRng;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use std::sync::Arc;

/// Hash a secret to an argon2id PHC string. Used for seeding and tests; the
/// verifier itself only ever reads hashes.
pub fn hash_secret(secret: &str) -> Result<String, AuthError> {
    let salt = argon2::password_hash::SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(secret.as_bytes(), &salt)
        .map_err(|e| AuthError::InternalError(e.to_string()))?
        .to_string();
    Ok(hash)
}

fn verify_secret(secret: &str, password_hash: &str) -> Result<bool, AuthError> {
    let parsed = PasswordHash::new(password_hash)
        .map_err(|e| AuthError::InternalError(format!("invalid PHC hash: {}", e)))?;

    match Argon2::default().verify_password(secret.as_bytes(), &parsed) {
        Ok(_) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AuthError::InternalError(format!("verify error: {}", e))),
    }
}

pub struct ArgonCredentialVerifier {
    user_repo: Arc<dyn UserRepo>,
    /// Verified against when the user does not exist, so unknown-user and
    /// wrong-password requests fall in the same timing class.
    dummy_hash: String,
}

impl ArgonCredentialVerifier {
    pub fn new(user_repo: Arc<dyn UserRepo>) -> Result<Self, AuthError> {
        let dummy_hash = hash_secret("cadastre-dummy-credential")?;
        Ok(ArgonCredentialVerifier {
            user_repo,
            dummy_hash,
        })
    }
}

#[async_trait::async_trait]
impl CredentialVerifier for ArgonCredentialVerifier {
    async fn verify(&self, username: &str, password: &str) -> Result<UserRecord, AuthError> {
        let rec = self.user_repo.find_by_username(username).await?;

        let Some(rec) = rec else {
            // Burn one verification to prevent a timing side-channel.
            let _ = verify_secret(password, &self.dummy_hash)?;
            return Err(AuthError::InvalidCredentials);
        };

        if !verify_secret(password, &rec.password_hash)? {
            return Err(AuthError::InvalidCredentials);
        }

        // Status is only disclosed once the secret has verified.
        if !rec.is_active {
            return Err(AuthError::AccountDisabled);
        }

        Ok(rec)
    }
}
