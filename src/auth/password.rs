use crate::error::AppError;
use crate::models::account::UNUSABLE_PASSWORD_PREFIX;
use bcrypt::{hash, verify};
use uuid::Uuid;

/// One-way credential derivation, supplied to the account manager from outside.
pub trait CredentialHasher: Send + Sync {
    /// Derives an opaque credential from a plaintext password.
    fn hash(&self, password: &str) -> Result<String, AppError>;

    /// Checks a plaintext password against a stored credential.
    fn verify(&self, password: &str, credential: &str) -> Result<bool, AppError>;

    /// A credential that no password will ever verify against.
    fn unusable(&self) -> String {
        format!("{}{}", UNUSABLE_PASSWORD_PREFIX, Uuid::new_v4().simple())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BcryptHasher {
    cost: u32,
}

impl BcryptHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }
}

impl Default for BcryptHasher {
    fn default() -> Self {
        Self::new(bcrypt::DEFAULT_COST)
    }
}

impl CredentialHasher for BcryptHasher {
    fn hash(&self, password: &str) -> Result<String, AppError> {
        hash(password, self.cost)
            .map_err(|e| AppError::InternalServerError(format!("Failed to hash password: {}", e)))
    }

    fn verify(&self, password: &str, credential: &str) -> Result<bool, AppError> {
        if credential.starts_with(UNUSABLE_PASSWORD_PREFIX) {
            return Ok(false);
        }
        verify(password, credential)
            .map_err(|e| AppError::InternalServerError(format!("Failed to verify password: {}", e)))
    }
}
