use crate::error::AppError;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Represents the claims encoded within a session token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject of the token: the account id.
    pub sub: i32,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: usize,
    /// Expiration timestamp (seconds since epoch).
    pub exp: usize,
}

/// Issues and verifies HS256 session tokens with a shared secret.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenService {
    /// Fails with `AppError::ConfigError` unless `ttl_hours` is a positive,
    /// representable number of hours.
    pub fn new(secret: &str, ttl_hours: i64) -> Result<Self, AppError> {
        let ttl = Duration::try_hours(ttl_hours)
            .filter(|ttl| *ttl > Duration::zero())
            .ok_or_else(|| {
                AppError::ConfigError(format!("Invalid token lifetime: {} hours", ttl_hours))
            })?;

        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        })
    }

    /// Generates a token for the given account id.
    ///
    /// # Returns
    /// The encoded JWT, or `AppError::InternalServerError` if the expiry overflows
    /// or encoding fails.
    pub fn generate_token(&self, account_id: i32) -> Result<String, AppError> {
        let now = Utc::now();
        let expiration = now
            .checked_add_signed(self.ttl)
            .ok_or_else(|| AppError::InternalServerError("Token expiry out of range".into()))?;

        let claims = Claims {
            sub: account_id,
            iat: now.timestamp() as usize,
            exp: expiration.timestamp() as usize,
        };

        let token = encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AppError::InternalServerError(format!("Failed to generate token: {}", e)))?;
        log::debug!("issued session token for account {}", account_id);
        Ok(token)
    }

    /// Verifies a token's signature and expiry and returns its claims.
    ///
    /// Malformed, forged and expired tokens all yield `AppError::Unauthorized`.
    pub fn verify_token(&self, token: &str) -> Result<Claims, AppError> {
        decode::<Claims>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| AppError::Unauthorized(format!("Invalid token: {}", e)))
    }
}
