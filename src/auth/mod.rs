pub mod extractors;
pub mod middleware;
pub mod password;
pub mod token;

use serde::{Deserialize, Serialize};
use validator::Validate;

pub use extractors::AuthenticatedAccountId;
pub use middleware::AuthMiddleware;
pub use password::{BcryptHasher, CredentialHasher};
pub use token::{Claims, TokenService};

/// Represents the payload for a login request.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Login identifier. Normalized before lookup.
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// Response returned after a successful login.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    /// Bearer token for subsequent requests.
    pub token: String,
    pub user_id: i32,
}
