use actix_web::dev::Payload;
use actix_web::{Error as ActixError, FromRequest, HttpMessage, HttpRequest};
use std::future::{ready, Ready};

use crate::auth::token::Claims;
use crate::error::AppError;

/// The id of the account behind the request's bearer token.
///
/// Only usable on routes wrapped by `AuthMiddleware`, which verifies the token and
/// stores its `Claims` in the request extensions. Without them the extractor fails
/// with `AppError::Unauthorized`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedAccountId(pub i32);

impl FromRequest for AuthenticatedAccountId {
    type Error = ActixError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        match req.extensions().get::<Claims>() {
            Some(claims) => ready(Ok(AuthenticatedAccountId(claims.sub))),
            None => {
                let err = AppError::Unauthorized(
                    "Account not found in request. Ensure AuthMiddleware is active.".to_string(),
                );
                ready(Err(err.into()))
            }
        }
    }
}
