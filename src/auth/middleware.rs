use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header,
    web, Error, HttpMessage,
};
use futures::future::{ready, LocalBoxFuture, Ready};

use crate::error::AppError;
use crate::state::AppState;

/// Paths under the protected scope that must stay reachable without a token.
const PUBLIC_PATHS: [&str; 2] = ["/api/auth/login", "/api/auth/register"];

/// Requires a valid bearer token on every request it wraps.
///
/// On success the decoded `Claims` are stored in the request extensions, where
/// `AuthenticatedAccountId` picks them up.
pub struct AuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService { service }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        if PUBLIC_PATHS.iter().any(|path| req.path() == *path) {
            let fut = self.service.call(req);
            return Box::pin(fut);
        }

        let tokens = match req.app_data::<web::Data<AppState>>() {
            Some(state) => state.tokens.clone(),
            None => {
                let app_err = AppError::InternalServerError("Application state missing".into());
                return Box::pin(async move { Err(app_err.into()) });
            }
        };

        let bearer = req
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "));

        match bearer {
            Some(token) => match tokens.verify_token(token) {
                Ok(claims) => {
                    req.extensions_mut().insert(claims);
                    let fut = self.service.call(req);
                    Box::pin(fut)
                }
                Err(app_err) => {
                    log::warn!("rejected bearer token on {}", req.path());
                    Box::pin(async move { Err(app_err.into()) })
                }
            },
            None => {
                let app_err = AppError::Unauthorized("Missing token".into());
                Box::pin(async move { Err(app_err.into()) })
            }
        }
    }
}
