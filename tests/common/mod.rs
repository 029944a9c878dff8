#![allow(dead_code)]

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::middleware::Logger;
use actix_web::{http::header, test, web, App};
use extractable::auth::{AuthMiddleware, BcryptHasher, TokenService};
use extractable::jobs::JobQueue;
use extractable::models::{Account, ExtraFields};
use extractable::routes::{self, docs, health};
use extractable::store::{AccountStore, MemoryAccountStore};
use extractable::AppState;

pub const PASSWORD: &str = "Password123!";

pub fn test_state() -> AppState {
    let store: Arc<dyn AccountStore> = Arc::new(MemoryAccountStore::new());
    AppState::new(
        store,
        Arc::new(BcryptHasher::new(4)),
        TokenService::new("integration-test-secret", 1).expect("valid token lifetime"),
        JobQueue::start(),
        "docs".into(),
    )
}

/// The same application `main` serves, minus the network listener.
pub async fn init_app(
    state: AppState,
) -> impl Service<
    actix_http::Request,
    Response = ServiceResponse<impl MessageBody>,
    Error = actix_web::Error,
> {
    test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .service(health::health)
            .service(docs::index)
            .service(
                web::scope("/api")
                    .wrap(AuthMiddleware)
                    .configure(routes::config),
            ),
    )
    .await
}

/// Creates an account directly through the manager and returns it with a bearer header.
pub async fn account_with_token(
    state: &AppState,
    email: &str,
    extra: ExtraFields,
) -> (Account, (header::HeaderName, String)) {
    let account = state
        .manager
        .create_account(email, Some(PASSWORD), extra)
        .await
        .expect("failed to create account");
    let token = state
        .tokens
        .generate_token(account.id)
        .expect("failed to issue token");
    (account, (header::AUTHORIZATION, format!("Bearer {}", token)))
}

pub async fn staff(state: &AppState, email: &str) -> (Account, (header::HeaderName, String)) {
    account_with_token(
        state,
        email,
        ExtraFields {
            is_staff: Some(true),
            ..Default::default()
        },
    )
    .await
}

pub async fn superuser(state: &AppState, email: &str) -> (Account, (header::HeaderName, String)) {
    let account = state
        .manager
        .create_privileged_account(email, Some(PASSWORD), ExtraFields::default())
        .await
        .expect("failed to create superuser");
    let token = state
        .tokens
        .generate_token(account.id)
        .expect("failed to issue token");
    (account, (header::AUTHORIZATION, format!("Bearer {}", token)))
}
