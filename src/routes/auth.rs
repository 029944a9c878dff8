use crate::{
    auth::{AuthResponse, LoginRequest},
    error::AppError,
    models::{normalize_email, AccountCreate, AccountRead},
    state::AppState,
};
use actix_web::{post, web, HttpResponse, Responder};
use chrono::Utc;
use validator::Validate;

/// Register a new account
///
/// Creates the account through the manager and returns its read shape.
#[post("/register")]
pub async fn register(
    state: web::Data<AppState>,
    payload: web::Json<AccountCreate>,
) -> Result<impl Responder, AppError> {
    payload.validate()?;

    let account = state
        .manager
        .create_account(&payload.email, Some(&payload.password), payload.extra_fields())
        .await?;

    Ok(HttpResponse::Created().json(AccountRead::from(account)))
}

/// Login
///
/// Exchanges valid credentials for a bearer token and records the login time.
#[post("/login")]
pub async fn login(
    state: web::Data<AppState>,
    login_data: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    login_data.validate()?;

    let email = normalize_email(&login_data.email);
    let account = match state.store.find_by_email(&email).await? {
        Some(account) if account.is_active => account,
        _ => {
            log::warn!("failed login for {}", email);
            return Err(AppError::Unauthorized("Invalid credentials".into()));
        }
    };

    if !state
        .hasher
        .verify(&login_data.password, &account.password_hash)?
    {
        log::warn!("failed login for account {}", account.id);
        return Err(AppError::Unauthorized("Invalid credentials".into()));
    }

    state.store.record_login(account.id, Utc::now()).await?;
    let token = state.tokens.generate_token(account.id)?;

    Ok(HttpResponse::Ok().json(AuthResponse {
        token,
        user_id: account.id,
    }))
}
