use crate::{
    auth::AuthenticatedAccountId,
    error::AppError,
    models::{Account, AccountRead},
    state::AppState,
    store::{AccountFilter, AccountOrdering},
};
use actix_web::{get, web, HttpResponse, Responder};

async fn caller(state: &AppState, id: AuthenticatedAccountId) -> Result<Account, AppError> {
    state
        .store
        .find_by_id(id.0)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Account no longer exists".into()))
}

/// The caller's own account.
#[get("/me")]
pub async fn me(
    state: web::Data<AppState>,
    account_id: AuthenticatedAccountId,
) -> Result<impl Responder, AppError> {
    let account = caller(&state, account_id).await?;
    Ok(HttpResponse::Ok().json(AccountRead::from(account)))
}

/// Lists accounts, newest first.
///
/// Operators see every account. Anyone else only sees their own.
#[get("")]
pub async fn list_accounts(
    state: web::Data<AppState>,
    account_id: AuthenticatedAccountId,
) -> Result<impl Responder, AppError> {
    let account = caller(&state, account_id).await?;

    let filter = if account.is_operator() {
        AccountFilter::default()
    } else {
        AccountFilter {
            ids: Some(vec![account.id]),
            ..Default::default()
        }
    };
    let (accounts, _) = state
        .store
        .list(&filter, AccountOrdering::DateJoinedDesc, i64::MAX, 0)
        .await?;

    let body: Vec<AccountRead> = accounts.iter().map(AccountRead::from).collect();
    Ok(HttpResponse::Ok().json(body))
}

/// A single account. Accounts outside the caller's view are reported as missing.
#[get("/{id}")]
pub async fn get_account(
    state: web::Data<AppState>,
    account_id: AuthenticatedAccountId,
    path: web::Path<i32>,
) -> Result<impl Responder, AppError> {
    let id = path.into_inner();
    let account = caller(&state, account_id).await?;
    let not_found = || AppError::NotFound(format!("Account {} not found", id));

    if account.id != id && !account.is_operator() {
        return Err(not_found());
    }

    let target = state.store.find_by_id(id).await?.ok_or_else(not_found)?;
    Ok(HttpResponse::Ok().json(AccountRead::from(target)))
}
