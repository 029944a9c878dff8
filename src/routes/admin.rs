//! Operator console endpoints. Every handler first resolves the caller through
//! `AccountAdmin::operator`, so non-staff accounts get `403` before anything else runs.

use crate::{
    admin::{AccountChangeForm, AccountCreationForm, AdminListQuery, BulkActionRequest, InlineEdit},
    auth::AuthenticatedAccountId,
    error::AppError,
    jobs::Job,
    state::AppState,
};
use actix_web::{delete, get, patch, post, put, web, HttpRequest, HttpResponse, Responder};
use chrono::Utc;
use serde_json::json;

/// Paginated, searchable account list.
#[get("/accounts")]
pub async fn list_accounts(
    state: web::Data<AppState>,
    account_id: AuthenticatedAccountId,
    query: web::Query<AdminListQuery>,
) -> Result<impl Responder, AppError> {
    state.admin.operator(account_id.0).await?;
    let page = state.admin.list(&query, Utc::now()).await?;
    Ok(HttpResponse::Ok().json(page))
}

/// Creation form.
#[post("/accounts")]
pub async fn create_account(
    state: web::Data<AppState>,
    account_id: AuthenticatedAccountId,
    form: web::Json<AccountCreationForm>,
) -> Result<impl Responder, AppError> {
    state.admin.operator(account_id.0).await?;
    let account = state.admin.create(form.into_inner()).await?;
    Ok(HttpResponse::Created().json(account))
}

/// Inline edits of `is_active` and `is_user` from the list view.
#[patch("/accounts")]
pub async fn inline_edit(
    state: web::Data<AppState>,
    account_id: AuthenticatedAccountId,
    rows: web::Json<Vec<InlineEdit>>,
) -> Result<impl Responder, AppError> {
    state.admin.operator(account_id.0).await?;
    let outcome = state.admin.inline_edit(rows.into_inner()).await?;
    Ok(HttpResponse::Ok().json(outcome))
}

#[get("/accounts/actions")]
pub async fn list_actions(
    state: web::Data<AppState>,
    account_id: AuthenticatedAccountId,
) -> Result<impl Responder, AppError> {
    let caller = state.admin.operator(account_id.0).await?;
    Ok(HttpResponse::Ok().json(state.admin.available_actions(&caller)))
}

#[post("/accounts/actions")]
pub async fn run_action(
    state: web::Data<AppState>,
    account_id: AuthenticatedAccountId,
    request: web::Json<BulkActionRequest>,
) -> Result<impl Responder, AppError> {
    let caller = state.admin.operator(account_id.0).await?;
    let outcome = state.admin.run_action(&caller, request.into_inner()).await?;
    Ok(HttpResponse::Ok().json(outcome))
}

/// Detail view with the caller's field permissions for this account.
#[get("/accounts/{id}")]
pub async fn get_account(
    state: web::Data<AppState>,
    account_id: AuthenticatedAccountId,
    path: web::Path<i32>,
) -> Result<impl Responder, AppError> {
    let caller = state.admin.operator(account_id.0).await?;
    let detail = state.admin.detail(&caller, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(detail))
}

/// Change form. Read-only fields in the body are dropped and listed in `ignored_fields`.
#[put("/accounts/{id}")]
pub async fn update_account(
    state: web::Data<AppState>,
    account_id: AuthenticatedAccountId,
    path: web::Path<i32>,
    form: web::Json<AccountChangeForm>,
) -> Result<impl Responder, AppError> {
    let caller = state.admin.operator(account_id.0).await?;
    let outcome = state
        .admin
        .change(&caller, path.into_inner(), form.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(outcome))
}

#[delete("/accounts/{id}")]
pub async fn delete_account(
    state: web::Data<AppState>,
    account_id: AuthenticatedAccountId,
    path: web::Path<i32>,
) -> Result<impl Responder, AppError> {
    let caller = state.admin.operator(account_id.0).await?;
    state.admin.delete(&caller, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Queues a job that logs the request it came from.
#[post("/debug-task")]
pub async fn debug_task(
    state: web::Data<AppState>,
    account_id: AuthenticatedAccountId,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    state.admin.operator(account_id.0).await?;
    let request = format!("{} {} (account {})", req.method(), req.path(), account_id.0);
    let task_id = state.jobs.enqueue(Job::Debug { request })?;
    Ok(HttpResponse::Accepted().json(json!({ "task_id": task_id })))
}
