//! The operator console over accounts.
//!
//! `AccountAdmin` holds every console operation. HTTP handlers in `routes::admin`
//! only resolve the caller and forward to it. Permission checks happen here, per
//! request, against the calling account's own flags.

pub mod actions;
pub mod forms;
pub mod listing;
pub mod policy;

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::AppError;
use crate::manager::AccountManager;
use crate::models::{normalize_email, Account};
use crate::store::AccountStore;

pub use actions::{ActionOutcome, BulkAction, BulkActionRequest};
pub use forms::{AccountChangeForm, AccountCreationForm, InlineEdit, InlineEditOutcome};
pub use listing::{AdminListQuery, AdminPage, LastLoginFilter, PER_PAGE};
pub use policy::{editable_fields, has_delete_permission, readonly_fields, AccountField};

/// An account as the detail editor shows it to a particular operator.
#[derive(Debug, Serialize)]
pub struct AccountDetail {
    #[serde(flatten)]
    pub account: Account,
    pub readonly_fields: BTreeSet<AccountField>,
    pub editable_fields: BTreeSet<AccountField>,
}

#[derive(Debug, Serialize)]
pub struct ChangeOutcome {
    #[serde(flatten)]
    pub account: Account,
    pub ignored_fields: Vec<AccountField>,
}

#[derive(Debug, Serialize)]
pub struct ActionChoice {
    pub action: BulkAction,
    pub description: &'static str,
}

#[derive(Clone)]
pub struct AccountAdmin {
    store: Arc<dyn AccountStore>,
    manager: AccountManager,
}

impl AccountAdmin {
    pub fn new(store: Arc<dyn AccountStore>, manager: AccountManager) -> Self {
        Self { store, manager }
    }

    /// Loads the calling account and checks that it may use the console.
    pub async fn operator(&self, account_id: i32) -> Result<Account, AppError> {
        let caller = self
            .store
            .find_by_id(account_id)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Account no longer exists".into()))?;

        if !caller.is_operator() {
            log::warn!("account {} denied console access", caller.id);
            return Err(AppError::Forbidden("Staff access required".into()));
        }
        Ok(caller)
    }

    pub async fn list(&self, query: &AdminListQuery, now: DateTime<Utc>) -> Result<AdminPage, AppError> {
        let page = query.page()?;
        let filter = query.to_filter(now)?;
        let offset = i64::from(page - 1) * i64::from(PER_PAGE);

        let (accounts, count) = self
            .store
            .list(&filter, query.ordering(), i64::from(PER_PAGE), offset)
            .await?;
        Ok(AdminPage::new(accounts, count, page))
    }

    pub async fn detail(&self, caller: &Account, id: i32) -> Result<AccountDetail, AppError> {
        let account = self.find(id).await?;
        Ok(AccountDetail {
            readonly_fields: readonly_fields(caller, Some(&account)),
            editable_fields: editable_fields(caller, Some(&account)),
            account,
        })
    }

    pub async fn create(&self, form: AccountCreationForm) -> Result<Account, AppError> {
        form.clean()?;
        if self.store.email_exists(&normalize_email(&form.email)).await? {
            return Err(AppError::ValidationError(
                "A user with this email already exists.".into(),
            ));
        }

        self.manager
            .create_account(&form.email, Some(&form.password1), form.extra_fields())
            .await
    }

    /// Applies the editable part of `form` to account `id`. Submitted fields that
    /// are read-only, or have no storage, are dropped and reported back in
    /// `ignored_fields`.
    pub async fn change(
        &self,
        caller: &Account,
        id: i32,
        form: AccountChangeForm,
    ) -> Result<ChangeOutcome, AppError> {
        use validator::Validate;
        form.validate()?;

        let target = self.find(id).await?;
        let editable = editable_fields(caller, Some(&target));
        let (changes, ignored_fields) = form.into_changes(&editable);

        if !ignored_fields.is_empty() {
            let names: Vec<&str> = ignored_fields.iter().map(|f| f.as_str()).collect();
            log::debug!(
                "account {} submitted fields not applied to account {}: {}",
                caller.id,
                id,
                names.join(", ")
            );
        }

        let account = self.store.update(id, &changes).await?;
        Ok(ChangeOutcome {
            account,
            ignored_fields,
        })
    }

    pub async fn delete(&self, caller: &Account, id: i32) -> Result<(), AppError> {
        if !has_delete_permission(caller) {
            log::warn!("account {} refused deletion of account {}", caller.id, id);
            return Err(AppError::Forbidden(
                "Only superusers can delete accounts".into(),
            ));
        }

        let target = self.find(id).await?;
        self.store.delete_many(&[target.id]).await?;
        log::info!("account {} deleted account {} ({})", caller.id, target.id, target.email);
        Ok(())
    }

    /// The actions `caller` may pick from.
    pub fn available_actions(&self, caller: &Account) -> Vec<ActionChoice> {
        BulkAction::ALL
            .into_iter()
            .filter(|action| *action != BulkAction::DeleteSelected || has_delete_permission(caller))
            .map(|action| ActionChoice {
                action,
                description: action.description(),
            })
            .collect()
    }

    pub async fn run_action(
        &self,
        caller: &Account,
        request: BulkActionRequest,
    ) -> Result<ActionOutcome, AppError> {
        if request.ids.is_empty() {
            return Err(AppError::BadRequest(
                "Items must be selected in order to perform actions on them.".into(),
            ));
        }

        let updated = match request.action.flag_update() {
            Some((flag, value)) => self.store.set_flag(&request.ids, flag, value).await?,
            None => {
                if !has_delete_permission(caller) {
                    log::warn!("account {} refused bulk deletion", caller.id);
                    return Err(AppError::Forbidden(
                        "Only superusers can delete accounts".into(),
                    ));
                }
                self.store.delete_many(&request.ids).await?
            }
        };

        let message = request.action.message(updated);
        log::info!("account {} ran {:?}: {}", caller.id, request.action, message);
        Ok(ActionOutcome { message, updated })
    }

    /// Applies every row or none of them.
    pub async fn inline_edit(&self, rows: Vec<InlineEdit>) -> Result<InlineEditOutcome, AppError> {
        let edits: Vec<_> = rows
            .iter()
            .map(|row| (row.id, row.changes()))
            .filter(|(_, changes)| !changes.is_empty())
            .collect();
        let updated = if edits.is_empty() {
            0
        } else {
            self.store.update_many(&edits).await?
        };

        Ok(InlineEditOutcome {
            message: format!("{} user(s) were changed successfully.", updated),
            updated,
        })
    }

    async fn find(&self, id: i32) -> Result<Account, AppError> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Account {} not found", id)))
    }
}
