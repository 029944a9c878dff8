use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::{AccountFilter, AccountOrdering, AccountStore, Flag};
use crate::error::AppError;
use crate::models::{Account, AccountChanges, NewAccount};

#[derive(Default)]
struct Inner {
    next_id: i32,
    accounts: BTreeMap<i32, Account>,
}

/// Process-local account storage guarded by a single lock.
///
/// Every write takes the lock for its whole duration, which gives the same
/// atomicity the database provides for uniqueness checks and bulk updates.
#[derive(Default)]
pub struct MemoryAccountStore {
    inner: RwLock<Inner>,
}

impl MemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn not_found(id: i32) -> AppError {
    AppError::NotFound(format!("Account {} not found", id))
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn insert(&self, account: NewAccount) -> Result<Account, AppError> {
        let mut inner = self.inner.write().await;
        if inner.accounts.values().any(|a| a.email == account.email) {
            return Err(AppError::ValidationError(
                "A user with this email already exists.".into(),
            ));
        }

        inner.next_id += 1;
        let stored = Account {
            id: inner.next_id,
            email: account.email,
            name: account.name,
            password_hash: account.password_hash,
            last_login: None,
            is_active: account.is_active,
            is_staff: account.is_staff,
            is_admin: account.is_admin,
            is_user: account.is_user,
            is_superuser: account.is_superuser,
            date_joined: account.date_joined,
        };
        inner.accounts.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn email_exists(&self, email: &str) -> Result<bool, AppError> {
        let inner = self.inner.read().await;
        Ok(inner.accounts.values().any(|a| a.email == email))
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Account>, AppError> {
        Ok(self.inner.read().await.accounts.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AppError> {
        let inner = self.inner.read().await;
        Ok(inner.accounts.values().find(|a| a.email == email).cloned())
    }

    async fn list(
        &self,
        filter: &AccountFilter,
        ordering: AccountOrdering,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Account>, i64), AppError> {
        let inner = self.inner.read().await;
        let mut matched: Vec<Account> = inner
            .accounts
            .values()
            .filter(|a| filter.matches(a))
            .cloned()
            .collect();
        ordering.sort(&mut matched);

        let total = matched.len() as i64;
        let page = matched
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect();
        Ok((page, total))
    }

    async fn update(&self, id: i32, changes: &AccountChanges) -> Result<Account, AppError> {
        let mut inner = self.inner.write().await;
        if let Some(email) = &changes.email {
            if inner.accounts.values().any(|a| a.id != id && &a.email == email) {
                return Err(AppError::ValidationError(
                    "A user with this email already exists.".into(),
                ));
            }
        }

        let account = inner.accounts.get_mut(&id).ok_or_else(|| not_found(id))?;
        changes.apply_to(account);
        Ok(account.clone())
    }

    async fn update_many(&self, edits: &[(i32, AccountChanges)]) -> Result<u64, AppError> {
        let mut inner = self.inner.write().await;

        // Stage every edit first so a failure leaves the map untouched.
        let mut staged: BTreeMap<i32, Account> = BTreeMap::new();
        for (id, changes) in edits {
            let mut account = match staged.remove(id) {
                Some(account) => account,
                None => inner.accounts.get(id).cloned().ok_or_else(|| not_found(*id))?,
            };
            changes.apply_to(&mut account);
            staged.insert(*id, account);
        }

        for account in staged.values() {
            let taken = inner.accounts.values().any(|other| {
                let other_email = staged.get(&other.id).map_or(&other.email, |s| &s.email);
                other.id != account.id && *other_email == account.email
            });
            if taken {
                return Err(AppError::ValidationError(
                    "A user with this email already exists.".into(),
                ));
            }
        }

        let updated = staged.len() as u64;
        inner.accounts.extend(staged);
        Ok(updated)
    }

    async fn set_flag(&self, ids: &[i32], flag: Flag, value: bool) -> Result<u64, AppError> {
        let mut inner = self.inner.write().await;
        let mut updated = 0;
        for id in ids.iter().collect::<BTreeSet<_>>() {
            if let Some(account) = inner.accounts.get_mut(id) {
                match flag {
                    Flag::Active => account.is_active = value,
                    Flag::Staff => account.is_staff = value,
                    Flag::User => account.is_user = value,
                }
                updated += 1;
            }
        }
        Ok(updated)
    }

    async fn delete_many(&self, ids: &[i32]) -> Result<u64, AppError> {
        let mut inner = self.inner.write().await;
        let mut deleted = 0;
        for id in ids {
            if inner.accounts.remove(id).is_some() {
                deleted += 1;
            }
        }
        Ok(deleted)
    }

    async fn record_login(&self, id: i32, at: DateTime<Utc>) -> Result<(), AppError> {
        let mut inner = self.inner.write().await;
        let account = inner.accounts.get_mut(&id).ok_or_else(|| not_found(id))?;
        account.last_login = Some(at);
        Ok(())
    }
}
