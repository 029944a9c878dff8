//! Persistence for accounts.
//!
//! `AccountStore` is the seam between account logic and storage. `PgAccountStore`
//! backs a real deployment; `MemoryAccountStore` is used when no database is
//! configured and throughout the test suite. Both honour the same contract:
//! emails are unique, bulk updates are applied atomically, and listings follow
//! the requested `AccountOrdering`.

pub mod memory;
pub mod postgres;

use std::cmp::Reverse;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::AppError;
use crate::models::{Account, AccountChanges, NewAccount};

pub use memory::MemoryAccountStore;
pub use postgres::PgAccountStore;

#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Persists a new account. A taken email yields `AppError::ValidationError`.
    async fn insert(&self, account: NewAccount) -> Result<Account, AppError>;

    async fn email_exists(&self, email: &str) -> Result<bool, AppError>;

    async fn find_by_id(&self, id: i32) -> Result<Option<Account>, AppError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AppError>;

    /// Returns one page of matching accounts together with the total match count.
    async fn list(
        &self,
        filter: &AccountFilter,
        ordering: AccountOrdering,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Account>, i64), AppError>;

    /// Applies a partial update and returns the stored result.
    async fn update(&self, id: i32, changes: &AccountChanges) -> Result<Account, AppError>;

    /// Applies several partial updates as one unit. Either every account is
    /// updated or, on the first missing id or email collision, none is.
    /// Returns the number of accounts updated.
    async fn update_many(&self, edits: &[(i32, AccountChanges)]) -> Result<u64, AppError>;

    /// Sets one flag on every listed account in a single step.
    /// Repeated ids count once. Returns the number of rows touched.
    async fn set_flag(&self, ids: &[i32], flag: Flag, value: bool) -> Result<u64, AppError>;

    async fn delete_many(&self, ids: &[i32]) -> Result<u64, AppError>;

    async fn record_login(&self, id: i32, at: DateTime<Utc>) -> Result<(), AppError>;
}

/// Boolean columns that bulk operations may flip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flag {
    Active,
    Staff,
    User,
}

impl Flag {
    pub fn column(self) -> &'static str {
        match self {
            Flag::Active => "is_active",
            Flag::Staff => "is_staff",
            Flag::User => "is_user",
        }
    }
}

/// Constraint on `last_login`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LastLoginRange {
    /// `start <= last_login < end`
    Between {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
    Missing,
    Present,
}

impl LastLoginRange {
    pub fn matches(&self, last_login: Option<DateTime<Utc>>) -> bool {
        match (self, last_login) {
            (LastLoginRange::Between { start, end }, Some(at)) => *start <= at && at < *end,
            (LastLoginRange::Between { .. }, None) => false,
            (LastLoginRange::Missing, at) => at.is_none(),
            (LastLoginRange::Present, at) => at.is_some(),
        }
    }
}

/// Criteria combined with AND.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountFilter {
    /// Each term must occur (case-insensitively) in the email or the name.
    pub search_terms: Vec<String>,
    pub is_active: Option<bool>,
    pub is_staff: Option<bool>,
    pub is_admin: Option<bool>,
    pub is_user: Option<bool>,
    pub last_login: Vec<LastLoginRange>,
    /// Restricts the result to these ids when set.
    pub ids: Option<Vec<i32>>,
}

impl AccountFilter {
    pub fn matches(&self, account: &Account) -> bool {
        let email = account.email.to_lowercase();
        let name = account.name.to_lowercase();
        let search_ok = self.search_terms.iter().all(|term| {
            let term = term.to_lowercase();
            email.contains(&term) || name.contains(&term)
        });

        search_ok
            && self.is_active.map_or(true, |v| account.is_active == v)
            && self.is_staff.map_or(true, |v| account.is_staff == v)
            && self.is_admin.map_or(true, |v| account.is_admin == v)
            && self.is_user.map_or(true, |v| account.is_user == v)
            && self.last_login.iter().all(|range| range.matches(account.last_login))
            && self.ids.as_ref().map_or(true, |ids| ids.contains(&account.id))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum AccountOrdering {
    #[serde(rename = "email")]
    EmailAsc,
    #[serde(rename = "-email")]
    EmailDesc,
    #[serde(rename = "name")]
    NameAsc,
    #[serde(rename = "-name")]
    NameDesc,
    #[serde(rename = "date_joined")]
    DateJoinedAsc,
    /// Default order of the account listing.
    #[default]
    #[serde(rename = "-date_joined")]
    DateJoinedDesc,
}

impl AccountOrdering {
    /// `ORDER BY` body, with `id` as a tie-breaker so pages are stable.
    ///
    /// Text columns compare lowercased under the `C` collation, which is what
    /// [`AccountOrdering::sort`] does in memory.
    pub fn sql(self) -> &'static str {
        match self {
            AccountOrdering::EmailAsc => r#"LOWER(email) COLLATE "C" ASC, id ASC"#,
            AccountOrdering::EmailDesc => r#"LOWER(email) COLLATE "C" DESC, id DESC"#,
            AccountOrdering::NameAsc => r#"LOWER(name) COLLATE "C" ASC, id ASC"#,
            AccountOrdering::NameDesc => r#"LOWER(name) COLLATE "C" DESC, id DESC"#,
            AccountOrdering::DateJoinedAsc => "date_joined ASC, id ASC",
            AccountOrdering::DateJoinedDesc => "date_joined DESC, id DESC",
        }
    }

    pub fn sort(self, accounts: &mut [Account]) {
        match self {
            AccountOrdering::EmailAsc => {
                accounts.sort_by_cached_key(|a| (a.email.to_lowercase(), a.id))
            }
            AccountOrdering::EmailDesc => {
                accounts.sort_by_cached_key(|a| Reverse((a.email.to_lowercase(), a.id)))
            }
            AccountOrdering::NameAsc => accounts.sort_by_cached_key(|a| (a.name.to_lowercase(), a.id)),
            AccountOrdering::NameDesc => {
                accounts.sort_by_cached_key(|a| Reverse((a.name.to_lowercase(), a.id)))
            }
            AccountOrdering::DateJoinedAsc => {
                accounts.sort_by(|a, b| (a.date_joined, a.id).cmp(&(b.date_joined, b.id)))
            }
            AccountOrdering::DateJoinedDesc => {
                accounts.sort_by(|a, b| (b.date_joined, b.id).cmp(&(a.date_joined, a.id)))
            }
        }
    }
}
