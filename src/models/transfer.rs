use serde::{Deserialize, Serialize};
use validator::Validate;

use super::account::{Account, ExtraFields};

/// Payload accepted when a caller registers a new account.
///
/// `id` is accepted for symmetry with the read shape but is always assigned by
/// storage. `password` is write-only and never appears in a response.
#[derive(Debug, Deserialize, Validate)]
pub struct AccountCreate {
    #[serde(default)]
    pub id: Option<i32>,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
    #[serde(default)]
    pub is_user: Option<bool>,
    #[serde(default)]
    pub is_admin: Option<bool>,
}

impl AccountCreate {
    pub fn extra_fields(&self) -> ExtraFields {
        ExtraFields {
            name: Some(self.name.clone()),
            is_user: self.is_user,
            is_admin: self.is_admin,
            ..Default::default()
        }
    }
}

/// The general-purpose projection of an account.
///
/// Never carries the credential hash, the status flags or any timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRead {
    pub id: i32,
    pub email: String,
    pub name: String,
    pub is_user: bool,
    pub is_admin: bool,
}

impl From<&Account> for AccountRead {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id,
            email: account.email.clone(),
            name: account.name.clone(),
            is_user: account.is_user,
            is_admin: account.is_admin,
        }
    }
}

impl From<Account> for AccountRead {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            email: account.email,
            name: account.name,
            is_user: account.is_user,
            is_admin: account.is_admin,
        }
    }
}
