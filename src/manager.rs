//! Account creation rules.
//!
//! Every account enters storage through `AccountManager`. It normalizes the email,
//! fills in flag defaults and hashes the credential before anything is persisted.

use std::sync::Arc;

use chrono::Utc;

use crate::auth::CredentialHasher;
use crate::error::AppError;
use crate::models::{normalize_email, Account, ExtraFields, NewAccount};
use crate::store::AccountStore;

#[derive(Clone)]
pub struct AccountManager {
    store: Arc<dyn AccountStore>,
    hasher: Arc<dyn CredentialHasher>,
}

impl AccountManager {
    pub fn new(store: Arc<dyn AccountStore>, hasher: Arc<dyn CredentialHasher>) -> Self {
        Self { store, hasher }
    }

    /// Creates a regular account.
    ///
    /// Flags the caller did not set take their defaults: `is_user` and `is_active`
    /// are on, everything else off. `password: None` stores an unusable credential.
    ///
    /// # Errors
    /// `AppError::ValidationError` when the email is blank or already taken.
    pub async fn create_account(
        &self,
        email: &str,
        password: Option<&str>,
        extra: ExtraFields,
    ) -> Result<Account, AppError> {
        if email.trim().is_empty() {
            return Err(AppError::ValidationError("The Email must be set".into()));
        }
        let email = normalize_email(email);

        if self.store.email_exists(&email).await? {
            return Err(AppError::ValidationError(
                "A user with this email already exists.".into(),
            ));
        }

        let password_hash = match password {
            Some(password) => self.hasher.hash(password)?,
            None => self.hasher.unusable(),
        };

        let account = self
            .store
            .insert(NewAccount {
                email,
                name: extra.name.unwrap_or_default(),
                password_hash,
                is_active: extra.is_active.unwrap_or(true),
                is_staff: extra.is_staff.unwrap_or(false),
                is_admin: extra.is_admin.unwrap_or(false),
                is_user: extra.is_user.unwrap_or(true),
                is_superuser: extra.is_superuser.unwrap_or(false),
                date_joined: Utc::now(),
            })
            .await?;

        log::info!("created account {} ({})", account.id, account.email);
        Ok(account)
    }

    /// Creates an account holding admin, staff and superuser capability at once.
    ///
    /// The three flags default to on. A caller that explicitly turns one of them off
    /// gets a validation error instead of a partially privileged account.
    pub async fn create_privileged_account(
        &self,
        email: &str,
        password: Option<&str>,
        mut extra: ExtraFields,
    ) -> Result<Account, AppError> {
        extra.is_admin.get_or_insert(true);
        extra.is_superuser.get_or_insert(true);
        extra.is_staff.get_or_insert(true);

        let required = [
            ("is_admin", extra.is_admin),
            ("is_superuser", extra.is_superuser),
            ("is_staff", extra.is_staff),
        ];
        for (flag, value) in required {
            if value != Some(true) {
                return Err(AppError::ValidationError(format!(
                    "Superuser must have {}=True.",
                    flag
                )));
            }
        }

        self.create_account(email, password, extra).await
    }

    /// Startup bootstrap for the first operator. Returns `None` when the email is
    /// already taken, whatever that account's flags are.
    pub async fn ensure_privileged_account(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<Account>, AppError> {
        if self.store.email_exists(&normalize_email(email)).await? {
            log::info!("privileged account {} already exists", email);
            return Ok(None);
        }

        let account = self
            .create_privileged_account(email, Some(password), ExtraFields::default())
            .await?;
        log::info!("seeded privileged account {}", account.email);
        Ok(Some(account))
    }
}
