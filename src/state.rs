use std::path::PathBuf;
use std::sync::Arc;

use crate::admin::AccountAdmin;
use crate::auth::{BcryptHasher, CredentialHasher, TokenService};
use crate::config::{Config, SuperuserSeed};
use crate::error::AppError;
use crate::jobs::JobQueue;
use crate::manager::AccountManager;
use crate::models::Account;
use crate::store::AccountStore;

/// Everything handlers need, shared across workers through `web::Data`.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn AccountStore>,
    pub hasher: Arc<dyn CredentialHasher>,
    pub manager: AccountManager,
    pub admin: AccountAdmin,
    pub tokens: TokenService,
    pub jobs: JobQueue,
    pub docs_dir: PathBuf,
}

impl AppState {
    pub fn new(
        store: Arc<dyn AccountStore>,
        hasher: Arc<dyn CredentialHasher>,
        tokens: TokenService,
        jobs: JobQueue,
        docs_dir: PathBuf,
    ) -> Self {
        let manager = AccountManager::new(store.clone(), hasher.clone());
        let admin = AccountAdmin::new(store.clone(), manager.clone());
        Self {
            store,
            hasher,
            manager,
            admin,
            tokens,
            jobs,
            docs_dir,
        }
    }

    /// Builds the state a deployment runs with, given an already opened store.
    pub fn from_config(
        config: &Config,
        store: Arc<dyn AccountStore>,
        jobs: JobQueue,
    ) -> Result<Self, AppError> {
        Ok(Self::new(
            store,
            Arc::new(BcryptHasher::new(config.bcrypt_cost)),
            TokenService::new(&config.jwt_secret, config.token_ttl_hours)?,
            jobs,
            config.docs_dir.clone(),
        ))
    }

    /// Creates the configured privileged account unless one with that email exists.
    pub async fn seed_superuser(&self, seed: &SuperuserSeed) -> Result<Option<Account>, AppError> {
        self.manager
            .ensure_privileged_account(&seed.email, &seed.password)
            .await
    }
}
