use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::{AccountFilter, AccountOrdering, AccountStore, Flag, LastLoginRange};
use crate::error::AppError;
use crate::models::{Account, AccountChanges, NewAccount};

const ACCOUNT_COLUMNS: &str = "id, email, name, password_hash, last_login, is_active, is_staff, \
                               is_admin, is_user, is_superuser, date_joined";

/// Account storage on the `accounts` table.
#[derive(Clone)]
pub struct PgAccountStore {
    pool: PgPool,
}

impl PgAccountStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects to `database_url` and applies pending migrations.
    pub async fn connect(database_url: &str) -> Result<Self, AppError> {
        let pool = PgPool::connect(database_url).await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self::new(pool))
    }
}

/// `UPDATE accounts SET ... WHERE id = $n` for a non-empty change set.
fn build_update<'a>(id: i32, changes: &AccountChanges) -> QueryBuilder<'a, Postgres> {
    let mut qb = QueryBuilder::<Postgres>::new("UPDATE accounts SET ");
    {
        let mut set = qb.separated(", ");
        if let Some(email) = &changes.email {
            set.push("email = ").push_bind_unseparated(email.clone());
        }
        if let Some(name) = &changes.name {
            set.push("name = ").push_bind_unseparated(name.clone());
        }
        let flags = [
            ("is_active", changes.is_active),
            ("is_staff", changes.is_staff),
            ("is_admin", changes.is_admin),
            ("is_user", changes.is_user),
            ("is_superuser", changes.is_superuser),
        ];
        for (column, value) in flags {
            if let Some(value) = value {
                set.push(format!("{} = ", column)).push_bind_unseparated(value);
            }
        }
    }
    qb.push(" WHERE id = ").push_bind(id);
    qb
}

/// Escapes `ILIKE` wildcards so search terms match literally.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Appends `AND ...` clauses for `filter`. The builder must already hold a `WHERE`.
fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &AccountFilter) {
    for term in &filter.search_terms {
        let pattern = format!("%{}%", escape_like(term));
        qb.push(" AND (email ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR name ILIKE ")
            .push_bind(pattern)
            .push(")");
    }

    let flags = [
        ("is_active", filter.is_active),
        ("is_staff", filter.is_staff),
        ("is_admin", filter.is_admin),
        ("is_user", filter.is_user),
    ];
    for (column, value) in flags {
        if let Some(value) = value {
            qb.push(format!(" AND {} = ", column)).push_bind(value);
        }
    }

    for range in &filter.last_login {
        match *range {
            LastLoginRange::Between { start, end } => {
                qb.push(" AND last_login >= ")
                    .push_bind(start)
                    .push(" AND last_login < ")
                    .push_bind(end);
            }
            LastLoginRange::Missing => {
                qb.push(" AND last_login IS NULL");
            }
            LastLoginRange::Present => {
                qb.push(" AND last_login IS NOT NULL");
            }
        }
    }

    if let Some(ids) = &filter.ids {
        qb.push(" AND id = ANY(").push_bind(ids.clone()).push(")");
    }
}

#[async_trait]
impl AccountStore for PgAccountStore {
    async fn insert(&self, account: NewAccount) -> Result<Account, AppError> {
        let sql = format!(
            "INSERT INTO accounts (email, name, password_hash, is_active, is_staff, is_admin, \
             is_user, is_superuser, date_joined)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING {}",
            ACCOUNT_COLUMNS
        );

        // A concurrent insert of the same email surfaces as a unique violation,
        // which `AppError::from` turns into a validation error.
        let stored = sqlx::query_as::<_, Account>(&sql)
            .bind(account.email)
            .bind(account.name)
            .bind(account.password_hash)
            .bind(account.is_active)
            .bind(account.is_staff)
            .bind(account.is_admin)
            .bind(account.is_user)
            .bind(account.is_superuser)
            .bind(account.date_joined)
            .fetch_one(&self.pool)
            .await?;
        Ok(stored)
    }

    async fn email_exists(&self, email: &str) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM accounts WHERE email = $1)",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Account>, AppError> {
        let sql = format!("SELECT {} FROM accounts WHERE id = $1", ACCOUNT_COLUMNS);
        let account = sqlx::query_as::<_, Account>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(account)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AppError> {
        let sql = format!("SELECT {} FROM accounts WHERE email = $1", ACCOUNT_COLUMNS);
        let account = sqlx::query_as::<_, Account>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(account)
    }

    async fn list(
        &self,
        filter: &AccountFilter,
        ordering: AccountOrdering,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Account>, i64), AppError> {
        let mut count_qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM accounts WHERE TRUE");
        push_filters(&mut count_qb, filter);
        let total: i64 = count_qb.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {} FROM accounts WHERE TRUE",
            ACCOUNT_COLUMNS
        ));
        push_filters(&mut qb, filter);
        qb.push(" ORDER BY ")
            .push(ordering.sql())
            .push(" LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        let accounts = qb.build_query_as::<Account>().fetch_all(&self.pool).await?;
        Ok((accounts, total))
    }

    async fn update(&self, id: i32, changes: &AccountChanges) -> Result<Account, AppError> {
        if changes.is_empty() {
            return self
                .find_by_id(id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Account {} not found", id)));
        }

        let mut qb = build_update(id, changes);
        qb.push(" RETURNING ").push(ACCOUNT_COLUMNS);

        qb.build_query_as::<Account>()
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Account {} not found", id)))
    }

    async fn update_many(&self, edits: &[(i32, AccountChanges)]) -> Result<u64, AppError> {
        let mut tx = self.pool.begin().await?;
        let mut touched = BTreeSet::new();

        for (id, changes) in edits {
            let found = if changes.is_empty() {
                sqlx::query_scalar::<_, i32>("SELECT id FROM accounts WHERE id = $1")
                    .bind(*id)
                    .fetch_optional(&mut *tx)
                    .await?
                    .is_some()
            } else {
                let mut qb = build_update(*id, changes);
                qb.build().execute(&mut *tx).await?.rows_affected() > 0
            };
            // Dropping `tx` without a commit rolls back the earlier rows.
            if !found {
                return Err(AppError::NotFound(format!("Account {} not found", id)));
            }
            touched.insert(*id);
        }

        tx.commit().await?;
        Ok(touched.len() as u64)
    }

    async fn set_flag(&self, ids: &[i32], flag: Flag, value: bool) -> Result<u64, AppError> {
        let sql = format!("UPDATE accounts SET {} = $1 WHERE id = ANY($2)", flag.column());
        let result = sqlx::query(&sql)
            .bind(value)
            .bind(ids.to_vec())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn delete_many(&self, ids: &[i32]) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM accounts WHERE id = ANY($1)")
            .bind(ids.to_vec())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn record_login(&self, id: i32, at: DateTime<Utc>) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE accounts SET last_login = $1 WHERE id = $2")
            .bind(at)
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Account {} not found", id)));
        }
        Ok(())
    }
}
