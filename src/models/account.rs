use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Credentials starting with this prefix can never be verified.
pub const UNUSABLE_PASSWORD_PREFIX: &str = "!";

/// A stored user identity, keyed by its normalized email.
///
/// The permission model is a flat set of Boolean flags. `is_user`, `is_admin`,
/// `is_staff` and `is_superuser` are independent of each other; there is no role
/// hierarchy between them.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Account {
    pub id: i32,
    pub email: String,
    pub name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub last_login: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_admin: bool,
    pub is_user: bool,
    pub is_superuser: bool,
    pub date_joined: DateTime<Utc>,
}

impl Account {
    /// Whether this account may use the admin console at all.
    pub fn is_operator(&self) -> bool {
        self.is_active && self.is_staff
    }

    pub fn has_usable_password(&self) -> bool {
        !self.password_hash.starts_with(UNUSABLE_PASSWORD_PREFIX)
    }

    /// Join date the way the admin list view shows it.
    pub fn date_joined_display(&self) -> String {
        self.date_joined.format("%Y-%m-%d %H:%M").to_string()
    }
}

impl std::fmt::Display for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.email)
    }
}

/// A fully resolved record ready to be persisted. Produced by `AccountManager`.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_admin: bool,
    pub is_user: bool,
    pub is_superuser: bool,
    pub date_joined: DateTime<Utc>,
}

/// Optional attributes supplied alongside email and password at creation.
///
/// Unset fields receive defaults inside the manager; fields the caller sets are
/// never overwritten.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtraFields {
    pub name: Option<String>,
    pub is_active: Option<bool>,
    pub is_staff: Option<bool>,
    pub is_admin: Option<bool>,
    pub is_user: Option<bool>,
    pub is_superuser: Option<bool>,
}

/// A partial update. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountChanges {
    pub email: Option<String>,
    pub name: Option<String>,
    pub is_active: Option<bool>,
    pub is_staff: Option<bool>,
    pub is_admin: Option<bool>,
    pub is_user: Option<bool>,
    pub is_superuser: Option<bool>,
}

impl AccountChanges {
    pub fn is_empty(&self) -> bool {
        *self == AccountChanges::default()
    }

    pub(crate) fn apply_to(&self, account: &mut Account) {
        if let Some(email) = &self.email {
            account.email = email.clone();
        }
        if let Some(name) = &self.name {
            account.name = name.clone();
        }
        if let Some(v) = self.is_active {
            account.is_active = v;
        }
        if let Some(v) = self.is_staff {
            account.is_staff = v;
        }
        if let Some(v) = self.is_admin {
            account.is_admin = v;
        }
        if let Some(v) = self.is_user {
            account.is_user = v;
        }
        if let Some(v) = self.is_superuser {
            account.is_superuser = v;
        }
    }
}

/// Normalizes an email address for storage and lookup.
///
/// Surrounding whitespace is removed and the domain part is lower-cased. The local
/// part is left alone, since mailbox names may be case-sensitive. Input without an
/// `@` is only trimmed.
pub fn normalize_email(email: &str) -> String {
    let email = email.trim();
    match email.rsplit_once('@') {
        Some((local, domain)) => format!("{}@{}", local, domain.to_lowercase()),
        None => email.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_account() -> Account {
        Account {
            id: 7,
            email: "ada@example.com".to_string(),
            name: "Ada".to_string(),
            password_hash: "$2b$04$abcdefghijklmnopqrstuv".to_string(),
            last_login: None,
            is_active: true,
            is_staff: false,
            is_admin: false,
            is_user: true,
            is_superuser: false,
            date_joined: Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 59).unwrap(),
        }
    }

    #[test]
    fn test_normalize_email_lowercases_domain_only() {
        assert_eq!(normalize_email("John.Doe@EXAMPLE.Com"), "John.Doe@example.com");
        assert_eq!(normalize_email("  ada@Example.org \n"), "ada@example.org");
        assert_eq!(normalize_email("weird@local@HOST.io"), "weird@local@host.io");
        assert_eq!(normalize_email("no-at-sign"), "no-at-sign");
        assert_eq!(normalize_email("   "), "");
    }

    #[test]
    fn test_date_joined_display() {
        assert_eq!(sample_account().date_joined_display(), "2024-03-09 14:05");
    }

    #[test]
    fn test_serialization_hides_password_hash() {
        let json = serde_json::to_value(sample_account()).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["email"], "ada@example.com");
    }

    #[test]
    fn test_operator_requires_active_staff() {
        let mut account = sample_account();
        assert!(!account.is_operator());
        account.is_staff = true;
        assert!(account.is_operator());
        account.is_active = false;
        assert!(!account.is_operator());
    }

    #[test]
    fn test_unusable_password() {
        let mut account = sample_account();
        assert!(account.has_usable_password());
        account.password_hash = format!("{}abc", UNUSABLE_PASSWORD_PREFIX);
        assert!(!account.has_usable_password());
    }

    #[test]
    fn test_changes_apply_only_set_fields() {
        let mut account = sample_account();
        let changes = AccountChanges {
            name: Some("Ada Lovelace".to_string()),
            is_staff: Some(true),
            ..Default::default()
        };
        assert!(!changes.is_empty());
        changes.apply_to(&mut account);
        assert_eq!(account.name, "Ada Lovelace");
        assert!(account.is_staff);
        assert_eq!(account.email, "ada@example.com");
        assert!(AccountChanges::default().is_empty());
    }
}
