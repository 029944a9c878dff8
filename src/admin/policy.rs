//! Per-request permission rules for the operator console.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::models::Account;

/// Account attributes as the change form names them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountField {
    Email,
    Name,
    IsActive,
    IsStaff,
    IsAdmin,
    IsUser,
    IsSuperuser,
    Groups,
    UserPermissions,
    LastLogin,
}

impl AccountField {
    pub const ALL: [AccountField; 10] = [
        AccountField::Email,
        AccountField::Name,
        AccountField::IsActive,
        AccountField::IsStaff,
        AccountField::IsAdmin,
        AccountField::IsUser,
        AccountField::IsSuperuser,
        AccountField::Groups,
        AccountField::UserPermissions,
        AccountField::LastLogin,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AccountField::Email => "email",
            AccountField::Name => "name",
            AccountField::IsActive => "is_active",
            AccountField::IsStaff => "is_staff",
            AccountField::IsAdmin => "is_admin",
            AccountField::IsUser => "is_user",
            AccountField::IsSuperuser => "is_superuser",
            AccountField::Groups => "groups",
            AccountField::UserPermissions => "user_permissions",
            AccountField::LastLogin => "last_login",
        }
    }
}

/// Fields `caller` may not change on `target`. `target` is `None` on the creation form.
pub fn readonly_fields(caller: &Account, target: Option<&Account>) -> BTreeSet<AccountField> {
    let mut readonly = BTreeSet::from([AccountField::LastLogin]);

    if !caller.is_superuser {
        readonly.extend([
            AccountField::IsSuperuser,
            AccountField::UserPermissions,
            AccountField::Groups,
        ]);
    }

    // The login identifier is fixed once the account exists.
    if target.is_some() {
        readonly.insert(AccountField::Email);
    }

    readonly
}

pub fn editable_fields(caller: &Account, target: Option<&Account>) -> BTreeSet<AccountField> {
    let readonly = readonly_fields(caller, target);
    AccountField::ALL
        .into_iter()
        .filter(|field| !readonly.contains(field))
        .collect()
}

/// Deleting accounts is reserved for superusers, whatever else the caller may do.
pub fn has_delete_permission(caller: &Account) -> bool {
    caller.is_superuser
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    fn account(is_staff: bool, is_superuser: bool) -> Account {
        Account {
            id: 1,
            email: "op@example.com".to_string(),
            name: "Operator".to_string(),
            password_hash: "x".to_string(),
            last_login: None,
            is_active: true,
            is_staff,
            is_admin: is_superuser,
            is_user: true,
            is_superuser,
            date_joined: Utc::now(),
        }
    }

    #[test]
    fn test_staff_editing_existing_account() {
        let caller = account(true, false);
        let target = account(false, false);

        assert_eq!(
            readonly_fields(&caller, Some(&target)),
            BTreeSet::from([
                AccountField::Email,
                AccountField::IsSuperuser,
                AccountField::Groups,
                AccountField::UserPermissions,
                AccountField::LastLogin,
            ])
        );
        assert_eq!(
            editable_fields(&caller, Some(&target)),
            BTreeSet::from([
                AccountField::Name,
                AccountField::IsActive,
                AccountField::IsStaff,
                AccountField::IsAdmin,
                AccountField::IsUser,
            ])
        );
    }

    #[test]
    fn test_superuser_editing_existing_account() {
        let caller = account(true, true);
        let target = account(false, false);

        assert_eq!(
            readonly_fields(&caller, Some(&target)),
            BTreeSet::from([AccountField::Email, AccountField::LastLogin])
        );
        assert!(editable_fields(&caller, Some(&target)).contains(&AccountField::IsSuperuser));
    }

    #[test]
    fn test_email_is_editable_on_creation() {
        let caller = account(true, false);
        let editable = editable_fields(&caller, None);
        assert!(editable.contains(&AccountField::Email));
        assert!(!editable.contains(&AccountField::LastLogin));
    }

    #[test]
    fn test_target_flags_do_not_affect_policy() {
        let caller = account(true, false);
        let privileged_target = account(true, true);
        assert_eq!(
            editable_fields(&caller, Some(&privileged_target)),
            editable_fields(&caller, Some(&account(false, false)))
        );
    }

    #[test_log::test]
    fn test_delete_permission() {
        assert!(!has_delete_permission(&account(false, false)));
        assert!(!has_delete_permission(&account(true, false)));
        assert!(has_delete_permission(&account(true, true)));

        let mut admin_not_superuser = account(true, false);
        admin_not_superuser.is_admin = true;
        assert!(!has_delete_permission(&admin_not_superuser));
    }

    #[test]
    fn test_field_names() {
        let json = serde_json::to_value(AccountField::UserPermissions).unwrap();
        assert_eq!(json, "user_permissions");
        assert_eq!(AccountField::IsSuperuser.as_str(), "is_superuser");
    }
}
