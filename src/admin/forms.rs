use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::policy::AccountField;
use crate::error::AppError;
use crate::models::{AccountChanges, ExtraFields};

/// Console form for adding an account.
#[derive(Debug, Deserialize, Validate)]
pub struct AccountCreationForm {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(min = 8, max = 128))]
    pub password1: String,
    pub password2: String,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub is_staff: Option<bool>,
    #[serde(default)]
    pub is_admin: Option<bool>,
    #[serde(default)]
    pub is_user: Option<bool>,
}

impl AccountCreationForm {
    /// Field-level checks that need no storage access.
    pub fn clean(&self) -> Result<(), AppError> {
        self.validate()?;
        if self.password1 != self.password2 {
            return Err(AppError::ValidationError(
                "The two password fields didn't match.".into(),
            ));
        }
        Ok(())
    }

    pub fn extra_fields(&self) -> ExtraFields {
        ExtraFields {
            name: Some(self.name.clone()),
            is_active: self.is_active,
            is_staff: self.is_staff,
            is_admin: self.is_admin,
            is_user: self.is_user,
            is_superuser: None,
        }
    }
}

/// Console form for editing an existing account. Absent keys are left unchanged.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct AccountChangeForm {
    pub email: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    pub is_active: Option<bool>,
    pub is_staff: Option<bool>,
    pub is_admin: Option<bool>,
    pub is_user: Option<bool>,
    pub is_superuser: Option<bool>,
    pub groups: Option<serde_json::Value>,
    pub user_permissions: Option<serde_json::Value>,
    pub last_login: Option<serde_json::Value>,
}

impl AccountChangeForm {
    /// Splits the submission into the changes `editable` allows and the submitted
    /// fields that were dropped.
    pub fn into_changes(
        self,
        editable: &BTreeSet<AccountField>,
    ) -> (AccountChanges, Vec<AccountField>) {
        let mut ignored = Vec::new();

        fn keep<T>(
            value: Option<T>,
            field: AccountField,
            editable: &BTreeSet<AccountField>,
            ignored: &mut Vec<AccountField>,
        ) -> Option<T> {
            match value {
                Some(_) if !editable.contains(&field) => {
                    ignored.push(field);
                    None
                }
                value => value,
            }
        }

        let changes = AccountChanges {
            email: keep(self.email, AccountField::Email, editable, &mut ignored),
            name: keep(self.name, AccountField::Name, editable, &mut ignored),
            is_active: keep(self.is_active, AccountField::IsActive, editable, &mut ignored),
            is_staff: keep(self.is_staff, AccountField::IsStaff, editable, &mut ignored),
            is_admin: keep(self.is_admin, AccountField::IsAdmin, editable, &mut ignored),
            is_user: keep(self.is_user, AccountField::IsUser, editable, &mut ignored),
            is_superuser: keep(
                self.is_superuser,
                AccountField::IsSuperuser,
                editable,
                &mut ignored,
            ),
        };

        // Nothing stores these, so a submission is reported even when the field
        // itself is editable.
        let unstored = [
            (self.groups, AccountField::Groups),
            (self.user_permissions, AccountField::UserPermissions),
            (self.last_login, AccountField::LastLogin),
        ];
        for (value, field) in unstored {
            if value.is_some() {
                ignored.push(field);
            }
        }
        (changes, ignored)
    }
}

/// A row edited directly in the list view. Only two columns are editable there.
#[derive(Debug, Clone, Deserialize)]
pub struct InlineEdit {
    pub id: i32,
    pub is_active: Option<bool>,
    pub is_user: Option<bool>,
}

impl InlineEdit {
    pub fn changes(&self) -> AccountChanges {
        AccountChanges {
            is_active: self.is_active,
            is_user: self.is_user,
            ..Default::default()
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InlineEditOutcome {
    pub message: String,
    pub updated: u64,
}
