use serde::{Deserialize, Serialize};

use crate::store::Flag;

/// Operations an operator can apply to a selection of accounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BulkAction {
    #[serde(alias = "activate_users")]
    Activate,
    #[serde(alias = "deactivate_users")]
    Deactivate,
    MakeStaff,
    RemoveStaff,
    DeleteSelected,
}

impl BulkAction {
    pub const ALL: [BulkAction; 5] = [
        BulkAction::Activate,
        BulkAction::Deactivate,
        BulkAction::MakeStaff,
        BulkAction::RemoveStaff,
        BulkAction::DeleteSelected,
    ];

    /// Label shown in the console's action menu.
    pub fn description(self) -> &'static str {
        match self {
            BulkAction::Activate => "Activate selected users",
            BulkAction::Deactivate => "Deactivate selected users",
            BulkAction::MakeStaff => "Grant staff permissions",
            BulkAction::RemoveStaff => "Remove staff permissions",
            BulkAction::DeleteSelected => "Delete selected users",
        }
    }

    /// The flag update this action performs, or `None` for deletion.
    pub fn flag_update(self) -> Option<(Flag, bool)> {
        match self {
            BulkAction::Activate => Some((Flag::Active, true)),
            BulkAction::Deactivate => Some((Flag::Active, false)),
            BulkAction::MakeStaff => Some((Flag::Staff, true)),
            BulkAction::RemoveStaff => Some((Flag::Staff, false)),
            BulkAction::DeleteSelected => None,
        }
    }

    pub fn message(self, updated: u64) -> String {
        match self {
            BulkAction::Activate => format!("{} user(s) were successfully activated.", updated),
            BulkAction::Deactivate => {
                format!("{} user(s) were successfully deactivated.", updated)
            }
            BulkAction::MakeStaff => format!("{} user(s) were given staff permissions.", updated),
            BulkAction::RemoveStaff => {
                format!("{} user(s) had staff permissions removed.", updated)
            }
            BulkAction::DeleteSelected => format!("Successfully deleted {} user(s).", updated),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct BulkActionRequest {
    pub action: BulkAction,
    pub ids: Vec<i32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ActionOutcome {
    pub message: String,
    pub updated: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_names_and_aliases() {
        let action: BulkAction = serde_json::from_str("\"activate\"").unwrap();
        assert_eq!(action, BulkAction::Activate);
        let action: BulkAction = serde_json::from_str("\"activate_users\"").unwrap();
        assert_eq!(action, BulkAction::Activate);
        let action: BulkAction = serde_json::from_str("\"deactivate_users\"").unwrap();
        assert_eq!(action, BulkAction::Deactivate);
        let action: BulkAction = serde_json::from_str("\"remove_staff\"").unwrap();
        assert_eq!(action, BulkAction::RemoveStaff);
        assert!(serde_json::from_str::<BulkAction>("\"promote\"").is_err());
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            BulkAction::Activate.message(3),
            "3 user(s) were successfully activated."
        );
        assert_eq!(
            BulkAction::Deactivate.message(1),
            "1 user(s) were successfully deactivated."
        );
        assert_eq!(
            BulkAction::MakeStaff.message(2),
            "2 user(s) were given staff permissions."
        );
        assert_eq!(
            BulkAction::RemoveStaff.message(0),
            "0 user(s) had staff permissions removed."
        );
        assert_eq!(
            BulkAction::DeleteSelected.message(4),
            "Successfully deleted 4 user(s)."
        );
    }

    #[test]
    fn test_only_delete_has_no_flag_update() {
        for action in BulkAction::ALL {
            assert_eq!(
                action.flag_update().is_none(),
                action == BulkAction::DeleteSelected
            );
        }
    }
}
