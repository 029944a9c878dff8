pub mod account;
pub mod transfer;

pub use account::{normalize_email, Account, AccountChanges, ExtraFields, NewAccount};
pub use transfer::{AccountCreate, AccountRead};
