#![doc = "The `extractable` library crate."]
#![doc = ""]
#![doc = "Accounts, their creation rules, the operator console, session tokens and the"]
#![doc = "HTTP routes over them. `main.rs` wires these into a running server; the"]
#![doc = "integration tests build the same `App` against the in-memory store."]

pub mod admin;
pub mod auth;
pub mod config;
pub mod error;
pub mod jobs;
pub mod manager;
pub mod models;
pub mod routes;
pub mod state;
pub mod store;

pub use error::AppError;
pub use state::AppState;
