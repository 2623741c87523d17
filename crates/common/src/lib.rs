//! Niffler test tooling: common library
//!
//! Configuration, domain types, random data factories and the database
//! verification services the E2E suite uses to check what the UI did.

pub mod config;
pub mod db;
pub mod error;
pub mod factory;
pub mod services;
pub mod types;

// Re-export commonly used types
pub use config::{Settings, Store, TestParameters};
pub use db::Database;
pub use error::{Error, Result};
pub use factory::DataFactory;
pub use services::{AuthService, CascadeReport, Cleanup, FriendshipService, SpendService, UserService};
pub use types::*;
