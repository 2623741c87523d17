//! Verification services
//!
//! Stateless query helpers used to assert side effects of UI actions and to
//! clean up test data. Lookups that require presence fail with
//! `Error::NotFound`; deletes of absent entities are no-ops.

mod auth;
mod cleanup;
mod friendship;
mod spend;
mod user;

pub use auth::AuthService;
pub use cleanup::{CascadeReport, Cleanup};
pub use friendship::FriendshipService;
pub use spend::SpendService;
pub use user::UserService;
