//! Cascade removal of test users across the stores

use serde::Serialize;
use tracing::{debug, info};

use crate::config::Settings;
use crate::services::{AuthService, FriendshipService, SpendService, UserService};
use crate::Result;

/// What a cascade delete removed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CascadeReport {
    pub spends: u64,
    pub categories: u64,
    pub friendships: u64,
    pub user_deleted: bool,
    pub auth_user_deleted: bool,
}

impl CascadeReport {
    pub fn is_empty(&self) -> bool {
        *self == CascadeReport::default()
    }
}

/// Removes everything a test user left behind.
///
/// The schema's cascade rules are not relied upon: dependents go first, the
/// owning rows last, each step committed on its own.
#[derive(Debug, Clone)]
pub struct Cleanup {
    users: UserService,
    spends: SpendService,
    friendships: FriendshipService,
    auth: Option<AuthService>,
}

impl Cleanup {
    /// Requires the userdata and spend stores; the auth store is optional
    pub fn new(settings: &Settings) -> Result<Self> {
        let auth = match settings.auth_db_url {
            Some(_) => Some(AuthService::new(settings)?),
            None => {
                debug!("Auth store not configured; credentials rows will be left in place");
                None
            }
        };

        Ok(Self {
            users: UserService::new(settings)?,
            spends: SpendService::new(settings)?,
            friendships: FriendshipService::new(settings)?,
            auth,
        })
    }

    pub fn users(&self) -> &UserService {
        &self.users
    }

    pub fn spends(&self) -> &SpendService {
        &self.spends
    }

    pub fn friendships(&self) -> &FriendshipService {
        &self.friendships
    }

    pub fn auth(&self) -> Option<&AuthService> {
        self.auth.as_ref()
    }

    /// Delete spends, categories and friendships (either side), then the user.
    ///
    /// Absent rows are skipped, so calling this twice is harmless.
    pub async fn delete_user_cascade(&self, username: &str) -> Result<CascadeReport> {
        let spends = self.spends.delete_user_spends(username).await?;
        let categories = self.spends.delete_user_categories(username).await?;
        let friendships = self.friendships.delete_user_friendships(username).await?;
        let user_deleted = self.users.delete_user(username).await?;
        let auth_user_deleted = match &self.auth {
            Some(auth) => auth.delete_user(username).await?,
            None => false,
        };

        let report = CascadeReport {
            spends,
            categories,
            friendships,
            user_deleted,
            auth_user_deleted,
        };

        if report.is_empty() {
            debug!("Nothing to clean up for {}", username);
        } else {
            info!("Cleaned up {}: {:?}", username, report);
        }
        Ok(report)
    }

    /// Drop the user's spends and categories but keep the account
    pub async fn reset_user_spends(&self, username: &str) -> Result<()> {
        self.spends.delete_user_spends(username).await?;
        self.spends.delete_user_categories(username).await?;
        Ok(())
    }
}
