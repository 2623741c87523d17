//! Test preconditions
//!
//! `Session` lives for a whole run: one browser, one session user.
//! `Fixtures` lives for one scenario: its own tab, data factory and the list
//! of users it registered, all removed again in `teardown`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use niffler_common::{Cleanup, DataFactory, Settings, Spend, User};
use parking_lot::Mutex;
use tokio::sync::OnceCell;
use tracing::{info, warn};

use crate::browser::{BrowserOptions, BrowserSession, Tab};
use crate::error::{E2eError, E2eResult};
use crate::pages::{LoginPage, MainPage, NewSpendingPage, RegistrationPage};

/// Run-scoped browser and session user
pub struct Session {
    settings: Settings,
    browser: BrowserSession,
    seed: Option<u64>,
    user: OnceCell<User>,
    /// Every generated session username, including failed sign-ups
    attempted_users: Mutex<Vec<String>>,
    fixtures_started: AtomicU64,
}

impl Session {
    pub async fn start(settings: Settings) -> E2eResult<Arc<Self>> {
        let seed = session_seed(&settings);
        let browser = BrowserSession::launch(BrowserOptions::from_settings(&settings)).await?;
        Ok(Arc::new(Self {
            settings,
            browser,
            seed,
            user: OnceCell::new(),
            attempted_users: Mutex::new(Vec::new()),
            fixtures_started: AtomicU64::new(0),
        }))
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Base seed the fixture factories derive from, if the run is seeded
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    fn fixture_seed(&self, scenario: &str) -> Option<u64> {
        let n = self.fixtures_started.fetch_add(1, Ordering::Relaxed);
        self.seed.map(|base| fixture_seed(base, scenario, n))
    }

    /// The account spend scenarios log in with; registered on first use
    /// unless a fixed account is configured
    async fn user(&self, tab: &Tab, factory: &mut DataFactory) -> E2eResult<User> {
        let user = self
            .user
            .get_or_try_init(move || async move {
                if let Some(user) = &self.settings.registered_user {
                    warn!(
                        "Using fixed account {}; concurrent runs will interfere",
                        user.username
                    );
                    return Ok::<_, E2eError>(user.clone());
                }
                let user = factory.make_default_user();
                // Tracked first so a half-finished sign-up is still cleaned up
                self.attempted_users.lock().push(user.username.clone());
                register(tab, &self.settings, &user).await?;
                info!("Session user: {}", user.username);
                Ok(user)
            })
            .await?;
        Ok(user.clone())
    }

    /// Session usernames generated so far, registered or not
    pub fn attempted_users(&self) -> Vec<String> {
        self.attempted_users.lock().clone()
    }

    /// Remove generated session users, then shut the browser down.
    /// The browser is closed even when cleanup fails.
    pub async fn finish(self: Arc<Self>) -> E2eResult<()> {
        let attempted = std::mem::take(&mut *self.attempted_users.lock());
        let mut first_error: Option<E2eError> = None;
        if !attempted.is_empty() {
            match Cleanup::new(&self.settings) {
                Ok(cleanup) => {
                    for username in &attempted {
                        if let Err(e) = cleanup.delete_user_cascade(username).await {
                            warn!("Failed to clean up session user {}: {}", username, e);
                            first_error.get_or_insert(e.into());
                        }
                    }
                }
                Err(e) => {
                    first_error.get_or_insert(e.into());
                }
            }
        }

        let closed = match Arc::try_unwrap(self) {
            Ok(session) => session.browser.close().await,
            Err(_) => {
                warn!("Session still referenced; browser closes when dropped");
                Ok(())
            }
        };

        match first_error {
            Some(e) => Err(e),
            None => closed,
        }
    }
}

/// Base seed for a session.
///
/// Without an auth store, replaying a seed would re-register names whose
/// credentials were never deleted, so a per-session nonce is mixed in.
fn session_seed(settings: &Settings) -> Option<u64> {
    let base = settings.seed?;
    if settings.auth_db_url.is_some() {
        return Some(base);
    }
    let mixed = base ^ rand::random::<u64>();
    warn!(
        "Auth store not configured; seed {} mixed with a run nonce into {}",
        base, mixed
    );
    Some(mixed)
}

/// Seed of the `n`th fixture, which runs `scenario`.
///
/// The scenario name is hashed in (FNV-1a) so parallel sessions sharing a
/// base seed still generate distinct users.
pub fn fixture_seed(base: u64, scenario: &str, n: u64) -> u64 {
    let hash = scenario.bytes().fold(0xcbf2_9ce4_8422_2325_u64, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(0x0100_0000_01b3)
    });
    (base ^ hash).wrapping_add(n)
}

async fn register(tab: &Tab, settings: &Settings, user: &User) -> E2eResult<()> {
    LoginPage::open(tab.clone(), settings)
        .await?
        .go_to_registration_page()
        .await?
        .register_user(user)
        .await?;
    Ok(())
}

/// Per-scenario resources
pub struct Fixtures {
    session: Arc<Session>,
    tab: Tab,
    factory: DataFactory,
    cleanup: Cleanup,
    created_users: Vec<String>,
    reset_spends_of: Option<String>,
}

impl Fixtures {
    pub async fn new(session: Arc<Session>, scenario: &str) -> E2eResult<Self> {
        let cleanup = Cleanup::new(&session.settings)?;
        let factory = DataFactory::new(
            session.fixture_seed(scenario),
            session.settings.params.clone(),
        );
        let tab = session.browser.new_tab().await?;
        Ok(Self {
            session,
            tab,
            factory,
            cleanup,
            created_users: Vec::new(),
            reset_spends_of: None,
        })
    }

    pub fn tab(&self) -> &Tab {
        &self.tab
    }

    pub fn settings(&self) -> &Settings {
        &self.session.settings
    }

    pub fn factory(&mut self) -> &mut DataFactory {
        &mut self.factory
    }

    pub fn cleanup(&self) -> &Cleanup {
        &self.cleanup
    }

    /// Users registered through this fixture so far
    pub fn created_users(&self) -> &[String] {
        &self.created_users
    }

    pub fn make_spend(&mut self) -> Spend {
        self.factory.make_spend()
    }

    /// Register a fresh user through the UI; removed at teardown
    pub async fn registered_user(&mut self) -> E2eResult<User> {
        let user = self.factory.make_default_user();
        // Tracked first so a half-finished sign-up is still cleaned up
        self.created_users.push(user.username.clone());
        register(&self.tab, &self.session.settings, &user).await?;
        Ok(user)
    }

    pub async fn login_page(&self) -> E2eResult<LoginPage> {
        LoginPage::open(self.tab.clone(), &self.session.settings).await
    }

    pub async fn registration_page(&self) -> E2eResult<RegistrationPage> {
        self.login_page().await?.go_to_registration_page().await
    }

    pub async fn session_user(&mut self) -> E2eResult<User> {
        self.session.user(&self.tab, &mut self.factory).await
    }

    /// Main page, logged in as the session user
    pub async fn main_page(&mut self) -> E2eResult<MainPage> {
        let user = self.session_user().await?;
        self.login_page().await?.login(&user).await
    }

    pub async fn new_spending_page(&mut self) -> E2eResult<NewSpendingPage> {
        self.main_page().await?.go_to_new_spending_page().await
    }

    /// Clear the session user's spends now and again at teardown
    pub async fn reset_session_spends(&mut self) -> E2eResult<User> {
        let user = self.session_user().await?;
        self.cleanup.reset_user_spends(&user.username).await?;
        self.reset_spends_of = Some(user.username.clone());
        Ok(user)
    }

    /// Delete created users and close the tab; reports the first failure
    pub async fn teardown(self) -> E2eResult<()> {
        let mut first_error: Option<E2eError> = None;

        if let Some(username) = &self.reset_spends_of {
            if let Err(e) = self.cleanup.reset_user_spends(username).await {
                warn!("Failed to reset spends of {}: {}", username, e);
                first_error.get_or_insert(e.into());
            }
        }

        for username in &self.created_users {
            if let Err(e) = self.cleanup.delete_user_cascade(username).await {
                warn!("Failed to clean up {}: {}", username, e);
                first_error.get_or_insert(e.into());
            }
        }

        if let Err(e) = self.session.browser.close_tab(self.tab).await {
            warn!("Failed to close tab: {}", e);
            first_error.get_or_insert(e);
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use niffler_common::config::TestParameters;

    fn first_user(seed: u64) -> User {
        DataFactory::new(Some(seed), TestParameters::default()).make_default_user()
    }

    #[test]
    fn test_parallel_sessions_draw_distinct_users() {
        let registration = first_user(fixture_seed(42, "registration_persists_user", 0));
        let ghost = first_user(fixture_seed(42, "login_with_unregistered_user_fails", 0));
        assert_ne!(registration, ghost);
    }

    #[test]
    fn test_fixture_seeds_are_consecutive_within_a_scenario() {
        let first = fixture_seed(42, "edit_spend", 0);
        assert_eq!(fixture_seed(42, "edit_spend", 1), first.wrapping_add(1));
        assert_eq!(fixture_seed(42, "edit_spend", 0), first);
        assert_ne!(first_user(first), first_user(fixture_seed(42, "edit_spend", 1)));
    }

    #[test]
    fn test_session_seed_needs_auth_store_to_replay() {
        let mut settings = Settings {
            seed: Some(42),
            ..Settings::default()
        };
        assert_ne!(session_seed(&settings), Some(42));

        settings.auth_db_url = Some("postgres://localhost/niffler-auth".into());
        assert_eq!(session_seed(&settings), Some(42));

        settings.seed = None;
        assert_eq!(session_seed(&settings), None);
    }
}
