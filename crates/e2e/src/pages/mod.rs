//! Page objects for the Niffler UI
//!
//! Every constructor checks that the page's expected elements are visible
//! before returning it, so holding a page value means the screen is ready.
//! Transition methods block until the next screen's URL or element shows up
//! and hand back the next page object.

mod friends;
mod login;
mod main;
mod people;
mod profile;
mod registration;
mod spending;

pub use friends::FriendsPage;
pub use login::LoginPage;
pub use main::{spend_from_cells, MainPage};
pub use people::AllPeoplePage;
pub use profile::ProfilePage;
pub use registration::RegistrationPage;
pub use spending::{spend_id_from_url, EditSpendingPage, NewSpendingPage};

use async_trait::async_trait;
use tracing::{debug, info};

use crate::browser::{poll_until, Locator, Tab};
use crate::error::{E2eError, E2eResult};
use crate::expect::expect_visible;

/// URL fragments identifying each screen
pub mod urls {
    pub const MAIN: &str = "main";
    pub const LOGIN: &str = "login";
    pub const LOGIN_ERROR: &str = "error";
    pub const REGISTER: &str = "register";
    pub const SPENDING: &str = "spending";
    pub const PROFILE: &str = "profile";
    pub const FRIENDS: &str = "people/friends";
    pub const ALL_PEOPLE: &str = "people/all";
}

const SEARCH_FIELD: &str = r#"input[aria-label="search"]"#;
const USER_NAME_CELL: &str = ".MuiTypography-body1";
const CONFIRM_DIALOG: &str = r#"div[role="dialog"]"#;

#[async_trait]
pub trait Page: Send + Sync {
    fn tab(&self) -> &Tab;

    fn name(&self) -> &'static str;

    /// Static elements that must be visible, with display names
    fn expected_elements(&self) -> Vec<(Locator, &'static str)>;

    /// Wait for every expected element to become visible
    async fn check_elements(&self) -> E2eResult<()> {
        for (locator, name) in self.expected_elements() {
            expect_visible(&locator, name).await?;
        }
        debug!("{} is ready", self.name());
        Ok(())
    }
}

/// Expect each current entry of a list to be visible
pub(crate) async fn check_rows(rows: &Locator, name: &str) -> E2eResult<()> {
    for row in rows.all().await? {
        expect_visible(&row, name).await?;
    }
    Ok(())
}

/// Row of `rows` whose user name cell reads exactly `username`.
///
/// An empty list fails with "<list> is empty", a list without the user with
/// "No such user ...".
pub async fn find_user_row(rows: &Locator, list: &str, username: &str) -> E2eResult<Locator> {
    let candidates = rows.all().await?;
    if candidates.is_empty() {
        return Err(E2eError::AssertionFailed(format!("{} is empty", list)));
    }

    for row in candidates {
        let cell = row.locator(USER_NAME_CELL).first();
        if cell.exists().await? && cell.text_content().await?.trim() == username {
            return Ok(row);
        }
    }

    Err(E2eError::AssertionFailed(format!(
        "No such user with username {} in {}",
        username, list
    )))
}

/// Like `find_user_row`, but waits for the row to appear; on timeout the
/// error is the one a final lookup reports
pub async fn wait_for_user_row(rows: &Locator, list: &str, username: &str) -> E2eResult<Locator> {
    let what = format!("{} in {}", username, list);
    let waited = poll_until(&what, rows.timeout(), move || async move {
        Ok::<_, E2eError>(find_user_row(rows, list, username).await.is_ok())
    })
    .await;
    if let Err(e) = waited {
        debug!("{}", e);
    }
    find_user_row(rows, list, username).await
}

/// Click the dialog button labelled `label` once it shows up
pub(crate) async fn confirm_dialog(tab: &Tab, label: &str) -> E2eResult<()> {
    let button = tab.locator(CONFIRM_DIALOG).locator("button").has_text(label);
    expect_visible(&button, &format!("{} confirmation button", label)).await?;
    button.click().await
}

// Indices of the profile menu entries (CSS nth-child, 1-based)
const PROFILE_ITEM: usize = 1;
const FRIENDS_ITEM: usize = 3;
const ALL_PEOPLE_ITEM: usize = 4;
const SIGN_OUT_ITEM: usize = 6;

/// Header shared by every logged-in screen: avatar menu and navigation
#[derive(Clone)]
pub struct Header {
    tab: Tab,
}

impl Header {
    pub fn new(tab: Tab) -> Self {
        Self { tab }
    }

    pub fn menu_button(&self) -> Locator {
        self.tab.locator(r#"button[aria-label="Menu"]"#)
    }

    pub fn menu(&self) -> Locator {
        self.tab.locator(r#"ul[role="menu"]"#)
    }

    async fn open_menu(&self) -> E2eResult<()> {
        if !self.menu().is_visible().await? {
            self.menu_button().click().await?;
            expect_visible(&self.menu(), "Profile menu").await?;
        }
        Ok(())
    }

    /// Menu entry by position; opens the menu first
    pub async fn menu_item(&self, index: usize) -> E2eResult<Locator> {
        self.open_menu().await?;
        Ok(self.menu().locator(&format!("li:nth-child({})", index)))
    }

    pub async fn go_to_profile_page(&self) -> E2eResult<ProfilePage> {
        self.menu_item(PROFILE_ITEM).await?.click().await?;
        self.tab.wait_for_url(urls::PROFILE).await?;
        ProfilePage::new(self.tab.clone()).await
    }

    pub async fn go_to_friends_page(&self) -> E2eResult<FriendsPage> {
        self.menu_item(FRIENDS_ITEM).await?.click().await?;
        self.tab.wait_for_url(urls::FRIENDS).await?;
        FriendsPage::new(self.tab.clone()).await
    }

    pub async fn go_to_all_people_page(&self) -> E2eResult<AllPeoplePage> {
        self.menu_item(ALL_PEOPLE_ITEM).await?.click().await?;
        self.tab.wait_for_url(urls::ALL_PEOPLE).await?;
        AllPeoplePage::new(self.tab.clone()).await
    }

    /// Menu, Sign out, Log out; lands on the login form
    pub async fn log_out(&self) -> E2eResult<LoginPage> {
        self.menu_item(SIGN_OUT_ITEM).await?.click().await?;
        let log_out = self.tab.locator("button").has_text("Log out");
        expect_visible(&log_out, "Log out button").await?;
        log_out.click().await?;
        self.tab.wait_for_url(urls::LOGIN).await?;
        info!("Logged out");
        LoginPage::new(self.tab.clone()).await
    }
}
