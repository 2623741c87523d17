use niffler_common::{Settings, User};
use regex::Regex;
use tracing::info;

use super::{urls, MainPage, Page, RegistrationPage};
use crate::browser::{Locator, Tab};
use crate::error::{E2eError, E2eResult};

/// Login form on the auth server
pub struct LoginPage {
    tab: Tab,
}

impl LoginPage {
    /// Navigate to the auth URL and wait for the form
    pub async fn open(tab: Tab, settings: &Settings) -> E2eResult<Self> {
        tab.goto(settings.auth_url()?).await?;
        Self::new(tab).await
    }

    /// Attach to a tab already showing the login form
    pub(crate) async fn new(tab: Tab) -> E2eResult<Self> {
        let page = Self { tab };
        page.check_elements().await?;
        Ok(page)
    }

    pub fn username_field(&self) -> Locator {
        self.tab.locator(r#"input[name="username"]"#)
    }

    pub fn password_field(&self) -> Locator {
        self.tab.locator(r#"input[name="password"]"#)
    }

    pub fn login_button(&self) -> Locator {
        self.tab.locator(r#"button[type="submit"]"#)
    }

    pub fn create_account_button(&self) -> Locator {
        self.tab.locator(r#"a[href="/register"]"#)
    }

    /// Fill and submit the form without waiting for the outcome
    pub async fn arrange_login(&self, user: &User) -> E2eResult<()> {
        self.username_field().fill(&user.username).await?;
        self.password_field().fill(&user.password).await?;
        self.login_button().click().await
    }

    /// Log in and wait for the main screen; a rejection fails as soon as
    /// the error URL shows up
    pub async fn login(self, user: &User) -> E2eResult<MainPage> {
        self.arrange_login(user).await?;
        let url = self
            .tab
            .wait_for_url(&format!("{}|{}", urls::MAIN, urls::LOGIN_ERROR))
            .await?;
        if login_rejected(&url)? {
            return Err(E2eError::AssertionFailed(format!(
                "Login as {} was rejected ({})",
                user.username, url
            )));
        }
        info!("Logged in as {}", user.username);
        MainPage::new(self.tab).await
    }

    /// Submit credentials expected to be rejected; the form stays on screen
    pub async fn login_expect_error(&self, user: &User) -> E2eResult<()> {
        self.arrange_login(user).await?;
        self.tab.wait_for_url(urls::LOGIN_ERROR).await?;
        self.check_elements().await
    }

    pub async fn go_to_registration_page(self) -> E2eResult<RegistrationPage> {
        self.create_account_button().click().await?;
        self.tab.wait_for_url(urls::REGISTER).await?;
        RegistrationPage::new(self.tab).await
    }
}

/// Did the login form redirect to its error screen
fn login_rejected(url: &str) -> E2eResult<bool> {
    Ok(Regex::new(urls::LOGIN_ERROR)?.is_match(url))
}

impl Page for LoginPage {
    fn tab(&self) -> &Tab {
        &self.tab
    }

    fn name(&self) -> &'static str {
        "Login page"
    }

    fn expected_elements(&self) -> Vec<(Locator, &'static str)> {
        vec![
            (self.username_field(), "Username field"),
            (self.password_field(), "Password field"),
            (self.login_button(), "Login button"),
            (self.create_account_button(), "Create account button"),
        ]
    }
}
