use niffler_common::User;
use tracing::info;

use super::{urls, LoginPage, Page};
use crate::browser::{Locator, Tab};
use crate::error::E2eResult;
use crate::expect::expect_visible;

/// Sign-up form on the auth server
pub struct RegistrationPage {
    tab: Tab,
}

impl RegistrationPage {
    pub(crate) async fn new(tab: Tab) -> E2eResult<Self> {
        let page = Self { tab };
        page.check_elements().await?;
        Ok(page)
    }

    pub fn username_field(&self) -> Locator {
        self.tab.locator("#username")
    }

    pub fn password_field(&self) -> Locator {
        self.tab.locator("#password")
    }

    pub fn confirm_password_field(&self) -> Locator {
        self.tab.locator("#passwordSubmit")
    }

    pub fn signup_button(&self) -> Locator {
        self.tab.locator(r#"button[type="submit"]"#)
    }

    /// Link shown only after a successful sign-up
    pub fn sign_in_link(&self) -> Locator {
        self.tab.locator("a.form_sign-in")
    }

    pub async fn arrange_register_user(&self, user: &User) -> E2eResult<()> {
        self.username_field().fill(&user.username).await?;
        self.password_field().fill(&user.password).await?;
        self.confirm_password_field().fill(&user.password).await?;
        self.signup_button().click().await
    }

    pub async fn register_user(self, user: &User) -> E2eResult<LoginPage> {
        self.arrange_register_user(user).await?;

        let sign_in = self.sign_in_link();
        expect_visible(&sign_in, "Sign in link").await?;
        info!("Registered {}", user.username);

        sign_in.click().await?;
        self.tab.wait_for_url(urls::LOGIN).await?;
        LoginPage::new(self.tab).await
    }

    /// Validation messages currently shown on the form
    pub async fn error_messages(&self) -> E2eResult<Vec<String>> {
        let texts = self.tab.locator(".form__error").all_text_contents().await?;
        Ok(texts
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect())
    }
}

impl Page for RegistrationPage {
    fn tab(&self) -> &Tab {
        &self.tab
    }

    fn name(&self) -> &'static str {
        "Registration page"
    }

    fn expected_elements(&self) -> Vec<(Locator, &'static str)> {
        vec![
            (self.username_field(), "Username field"),
            (self.password_field(), "Password field"),
            (self.confirm_password_field(), "Confirm password field"),
            (self.signup_button(), "Signup button"),
        ]
    }
}
