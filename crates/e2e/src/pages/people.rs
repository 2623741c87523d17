use async_trait::async_trait;
use tracing::info;

use super::{check_rows, wait_for_user_row, Header, Page};
use crate::browser::{Locator, Tab};
use crate::error::E2eResult;
use crate::expect::expect_visible;

const PEOPLE_LIST: &str = "people list";

/// Directory of every registered user
pub struct AllPeoplePage {
    tab: Tab,
    header: Header,
}

impl AllPeoplePage {
    pub(crate) async fn new(tab: Tab) -> E2eResult<Self> {
        let page = Self {
            header: Header::new(tab.clone()),
            tab,
        };
        page.check_elements().await?;
        Ok(page)
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn search_field(&self) -> Locator {
        self.tab.locator(super::SEARCH_FIELD)
    }

    pub fn people(&self) -> Locator {
        self.tab.locator("#all tr")
    }

    /// Search for `username` and return its row once shown
    pub async fn search(&self, username: &str) -> E2eResult<Locator> {
        let search = self.search_field();
        search.fill(username).await?;
        search.press("Enter").await?;
        wait_for_user_row(&self.people(), PEOPLE_LIST, username).await
    }

    /// Invite `username` and wait for the row to show the pending badge
    pub async fn send_invitation(&self, username: &str) -> E2eResult<()> {
        let row = self.search(username).await?;
        row.locator("button").has_text("Add friend").click().await?;
        expect_visible(
            &row.locator("span").has_text("Waiting..."),
            "Waiting... badge",
        )
        .await?;
        info!("Sent invitation to {}", username);
        Ok(())
    }
}

#[async_trait]
impl Page for AllPeoplePage {
    fn tab(&self) -> &Tab {
        &self.tab
    }

    fn name(&self) -> &'static str {
        "All people page"
    }

    fn expected_elements(&self) -> Vec<(Locator, &'static str)> {
        vec![(self.search_field(), "Search field")]
    }

    async fn check_elements(&self) -> E2eResult<()> {
        expect_visible(&self.search_field(), "Search field").await?;
        check_rows(&self.people(), "User").await
    }
}
