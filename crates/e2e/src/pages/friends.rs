use async_trait::async_trait;
use tracing::info;

use super::{check_rows, confirm_dialog, find_user_row, wait_for_user_row, Header, Page};
use crate::browser::{Locator, Tab};
use crate::error::E2eResult;
use crate::expect::expect_visible;

const REQUEST_LIST: &str = "request list";
const FRIEND_LIST: &str = "friend list";

/// Friends screen: incoming invitations and current friends
pub struct FriendsPage {
    tab: Tab,
    header: Header,
}

impl FriendsPage {
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

    pub fn requests(&self) -> Locator {
        self.tab.locator("#requests tr")
    }

    pub fn friends(&self) -> Locator {
        self.tab.locator("#friends tr")
    }

    /// Accept the invitation from `username` and wait for them in the friend list
    pub async fn accept_request(&self, username: &str) -> E2eResult<()> {
        let request = find_user_row(&self.requests(), REQUEST_LIST, username).await?;
        request.locator("button").has_text("Accept").click().await?;
        wait_for_user_row(&self.friends(), FRIEND_LIST, username).await?;
        info!("Accepted invitation from {}", username);
        Ok(())
    }

    pub async fn decline_request(&self, username: &str) -> E2eResult<()> {
        let request = find_user_row(&self.requests(), REQUEST_LIST, username).await?;
        request.locator("button").has_text("Decline").click().await?;
        confirm_dialog(&self.tab, "Decline").await?;
        info!("Declined invitation from {}", username);
        Ok(())
    }

    pub async fn unfriend(&self, username: &str) -> E2eResult<()> {
        let friend = find_user_row(&self.friends(), FRIEND_LIST, username).await?;
        friend.locator("button").has_text("Unfriend").click().await?;
        confirm_dialog(&self.tab, "Delete").await?;
        info!("Removed {} from friends", username);
        Ok(())
    }

    pub async fn search(&self, username: &str) -> E2eResult<()> {
        let search = self.search_field();
        search.fill(username).await?;
        search.press("Enter").await
    }
}

#[async_trait]
impl Page for FriendsPage {
    fn tab(&self) -> &Tab {
        &self.tab
    }

    fn name(&self) -> &'static str {
        "Friends page"
    }

    fn expected_elements(&self) -> Vec<(Locator, &'static str)> {
        vec![(self.search_field(), "Search field")]
    }

    async fn check_elements(&self) -> E2eResult<()> {
        expect_visible(&self.search_field(), "Search field").await?;
        check_rows(&self.requests(), "Request").await?;
        check_rows(&self.friends(), "Friend").await
    }
}
