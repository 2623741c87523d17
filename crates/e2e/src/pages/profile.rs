use async_trait::async_trait;
use tracing::info;

use super::{check_rows, Header, Page};
use crate::browser::{Locator, Tab};
use crate::error::E2eResult;
use crate::expect::expect_visible;

// Generated MUI class of category chips; no stable attribute exists
const CATEGORY_CHIPS: &str = ".css-17u3xlq";

/// Profile screen: display name and spend categories
pub struct ProfilePage {
    tab: Tab,
    header: Header,
}

impl ProfilePage {
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

    pub fn username_field(&self) -> Locator {
        self.tab.locator("#username")
    }

    pub fn name_field(&self) -> Locator {
        self.tab.locator("#name")
    }

    pub fn save_changes_button(&self) -> Locator {
        self.tab.locator(r#"button[type="submit"]"#)
    }

    pub fn new_category_field(&self) -> Locator {
        self.tab.locator("#category")
    }

    pub fn categories(&self) -> Locator {
        self.tab.locator(CATEGORY_CHIPS)
    }

    pub async fn category_names(&self) -> E2eResult<Vec<String>> {
        let names = self.categories().all_text_contents().await?;
        Ok(names.into_iter().map(|n| n.trim().to_string()).collect())
    }

    pub async fn change_name(&self, name: &str) -> E2eResult<()> {
        self.name_field().fill(name).await?;
        self.save_changes_button().click().await?;
        info!("Changed display name to {:?}", name);
        Ok(())
    }

    /// Type a category, confirm with Enter and wait for its chip
    pub async fn add_category(&self, category: &str) -> E2eResult<()> {
        self.new_category_field().fill(category).await?;
        self.tab.press_key("Enter").await?;
        expect_visible(
            &self.categories().text_is(category),
            &format!("Category {:?}", category),
        )
        .await
    }
}

#[async_trait]
impl Page for ProfilePage {
    fn tab(&self) -> &Tab {
        &self.tab
    }

    fn name(&self) -> &'static str {
        "Profile page"
    }

    fn expected_elements(&self) -> Vec<(Locator, &'static str)> {
        vec![
            (self.username_field(), "Username field"),
            (self.name_field(), "Name field"),
            (self.save_changes_button(), "Save changes button"),
            (self.new_category_field(), "New category field"),
        ]
    }

    async fn check_elements(&self) -> E2eResult<()> {
        for (locator, name) in self.expected_elements() {
            expect_visible(&locator, name).await?;
        }
        check_rows(&self.categories(), "Category").await
    }
}
