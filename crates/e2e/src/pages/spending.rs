use niffler_common::{Error, Spend};
use tracing::info;
use uuid::Uuid;

use super::{urls, MainPage, Page};
use crate::browser::{Locator, Tab};
use crate::error::E2eResult;

/// Fields and buttons shared by the new and edit spending forms
struct SpendForm {
    tab: Tab,
}

impl SpendForm {
    fn amount_field(&self) -> Locator {
        self.tab.locator("#amount")
    }

    fn currency_field(&self) -> Locator {
        self.tab.locator("#currency")
    }

    fn category_field(&self) -> Locator {
        self.tab.locator("#category")
    }

    fn date_field(&self) -> Locator {
        self.tab.locator(r#"input[name="date"]"#)
    }

    fn description_field(&self) -> Locator {
        self.tab.locator("#description")
    }

    fn cancel_button(&self) -> Locator {
        self.tab.locator("#cancel")
    }

    fn save_button(&self) -> Locator {
        self.tab.locator("#save")
    }

    fn amount_helper(&self) -> Locator {
        self.tab.locator("#amount + .input__helper-text")
    }

    fn category_helper(&self) -> Locator {
        self.tab.locator("#category + .input__helper-text")
    }

    fn expected_elements(&self, save_name: &'static str) -> Vec<(Locator, &'static str)> {
        vec![
            (self.amount_field(), "Amount field"),
            (self.currency_field(), "Currency field"),
            (self.category_field(), "Category field"),
            (self.date_field(), "Date field"),
            (self.description_field(), "Description field"),
            (self.cancel_button(), "Cancel button"),
            (self.save_button(), save_name),
        ]
    }

    /// Fill every field and press save
    async fn submit(&self, spend: &Spend) -> E2eResult<()> {
        self.amount_field().fill(&spend.amount.to_string()).await?;

        self.currency_field().click().await?;
        self.tab
            .locator(r#"ul[role="listbox"]"#)
            .locator(&format!(r#"li[data-value="{}"]"#, spend.currency.code()))
            .click()
            .await?;

        self.category_field().fill(&spend.category).await?;

        let date = self.date_field();
        date.select_text().await?;
        date.type_text(&spend.date).await?;

        self.description_field().fill(&spend.description).await?;
        self.save_button().click().await
    }

    /// Submit, then wait for the list to show the saved spend
    async fn save(&self, spend: &Spend) -> E2eResult<MainPage> {
        self.submit(spend).await?;
        self.tab.wait_for_url(urls::MAIN).await?;
        let main = MainPage::new(self.tab.clone()).await?;
        main.wait_for_spend(&spend.description).await?;
        Ok(main)
    }

    async fn cancel(&self) -> E2eResult<MainPage> {
        self.cancel_button().click().await?;
        self.tab.wait_for_url(urls::MAIN).await?;
        MainPage::new(self.tab.clone()).await
    }
}

/// Form for adding a spend
pub struct NewSpendingPage {
    form: SpendForm,
}

impl NewSpendingPage {
    pub(crate) async fn new(tab: Tab) -> E2eResult<Self> {
        let page = Self {
            form: SpendForm { tab },
        };
        page.check_elements().await?;
        Ok(page)
    }

    /// Helper text under the amount field, shown on validation failure
    pub fn amount_helper(&self) -> Locator {
        self.form.amount_helper()
    }

    pub fn category_helper(&self) -> Locator {
        self.form.category_helper()
    }

    /// Fill and submit without waiting for the outcome
    pub async fn arrange_add_spend(&self, spend: &Spend) -> E2eResult<()> {
        self.form.submit(spend).await
    }

    pub async fn add_spend(self, spend: &Spend) -> E2eResult<MainPage> {
        let main = self.form.save(spend).await?;
        info!("Added spend {:?}", spend.description);
        Ok(main)
    }

    pub async fn cancel(self) -> E2eResult<MainPage> {
        self.form.cancel().await
    }
}

impl Page for NewSpendingPage {
    fn tab(&self) -> &Tab {
        &self.form.tab
    }

    fn name(&self) -> &'static str {
        "New spending page"
    }

    fn expected_elements(&self) -> Vec<(Locator, &'static str)> {
        self.form.expected_elements("Add button")
    }
}

/// Form for editing an existing spend
pub struct EditSpendingPage {
    form: SpendForm,
    spend_id: Uuid,
}

impl EditSpendingPage {
    pub(crate) async fn new(tab: Tab) -> E2eResult<Self> {
        let spend_id = spend_id_from_url(&tab.url().await?)?;
        let page = Self {
            form: SpendForm { tab },
            spend_id,
        };
        page.check_elements().await?;
        Ok(page)
    }

    /// Id of the spend being edited, from the page URL
    pub fn spend_id(&self) -> Uuid {
        self.spend_id
    }

    pub fn amount_helper(&self) -> Locator {
        self.form.amount_helper()
    }

    pub fn category_helper(&self) -> Locator {
        self.form.category_helper()
    }

    pub async fn arrange_edit_spend(&self, spend: &Spend) -> E2eResult<()> {
        self.form.submit(spend).await
    }

    pub async fn edit_spend(self, spend: &Spend) -> E2eResult<MainPage> {
        let main = self.form.save(spend).await?;
        info!("Edited spend {}", self.spend_id);
        Ok(main)
    }

    pub async fn cancel(self) -> E2eResult<MainPage> {
        self.form.cancel().await
    }
}

impl Page for EditSpendingPage {
    fn tab(&self) -> &Tab {
        &self.form.tab
    }

    fn name(&self) -> &'static str {
        "Edit spending page"
    }

    fn expected_elements(&self) -> Vec<(Locator, &'static str)> {
        self.form.expected_elements("Save changes button")
    }
}

/// Spend id from the last path segment of an edit URL
pub fn spend_id_from_url(url: &str) -> E2eResult<Uuid> {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    let segment = path.trim_end_matches('/').rsplit('/').next().unwrap_or_default();
    let id = Uuid::parse_str(segment)
        .map_err(|e| Error::Parse(format!("no spend id in URL {:?}: {}", url, e)))?;
    Ok(id)
}
