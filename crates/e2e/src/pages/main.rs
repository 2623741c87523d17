use std::str::FromStr;

use async_trait::async_trait;
use niffler_common::{Currency, Error, Spend};
use rust_decimal::Decimal;
use tracing::{debug, info};

use super::{
    check_rows, urls, AllPeoplePage, EditSpendingPage, FriendsPage, Header, LoginPage,
    NewSpendingPage, Page, ProfilePage,
};
use crate::browser::{Locator, Tab};
use crate::error::{E2eError, E2eResult};
use crate::expect::{expect_enabled, expect_hidden, expect_visible};

const SPEND_ROWS: &str = r#"table tbody tr[role="checkbox"]"#;

// Spend table columns: checkbox, category, amount, description, date, actions
const CATEGORY_COLUMN: usize = 1;
const AMOUNT_COLUMN: usize = 2;
const DESCRIPTION_COLUMN: usize = 3;
const DATE_COLUMN: usize = 4;

/// Spend history screen
pub struct MainPage {
    tab: Tab,
    header: Header,
}

impl MainPage {
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

    pub fn new_spending_button(&self) -> Locator {
        self.tab.locator(r#"a[href="/spending"]"#)
    }

    pub fn search_field(&self) -> Locator {
        self.tab.locator(super::SEARCH_FIELD)
    }

    /// Enabled only while at least one spend is selected
    pub fn delete_button(&self) -> Locator {
        self.tab.locator("#delete")
    }

    pub fn delete_dialog(&self) -> Locator {
        self.tab.locator(super::CONFIRM_DIALOG)
    }

    pub fn delete_confirm_button(&self) -> Locator {
        self.delete_dialog().locator("button").has_text("Delete")
    }

    /// Rows of the spend table; re-queried on every use
    pub fn spend_rows(&self) -> Locator {
        self.tab.locator(SPEND_ROWS)
    }

    pub async fn spend_count(&self) -> E2eResult<usize> {
        self.spend_rows().count().await
    }

    async fn spend_cells(&self, index: usize) -> E2eResult<Vec<Locator>> {
        let count = self.spend_count().await?;
        if index >= count {
            return Err(E2eError::AssertionFailed(format!(
                "Invalid spend index {} for a list of {}",
                index, count
            )));
        }
        self.spend_rows().nth(index).locator("td").all().await
    }

    /// Read back the spend shown in row `index`
    pub async fn get_spend(&self, index: usize) -> E2eResult<Spend> {
        let cells = self.spend_cells(index).await?;
        if cells.len() <= DATE_COLUMN {
            return Err(E2eError::AssertionFailed(format!(
                "Spend row {} has {} cells",
                index,
                cells.len()
            )));
        }

        let text = |column: usize| cells[column].locator("span").first();
        let category = text(CATEGORY_COLUMN).text_content().await?;
        let amount = text(AMOUNT_COLUMN).text_content().await?;
        let description = text(DESCRIPTION_COLUMN).text_content().await?;
        let date = text(DATE_COLUMN).text_content().await?;

        let spend = spend_from_cells(&category, &amount, &description, &date)?;
        debug!("Spend row {}: {:?}", index, spend);
        Ok(spend)
    }

    /// Wait for a row mentioning `description`
    pub async fn wait_for_spend(&self, description: &str) -> E2eResult<()> {
        let row = self.spend_rows().has_text(description);
        expect_visible(&row, &format!("Spend {:?}", description)).await
    }

    pub async fn select_spend(&self, index: usize) -> E2eResult<()> {
        let cells = self.spend_cells(index).await?;
        cells[0].locator(r#"input[type="checkbox"]"#).click().await
    }

    /// Delete whatever is selected and wait for the list to shrink
    pub async fn delete_selected_spends(&self) -> E2eResult<()> {
        let before = self.spend_count().await?;

        let delete = self.delete_button();
        expect_enabled(&delete, "Delete button").await?;
        delete.click().await?;

        let dialog = self.delete_dialog();
        expect_visible(&dialog, "Delete confirmation dialog").await?;
        let confirm = self.delete_confirm_button();
        expect_visible(&confirm, "Delete confirmation button").await?;
        confirm.click().await?;
        expect_hidden(&dialog, "Delete confirmation dialog").await?;

        let after = self
            .spend_rows()
            .wait_for_count(&format!("below {}", before), |n| n < before)
            .await
            .map_err(|e| e.into_assertion(format!("Spend list should shrink from {}", before)))?;
        info!("Deleted {} spend(s)", removed_rows(before, after));
        Ok(())
    }

    pub async fn delete_spend(&self, index: usize) -> E2eResult<()> {
        self.select_spend(index).await?;
        self.delete_selected_spends().await
    }

    pub async fn edit_spend(&self, index: usize) -> E2eResult<EditSpendingPage> {
        let cells = self.spend_cells(index).await?;
        let actions = cells
            .last()
            .ok_or_else(|| E2eError::ElementNotFound(format!("{} >> nth={} >> td", SPEND_ROWS, index)))?;
        actions
            .locator(r#"button[aria-label="Edit spending"]"#)
            .click()
            .await?;
        self.tab.wait_for_url(urls::SPENDING).await?;
        EditSpendingPage::new(self.tab.clone()).await
    }

    pub async fn go_to_new_spending_page(&self) -> E2eResult<NewSpendingPage> {
        self.new_spending_button().click().await?;
        self.tab.wait_for_url(urls::SPENDING).await?;
        NewSpendingPage::new(self.tab.clone()).await
    }

    pub async fn go_to_profile_page(&self) -> E2eResult<ProfilePage> {
        self.header.go_to_profile_page().await
    }

    pub async fn go_to_friends_page(&self) -> E2eResult<FriendsPage> {
        self.header.go_to_friends_page().await
    }

    pub async fn go_to_all_people_page(&self) -> E2eResult<AllPeoplePage> {
        self.header.go_to_all_people_page().await
    }

    pub async fn search_spends(&self, query: &str) -> E2eResult<()> {
        let search = self.search_field();
        search.fill(query).await?;
        search.press("Enter").await
    }

    pub async fn log_out(self) -> E2eResult<LoginPage> {
        self.header.log_out().await
    }
}

#[async_trait]
impl Page for MainPage {
    fn tab(&self) -> &Tab {
        &self.tab
    }

    fn name(&self) -> &'static str {
        "Main page"
    }

    fn expected_elements(&self) -> Vec<(Locator, &'static str)> {
        vec![
            (self.new_spending_button(), "New spending button"),
            (self.header.menu_button(), "Menu button"),
            (self.search_field(), "Search field"),
            (self.delete_button(), "Delete button"),
        ]
    }

    async fn check_elements(&self) -> E2eResult<()> {
        for (locator, name) in self.expected_elements() {
            expect_visible(&locator, name).await?;
        }
        check_rows(&self.spend_rows(), "Spend").await
    }
}

// Rows can re-render between the wait and the recount
fn removed_rows(before: usize, after: usize) -> usize {
    before.saturating_sub(after)
}

/// Build a `Spend` from the text of one spend row.
///
/// The amount cell reads "<amount> <currency sign>"; the date is kept in
/// display format.
pub fn spend_from_cells(
    category: &str,
    amount_cell: &str,
    description: &str,
    date: &str,
) -> E2eResult<Spend> {
    let mut parts = amount_cell.split_whitespace();
    let (amount, sign) = match (parts.next(), parts.next(), parts.next()) {
        (Some(amount), Some(sign), None) => (amount, sign),
        _ => {
            return Err(Error::Parse(format!(
                "amount cell {:?} is not \"<amount> <sign>\"",
                amount_cell
            ))
            .into())
        }
    };

    let amount = Decimal::from_str(amount)
        .map_err(|e| Error::Parse(format!("amount {:?}: {}", amount, e)))?;
    let currency = Currency::from_sign(sign)
        .ok_or_else(|| Error::Parse(format!("unknown currency sign {:?}", sign)))?;

    Ok(Spend {
        amount,
        currency,
        category: category.trim().to_string(),
        date: date.trim().to_string(),
        description: description.trim().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(3, 2, 1 ; "one deleted")]
    #[test_case(2, 0, 2 ; "all deleted")]
    #[test_case(1, 2, 0 ; "row added after the wait")]
    fn test_removed_rows(before: usize, after: usize, removed: usize) {
        assert_eq!(removed_rows(before, after), removed);
    }

    #[test_case("123.45 ₽", Decimal::new(12345, 2), Currency::Rub)]
    #[test_case("7 $", Decimal::from(7), Currency::Usd)]
    #[test_case(" 0.5  € ", Decimal::new(5, 1), Currency::Eur)]
    #[test_case("299.99 ₸", Decimal::new(29999, 2), Currency::Kzt)]
    fn test_amount_cell(cell: &str, amount: Decimal, currency: Currency) {
        let spend = spend_from_cells("food", cell, "lunch", "Jan 15, 2023").unwrap();
        assert_eq!(spend.amount, amount);
        assert_eq!(spend.currency, currency);
    }

    #[test]
    fn test_text_cells_are_trimmed() {
        let spend = spend_from_cells(" groceries\n", "12.5 ₽", "  weekly ", " Dec 31, 2025 ").unwrap();
        assert_eq!(spend.category, "groceries");
        assert_eq!(spend.description, "weekly");
        assert_eq!(spend.date, "Dec 31, 2025");
        // 12.5 and 12.50 are the same amount
        assert_eq!(spend.amount, Decimal::new(1250, 2));
    }

    #[test_case("12.50" ; "missing sign")]
    #[test_case("12.50 ¥" ; "unknown sign")]
    #[test_case("twelve ₽" ; "not a number")]
    #[test_case("12 50 ₽" ; "extra token")]
    fn test_malformed_amount_cell(cell: &str) {
        let err = spend_from_cells("food", cell, "lunch", "Jan 15, 2023").unwrap_err();
        assert!(matches!(err, E2eError::Common(Error::Parse(_))), "{:?}", err);
    }
}
