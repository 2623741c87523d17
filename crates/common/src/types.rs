//! Core types for Niffler tests
//!
//! Domain values (`User`, `Spend`, `Currency`) are what tests generate and
//! read back from the UI. `*Record` types mirror rows in the backing stores.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::config::TestParameters;
use crate::{Error, Result};

/// Date format used when typing a spend into the form
pub const SPEND_CREATE_DATE_FORMAT: &str = "%m/%d/%Y";

/// Date format the spend list displays
pub const SPEND_SHOW_DATE_FORMAT: &str = "%b %d, %Y";

/// Credentials of an application user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    pub password: String,
}

impl User {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// Supported spend currencies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Rub,
    Kzt,
    Eur,
    Usd,
}

/// Currency code -> display glyph
const CURRENCY_TABLE: [(Currency, &str, &str); 4] = [
    (Currency::Rub, "RUB", "₽"),
    (Currency::Kzt, "KZT", "₸"),
    (Currency::Eur, "EUR", "€"),
    (Currency::Usd, "USD", "$"),
];

impl Currency {
    pub const ALL: [Currency; 4] = [Currency::Rub, Currency::Kzt, Currency::Eur, Currency::Usd];

    fn entry(self) -> (Currency, &'static str, &'static str) {
        CURRENCY_TABLE[self as usize]
    }

    /// Code used in the currency select and in the stores
    pub fn code(self) -> &'static str {
        self.entry().1
    }

    /// Sign shown next to amounts in the spend list
    pub fn sign(self) -> &'static str {
        self.entry().2
    }

    pub fn from_code(code: &str) -> Option<Currency> {
        CURRENCY_TABLE
            .iter()
            .find(|(_, c, _)| *c == code)
            .map(|(currency, _, _)| *currency)
    }

    pub fn from_sign(sign: &str) -> Option<Currency> {
        CURRENCY_TABLE
            .iter()
            .find(|(_, _, s)| *s == sign)
            .map(|(currency, _, _)| *currency)
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A spend as entered in the form or read back from the spend list.
///
/// `date` is kept as displayed text: creation format for generated spends,
/// display format for read-back values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Spend {
    pub amount: Decimal,
    pub currency: Currency,
    pub category: String,
    pub date: String,
    pub description: String,
}

impl Spend {
    /// Copy of this spend with `date` converted from the creation format to
    /// the display format configured in `params`
    pub fn with_display_date(&self, params: &TestParameters) -> Result<Spend> {
        Ok(Spend {
            date: reformat_date(&self.date, params.create_date_format, params.show_date_format)?,
            ..self.clone()
        })
    }
}

/// Re-render a date string from one strftime format into another
pub fn reformat_date(value: &str, from: &str, to: &str) -> Result<String> {
    let date = NaiveDate::parse_from_str(value, from)
        .map_err(|e| Error::Parse(format!("date {value:?} does not match {from:?}: {e}")))?;
    Ok(date.format(to).to_string())
}

/// Friendship status as stored in the userdata database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FriendshipStatus {
    Pending,
    Accepted,
    Other(String),
}

impl FriendshipStatus {
    pub fn as_str(&self) -> &str {
        match self {
            FriendshipStatus::Pending => "PENDING",
            FriendshipStatus::Accepted => "ACCEPTED",
            FriendshipStatus::Other(s) => s,
        }
    }
}

impl From<String> for FriendshipStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "PENDING" => FriendshipStatus::Pending,
            "ACCEPTED" => FriendshipStatus::Accepted,
            _ => FriendshipStatus::Other(value),
        }
    }
}

/// Row of the userdata `user` table
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRecord {
    pub id: Uuid,
    pub username: String,
    pub currency: String,
    pub firstname: Option<String>,
    pub surname: Option<String>,
    pub full_name: Option<String>,
}

/// Row of the auth `user` table
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AuthUserRecord {
    pub id: Uuid,
    pub username: String,
    pub enabled: bool,
}

/// Row of the `spend` table
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SpendRecord {
    pub id: Uuid,
    pub username: String,
    pub spend_date: NaiveDate,
    pub currency: String,
    pub amount: f64,
    pub description: Option<String>,
    pub category_id: Uuid,
}

/// Row of the `category` table
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CategoryRecord {
    pub id: Uuid,
    pub name: String,
    pub username: String,
    pub archived: bool,
}

/// Row of the `friendship` table
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FriendshipRecord {
    pub requester_id: Uuid,
    pub addressee_id: Uuid,
    #[sqlx(try_from = "String")]
    pub status: FriendshipStatus,
    pub created_date: NaiveDate,
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(Currency::Rub, "RUB", "₽")]
    #[test_case(Currency::Kzt, "KZT", "₸")]
    #[test_case(Currency::Eur, "EUR", "€")]
    #[test_case(Currency::Usd, "USD", "$")]
    fn test_currency_lookup_table(currency: Currency, code: &str, sign: &str) {
        assert_eq!(currency.code(), code);
        assert_eq!(currency.sign(), sign);
        assert_eq!(Currency::from_code(code), Some(currency));
        assert_eq!(Currency::from_sign(sign), Some(currency));
    }

    #[test]
    fn test_unknown_currency_sign() {
        assert_eq!(Currency::from_sign("¥"), None);
        assert_eq!(Currency::from_code("JPY"), None);
    }

    #[test]
    fn test_reformat_creation_date_for_display() {
        let shown = reformat_date("01/15/2023", SPEND_CREATE_DATE_FORMAT, SPEND_SHOW_DATE_FORMAT)
            .unwrap();
        assert_eq!(shown, "Jan 15, 2023");
    }

    #[test]
    fn test_reformat_rejects_wrong_format() {
        let err = reformat_date("2023-01-15", SPEND_CREATE_DATE_FORMAT, SPEND_SHOW_DATE_FORMAT)
            .unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn test_with_display_date_keeps_other_fields() {
        let spend = Spend {
            amount: Decimal::new(12345, 2),
            currency: Currency::Eur,
            category: "groceries".into(),
            date: "12/31/2025".into(),
            description: "weekly shop".into(),
        };

        let shown = spend.with_display_date(&TestParameters::default()).unwrap();
        assert_eq!(shown.date, "Dec 31, 2025");
        assert_eq!(shown.amount, spend.amount);
        assert_eq!(shown.currency, spend.currency);
        assert_eq!(shown.category, spend.category);
        assert_eq!(shown.description, spend.description);
    }

    #[test]
    fn test_friendship_status_round_trip() {
        assert_eq!(FriendshipStatus::from("ACCEPTED".to_string()), FriendshipStatus::Accepted);
        assert_eq!(FriendshipStatus::from("PENDING".to_string()).as_str(), "PENDING");
        let other = FriendshipStatus::from("INVITE_SENT".to_string());
        assert_eq!(other, FriendshipStatus::Other("INVITE_SENT".into()));
        assert_eq!(other.as_str(), "INVITE_SENT");
    }
}
