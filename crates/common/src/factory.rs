//! Random test data
//!
//! Generation goes through one seeded `StdRng`. The seed is logged so a
//! failing run can be replayed with `NIFFLER_SEED`.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use tracing::info;

use crate::config::TestParameters;
use crate::types::{Currency, Spend, User};

pub const DEFAULT_USERNAME_LENGTH: usize = 10;
pub const DEFAULT_PASSWORD_LENGTH: usize = 10;

/// Produces randomized but valid domain values within configured bounds
pub struct DataFactory {
    rng: StdRng,
    seed: u64,
    params: TestParameters,
}

impl DataFactory {
    /// Create a factory; draws a fresh seed when none is given
    pub fn new(seed: Option<u64>, params: TestParameters) -> Self {
        let seed = seed.unwrap_or_else(|| rand::thread_rng().gen());
        info!("Data factory seed: {}", seed);
        Self {
            rng: StdRng::seed_from_u64(seed),
            seed,
            params,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn params(&self) -> &TestParameters {
        &self.params
    }

    /// String of `len` random lowercase ASCII letters
    pub fn lowercase_string(&mut self, len: usize) -> String {
        (0..len)
            .map(|_| char::from(self.rng.gen_range(b'a'..=b'z')))
            .collect()
    }

    pub fn make_user(&mut self, username_length: usize, password_length: usize) -> User {
        User {
            username: self.lowercase_string(username_length),
            password: self.lowercase_string(password_length),
        }
    }

    pub fn make_default_user(&mut self) -> User {
        self.make_user(DEFAULT_USERNAME_LENGTH, DEFAULT_PASSWORD_LENGTH)
    }

    /// Date-time drawn uniformly (second resolution) between the configured bounds
    pub fn random_date(&mut self) -> NaiveDateTime {
        let min = self.params.min_date.and_time(NaiveTime::default());
        let max = self.params.max_date.and_time(NaiveTime::default());
        let span = (max - min).num_seconds().max(0);
        min + Duration::seconds(self.rng.gen_range(0..=span))
    }

    pub fn make_spend(&mut self) -> Spend {
        let cents = self
            .rng
            .gen_range(self.params.min_amount * 100..=self.params.max_amount * 100);
        let currency = *Currency::ALL
            .choose(&mut self.rng)
            .unwrap_or(&Currency::Rub);
        let category = self.lowercase_string(self.params.category_name_length);
        let date = self
            .random_date()
            .format(self.params.create_date_format)
            .to_string();
        let description = self.lowercase_string(self.params.description_length);

        Spend {
            amount: Decimal::new(cents, 2),
            currency,
            category,
            date,
            description,
        }
    }
}

/// Parse a creation-format date produced by `make_spend`
pub fn parse_created_date(value: &str, params: &TestParameters) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, params.create_date_format).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    const SAMPLES: usize = 500;

    fn factory() -> DataFactory {
        DataFactory::new(None, TestParameters::default())
    }

    #[test_case(10, 10)]
    #[test_case(1, 32)]
    #[test_case(0, 3)]
    fn test_user_has_requested_lowercase_lengths(username_len: usize, password_len: usize) {
        let mut factory = factory();
        for _ in 0..SAMPLES {
            let user = factory.make_user(username_len, password_len);
            assert_eq!(user.username.len(), username_len);
            assert_eq!(user.password.len(), password_len);
            assert!(user.username.chars().all(|c| c.is_ascii_lowercase()));
            assert!(user.password.chars().all(|c| c.is_ascii_lowercase()));
        }
    }

    #[test]
    fn test_spend_respects_bounds() {
        let mut factory = factory();
        let params = TestParameters::default();
        let min = Decimal::from(params.min_amount);
        let max = Decimal::from(params.max_amount);

        for _ in 0..SAMPLES {
            let spend = factory.make_spend();

            assert!(spend.amount >= min && spend.amount <= max, "{}", spend.amount);
            assert_eq!(spend.amount, spend.amount.round_dp(2));
            assert!(Currency::ALL.contains(&spend.currency));
            assert_eq!(spend.category.len(), params.category_name_length);
            assert_eq!(spend.description.len(), params.description_length);

            let date = parse_created_date(&spend.date, &params).expect("creation format");
            assert!(date >= params.min_date && date <= params.max_date, "{}", spend.date);
        }
    }

    #[test]
    fn test_same_seed_replays_same_data() {
        let mut first = DataFactory::new(Some(7), TestParameters::default());
        let mut second = DataFactory::new(Some(7), TestParameters::default());

        assert_eq!(first.seed(), 7);
        assert_eq!(first.make_default_user(), second.make_default_user());
        assert_eq!(first.make_spend(), second.make_spend());
    }

    #[test]
    fn test_custom_date_formats_survive_display_conversion() {
        let params = TestParameters {
            create_date_format: "%Y-%m-%d",
            show_date_format: "%d.%m.%Y",
            ..TestParameters::default()
        };
        let mut factory = DataFactory::new(Some(3), params.clone());

        let spend = factory.make_spend();
        let date = parse_created_date(&spend.date, &params).expect("creation format");
        let shown = spend.with_display_date(&params).unwrap();
        assert_eq!(shown.date, date.format("%d.%m.%Y").to_string());
    }

    #[test]
    fn test_collapsed_date_range() {
        let mut params = TestParameters::default();
        params.max_date = params.min_date;
        let mut factory = DataFactory::new(Some(1), params.clone());

        let date = factory.random_date();
        assert_eq!(date.date(), params.min_date);
    }
}
