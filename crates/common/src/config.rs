//! Test-run configuration
//!
//! `Settings` is read once at process start and handed to every component
//! that needs an endpoint. Missing values are kept as `None` and only become
//! an error when the component that needs them is constructed.

use chrono::NaiveDate;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, warn};

use crate::types::{User, SPEND_CREATE_DATE_FORMAT, SPEND_SHOW_DATE_FORMAT};
use crate::{Error, Result};

pub const FRONTEND_URL_VAR: &str = "NIFFLER_FRONTEND_URL";
pub const AUTH_URL_VAR: &str = "NIFFLER_AUTH_URL";
pub const REGISTRATION_URL_VAR: &str = "NIFFLER_REGISTRATION_URL";
pub const AUTH_DB_URL_VAR: &str = "NIFFLER_AUTH_DB_URL";
pub const USERDATA_DB_URL_VAR: &str = "NIFFLER_USERDATA_DB_URL";
pub const SPEND_DB_URL_VAR: &str = "NIFFLER_SPEND_DB_URL";
pub const CURRENCY_DB_URL_VAR: &str = "NIFFLER_CURRENCY_DB_URL";
pub const REGISTERED_USERNAME_VAR: &str = "NIFFLER_REGISTERED_USERNAME";
pub const REGISTERED_PASSWORD_VAR: &str = "NIFFLER_REGISTERED_PASSWORD";
pub const TIMEOUT_MS_VAR: &str = "NIFFLER_TIMEOUT_MS";
pub const HEADLESS_VAR: &str = "NIFFLER_HEADLESS";
pub const CHROME_PATH_VAR: &str = "NIFFLER_CHROME_PATH";
pub const SEED_VAR: &str = "NIFFLER_SEED";

/// Default bound for every awaited UI condition
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Backing stores reachable through direct queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Store {
    Auth,
    Userdata,
    Spend,
    Currency,
}

impl Store {
    pub fn env_var(self) -> &'static str {
        match self {
            Store::Auth => AUTH_DB_URL_VAR,
            Store::Userdata => USERDATA_DB_URL_VAR,
            Store::Spend => SPEND_DB_URL_VAR,
            Store::Currency => CURRENCY_DB_URL_VAR,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Store::Auth => "niffler-auth",
            Store::Userdata => "niffler-userdata",
            Store::Spend => "niffler-spend",
            Store::Currency => "niffler-currency",
        }
    }
}

/// Environment-derived endpoints and run options
#[derive(Debug, Clone)]
pub struct Settings {
    /// Frontend (main screen) URL
    pub frontend_url: Option<String>,

    /// Auth server URL hosting the login form
    pub auth_url: Option<String>,

    /// Registration form URL (defaults to `{auth_url}/register`)
    pub registration_url: Option<String>,

    pub auth_db_url: Option<String>,
    pub userdata_db_url: Option<String>,
    pub spend_db_url: Option<String>,
    pub currency_db_url: Option<String>,

    /// Pre-registered account shared by spend tests (opt-in)
    pub registered_user: Option<User>,

    /// Bound for UI waits
    pub timeout: Duration,

    /// Run Chrome without a window
    pub headless: bool,

    /// Explicit Chrome binary; auto-detected when unset
    pub chrome_executable: Option<PathBuf>,

    /// Seed for the data factory; random when unset
    pub seed: Option<u64>,

    /// Static generation parameters
    pub params: TestParameters,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            frontend_url: None,
            auth_url: None,
            registration_url: None,
            auth_db_url: None,
            userdata_db_url: None,
            spend_db_url: None,
            currency_db_url: None,
            registered_user: None,
            timeout: DEFAULT_TIMEOUT,
            headless: true,
            chrome_executable: None,
            seed: None,
            params: TestParameters::default(),
        }
    }
}

impl Settings {
    /// Load settings from the process environment, reading `.env` first if present
    pub fn from_env() -> Result<Self> {
        match dotenvy::dotenv() {
            Ok(path) => debug!("Loaded environment from {}", path.display()),
            Err(e) if e.not_found() => {}
            Err(e) => warn!("Ignoring unreadable .env file: {}", e),
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let url = |key: &str| get(key).map(|v| v.trim_end_matches('/').to_string());

        let registered_user = match get(REGISTERED_USERNAME_VAR) {
            Some(username) => {
                let password = get(REGISTERED_PASSWORD_VAR).ok_or(Error::MissingConfig {
                    var: REGISTERED_PASSWORD_VAR,
                })?;
                Some(User::new(username, password))
            }
            None => None,
        };

        let timeout = match get(TIMEOUT_MS_VAR) {
            Some(raw) => Duration::from_millis(parse_number(TIMEOUT_MS_VAR, &raw)?),
            None => DEFAULT_TIMEOUT,
        };

        let headless = match get(HEADLESS_VAR) {
            Some(raw) => parse_bool(HEADLESS_VAR, &raw)?,
            None => true,
        };

        let seed = match get(SEED_VAR) {
            Some(raw) => Some(parse_number(SEED_VAR, &raw)?),
            None => None,
        };

        Ok(Self {
            frontend_url: url(FRONTEND_URL_VAR),
            auth_url: url(AUTH_URL_VAR),
            registration_url: url(REGISTRATION_URL_VAR),
            auth_db_url: get(AUTH_DB_URL_VAR),
            userdata_db_url: get(USERDATA_DB_URL_VAR),
            spend_db_url: get(SPEND_DB_URL_VAR),
            currency_db_url: get(CURRENCY_DB_URL_VAR),
            registered_user,
            timeout,
            headless,
            chrome_executable: get(CHROME_PATH_VAR).map(PathBuf::from),
            seed,
            params: TestParameters::default(),
        })
    }

    pub fn frontend_url(&self) -> Result<&str> {
        require(&self.frontend_url, FRONTEND_URL_VAR)
    }

    pub fn auth_url(&self) -> Result<&str> {
        require(&self.auth_url, AUTH_URL_VAR)
    }

    pub fn registration_url(&self) -> Result<String> {
        match &self.registration_url {
            Some(url) => Ok(url.clone()),
            None => Ok(format!("{}/register", self.auth_url()?)),
        }
    }

    /// Connection string for a store; fails when the variable is unset
    pub fn database_url(&self, store: Store) -> Result<&str> {
        let value = match store {
            Store::Auth => &self.auth_db_url,
            Store::Userdata => &self.userdata_db_url,
            Store::Spend => &self.spend_db_url,
            Store::Currency => &self.currency_db_url,
        };
        require(value, store.env_var())
    }

    /// True when both UI endpoints and the stores scenarios check are set
    pub fn has_scenario_endpoints(&self) -> bool {
        self.frontend_url.is_some()
            && self.auth_url.is_some()
            && self.userdata_db_url.is_some()
            && self.spend_db_url.is_some()
    }
}

fn require<'a>(value: &'a Option<String>, var: &'static str) -> Result<&'a str> {
    value.as_deref().ok_or(Error::MissingConfig { var })
}

fn parse_number(var: &str, raw: &str) -> Result<u64> {
    raw.parse()
        .map_err(|_| Error::InvalidConfig(format!("{var} must be a non-negative integer, got {raw:?}")))
}

fn parse_bool(var: &str, raw: &str) -> Result<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(Error::InvalidConfig(format!("{var} must be a boolean, got {raw:?}"))),
    }
}

/// Bounds for generated test data
#[derive(Debug, Clone)]
pub struct TestParameters {
    /// Smallest generated amount, whole currency units
    pub min_amount: i64,
    /// Largest generated amount, whole currency units
    pub max_amount: i64,
    pub category_name_length: usize,
    pub description_length: usize,
    pub min_date: NaiveDate,
    pub max_date: NaiveDate,
    pub create_date_format: &'static str,
    pub show_date_format: &'static str,
}

impl Default for TestParameters {
    fn default() -> Self {
        Self {
            min_amount: 1,
            max_amount: 300,
            category_name_length: 10,
            description_length: 20,
            min_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or_default(),
            max_date: NaiveDate::from_ymd_opt(2025, 12, 31).unwrap_or_default(),
            create_date_format: SPEND_CREATE_DATE_FORMAT,
            show_date_format: SPEND_SHOW_DATE_FORMAT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings_from(pairs: &[(&str, &str)]) -> Result<Settings> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn test_empty_environment_uses_defaults() {
        let settings = settings_from(&[]).unwrap();
        assert!(settings.frontend_url.is_none());
        assert!(settings.registered_user.is_none());
        assert_eq!(settings.timeout, DEFAULT_TIMEOUT);
        assert!(settings.headless);
        assert!(!settings.has_scenario_endpoints());
    }

    #[test]
    fn test_missing_store_url_is_reported_lazily() {
        let settings = settings_from(&[(USERDATA_DB_URL_VAR, "postgres://localhost/userdata")]).unwrap();

        assert_eq!(
            settings.database_url(Store::Userdata).unwrap(),
            "postgres://localhost/userdata"
        );
        match settings.database_url(Store::Spend) {
            Err(Error::MissingConfig { var }) => assert_eq!(var, SPEND_DB_URL_VAR),
            other => panic!("expected MissingConfig, got {:?}", other),
        }
    }

    #[test]
    fn test_urls_are_trimmed() {
        let settings = settings_from(&[
            (FRONTEND_URL_VAR, " http://frontend.niffler.dc/ "),
            (AUTH_URL_VAR, "http://auth.niffler.dc:9000/"),
        ])
        .unwrap();

        assert_eq!(settings.frontend_url().unwrap(), "http://frontend.niffler.dc");
        assert_eq!(
            settings.registration_url().unwrap(),
            "http://auth.niffler.dc:9000/register"
        );
    }

    #[test]
    fn test_explicit_registration_url_wins() {
        let settings = settings_from(&[
            (AUTH_URL_VAR, "http://auth"),
            (REGISTRATION_URL_VAR, "http://auth/signup"),
        ])
        .unwrap();
        assert_eq!(settings.registration_url().unwrap(), "http://auth/signup");
    }

    #[test]
    fn test_registration_url_requires_auth_url() {
        let settings = settings_from(&[]).unwrap();
        assert!(matches!(
            settings.registration_url(),
            Err(Error::MissingConfig { var: AUTH_URL_VAR })
        ));
    }

    #[test]
    fn test_registered_user_needs_password() {
        let err = settings_from(&[(REGISTERED_USERNAME_VAR, "duck")]).unwrap_err();
        assert!(matches!(
            err,
            Error::MissingConfig {
                var: REGISTERED_PASSWORD_VAR
            }
        ));

        let settings = settings_from(&[
            (REGISTERED_USERNAME_VAR, "duck"),
            (REGISTERED_PASSWORD_VAR, "12345"),
        ])
        .unwrap();
        assert_eq!(settings.registered_user, Some(User::new("duck", "12345")));
    }

    #[test]
    fn test_run_options_are_parsed() {
        let settings = settings_from(&[
            (TIMEOUT_MS_VAR, "2500"),
            (HEADLESS_VAR, "false"),
            (SEED_VAR, "42"),
            (CHROME_PATH_VAR, "/usr/bin/chromium"),
        ])
        .unwrap();

        assert_eq!(settings.timeout, Duration::from_millis(2500));
        assert!(!settings.headless);
        assert_eq!(settings.seed, Some(42));
        assert_eq!(settings.chrome_executable, Some(PathBuf::from("/usr/bin/chromium")));
    }

    #[test]
    fn test_malformed_values_are_rejected() {
        assert!(matches!(
            settings_from(&[(TIMEOUT_MS_VAR, "soon")]),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            settings_from(&[(HEADLESS_VAR, "maybe")]),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_default_parameters_are_ordered() {
        let params = TestParameters::default();
        assert!(params.min_amount < params.max_amount);
        assert!(params.min_date < params.max_date);
    }
}
