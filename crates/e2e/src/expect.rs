//! Assertions over the rendered page
//!
//! Each helper waits for its condition and reports a miss as
//! `E2eError::AssertionFailed` carrying a readable expectation.

use std::fmt::Debug;

use crate::browser::{Locator, Tab, WaitState};
use crate::error::{E2eError, E2eResult};

pub async fn expect_visible(locator: &Locator, name: &str) -> E2eResult<()> {
    locator
        .wait_for(WaitState::Visible)
        .await
        .map_err(|e| e.into_assertion(format!("{} should be visible", name)))
}

pub async fn expect_hidden(locator: &Locator, name: &str) -> E2eResult<()> {
    locator
        .wait_for(WaitState::Hidden)
        .await
        .map_err(|e| e.into_assertion(format!("{} should not be visible", name)))
}

pub async fn expect_enabled(locator: &Locator, name: &str) -> E2eResult<()> {
    locator
        .wait_for(WaitState::Enabled)
        .await
        .map_err(|e| e.into_assertion(format!("{} should be enabled", name)))
}

/// The tab's URL should come to contain a match for `pattern`
pub async fn expect_url(tab: &Tab, pattern: &str) -> E2eResult<String> {
    tab.wait_for_url(pattern)
        .await
        .map_err(|e| e.into_assertion(format!("URL should match /{}/", pattern)))
}

pub async fn expect_count(locator: &Locator, expected: usize, name: &str) -> E2eResult<()> {
    match locator
        .wait_for_count(&format!("== {}", expected), |n| n == expected)
        .await
    {
        Ok(_) => Ok(()),
        Err(E2eError::Timeout(_)) => {
            let actual = locator.count().await?;
            Err(E2eError::AssertionFailed(format!(
                "{} should have {} entries, found {}",
                name, expected, actual
            )))
        }
        Err(e) => Err(e),
    }
}

/// Fail with `message` unless `condition` holds
pub fn ensure(condition: bool, message: impl Into<String>) -> E2eResult<()> {
    if condition {
        Ok(())
    } else {
        Err(E2eError::AssertionFailed(message.into()))
    }
}

pub fn ensure_eq<T>(actual: T, expected: T, what: &str) -> E2eResult<()>
where
    T: PartialEq + Debug,
{
    ensure(
        actual == expected,
        format!("{}: expected {:?}, got {:?}", what, expected, actual),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure() {
        assert!(ensure(true, "unused").is_ok());
        match ensure(false, "spend list should be empty") {
            Err(E2eError::AssertionFailed(msg)) => assert_eq!(msg, "spend list should be empty"),
            other => panic!("expected assertion failure, got {:?}", other),
        }
    }

    #[test]
    fn test_ensure_eq_names_both_sides() {
        assert!(ensure_eq(1, 1, "spend count").is_ok());
        let err = ensure_eq("EUR", "USD", "currency").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Assertion failed: currency: expected \"USD\", got \"EUR\""
        );
    }

    #[test]
    fn test_timeouts_become_assertions() {
        let err = E2eError::Timeout("#delete to be enabled".into())
            .into_assertion("Delete button should be enabled");
        assert!(matches!(err, E2eError::AssertionFailed(ref m) if m == "Delete button should be enabled"));

        let err = E2eError::UnknownScenario("x".into()).into_assertion("ignored");
        assert!(matches!(err, E2eError::UnknownScenario(_)));
    }
}
