//! Error types for E2E testing

use thiserror::Error;

#[derive(Error, Debug)]
pub enum E2eError {
    #[error("Browser failed to launch: {0}")]
    BrowserLaunch(String),

    #[error("Browser error: {0}")]
    Browser(#[from] chromiumoxide::error::CdpError),

    #[error("Failed to open tab: {0}")]
    TabOpen(String),

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Timeout waiting for: {0}")]
    Timeout(String),

    #[error("Assertion failed: {0}")]
    AssertionFailed(String),

    #[error("Frontend not reachable after {0} attempts")]
    FrontendUnavailable(usize),

    #[error("Unknown scenario: {0}")]
    UnknownScenario(String),

    #[error(transparent)]
    Common(#[from] niffler_common::Error),

    #[error("Invalid URL pattern: {0}")]
    Regex(#[from] regex::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl E2eError {
    /// Turn a missed wait into a failed expectation with a readable message
    pub fn into_assertion(self, expectation: impl Into<String>) -> E2eError {
        match self {
            E2eError::Timeout(_) | E2eError::ElementNotFound(_) => {
                E2eError::AssertionFailed(expectation.into())
            }
            other => other,
        }
    }
}

pub type E2eResult<T> = Result<T, E2eError>;
