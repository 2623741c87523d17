//! Niffler E2E test framework
//!
//! Drives the Niffler web UI through Chrome and checks every side effect in
//! the backing stores through `niffler-common`'s verification services.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 niffler-e2e runner / cargo test             │
//! ├─────────────────────────────────────────────────────────────┤
//! │  TestRunner                                                 │
//! │    ├── Session (run-scoped)                                 │
//! │    │     ├── BrowserSession -> Tab per scenario             │
//! │    │     └── session user (registered once)                 │
//! │    ├── Fixtures (per scenario)                              │
//! │    │     ├── Tab, DataFactory, Cleanup                      │
//! │    │     └── teardown(): cascade-delete created users       │
//! │    └── scenarios::registry() -> [Scenario]                  │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Page objects                                               │
//! │    Login -> Registration -> Login -> Main                   │
//! │    Main -> NewSpending | EditSpending | Profile             │
//! │         -> Friends | AllPeople -> (log out) Login           │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod browser;
pub mod error;
pub mod expect;
pub mod fixtures;
pub mod health;
pub mod pages;
pub mod runner;
pub mod scenarios;

pub use browser::{BrowserOptions, BrowserSession, Locator, Tab, WaitState};
pub use error::{E2eError, E2eResult};
pub use fixtures::{Fixtures, Session};
pub use runner::{RunnerConfig, TestResult, TestRunner, TestSuiteResult};
pub use scenarios::Scenario;

use tracing_subscriber::EnvFilter;

/// Install a test-friendly subscriber; later calls are no-ops
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_test_writer()
        .try_init();
}
