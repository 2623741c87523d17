//! Shared harness for the scenario tests.
//!
//! Scenarios need a running Niffler stack. Without NIFFLER_FRONTEND_URL,
//! NIFFLER_AUTH_URL and the userdata/spend database URLs every test here
//! returns early with a note on stderr. Run them with `--test-threads=1`
//! when NIFFLER_REGISTERED_USERNAME is set, since they then share one account.

use std::sync::Arc;

use niffler_common::Settings;
use niffler_e2e::runner::run_scenario;
use niffler_e2e::{init_tracing, scenarios, Session};

fn configured() -> Option<Settings> {
    let settings = Settings::from_env().expect("readable NIFFLER_* settings");
    if !settings.has_scenario_endpoints() {
        eprintln!("Skipping: Niffler endpoints are not configured");
        return None;
    }
    Some(settings)
}

/// Run one registered scenario in a fresh browser session
pub async fn run(name: &str) {
    init_tracing();
    let Some(settings) = configured() else {
        return;
    };
    let scenario = scenarios::find(name).expect("registered scenario");

    let session = Session::start(settings).await.expect("browser session");
    let result = run_scenario(Arc::clone(&session), &scenario).await;
    session.finish().await.expect("session teardown");

    assert!(
        result.success,
        "{} failed: {}",
        name,
        result.error.unwrap_or_default()
    );
}
