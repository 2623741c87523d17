//! Session lifecycle without a Niffler stack.
//!
//! Needs a local Chrome; skipped when the browser cannot be launched.

use std::sync::Arc;
use std::time::Duration;

use niffler_common::Settings;
use niffler_e2e::{init_tracing, Fixtures, Session};

// Nothing listens on the discard port, so sign-up and cleanup both fail
fn unreachable_settings() -> Settings {
    Settings {
        auth_url: Some("http://127.0.0.1:9/".into()),
        userdata_db_url: Some("postgres://postgres@127.0.0.1:9/niffler-userdata".into()),
        spend_db_url: Some("postgres://postgres@127.0.0.1:9/niffler-spend".into()),
        timeout: Duration::from_secs(1),
        seed: Some(7),
        ..Settings::default()
    }
}

#[tokio::test]
async fn failed_session_sign_up_is_kept_for_cleanup() {
    init_tracing();
    let session = match Session::start(unreachable_settings()).await {
        Ok(session) => session,
        Err(e) => {
            eprintln!("Skipping: {}", e);
            return;
        }
    };

    let mut fixtures = Fixtures::new(Arc::clone(&session), "session_user")
        .await
        .unwrap();
    assert!(fixtures.session_user().await.is_err());

    let attempted = session.attempted_users();
    assert_eq!(attempted.len(), 1);
    assert_eq!(attempted[0].len(), 10);

    fixtures.teardown().await.unwrap();

    // Cleanup of the half-registered user is attempted against the store
    assert!(session.finish().await.is_err());
}
